//! Fixed clock for service tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl FixtureClock {
    /// Clock pinned to noon on 15 March 2024.
    pub(crate) fn march_2024() -> Self {
        Self {
            utc_now: Utc
                .with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
                .single()
                .expect("valid fixture timestamp"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}
