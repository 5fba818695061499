//! In-process fan-out of relayed row inserts.
//!
//! The gateway's database webhook posts every insert on the feed tables to
//! the service. [`ChangeHub`] decodes the row once and pushes it into the
//! update queue of every live [`Subscription`]. Publishing never blocks:
//! queues are unbounded and a closed queue is pruned on the next publish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{ChangeEvent, UserId};
use crate::domain::ports::{ChangeSink, ChangeSinkError, ChangeStream, Subscription};
use crate::outbound::gateway::decode_change_record;

type Registry = Mutex<HashMap<u64, mpsc::UnboundedSender<ChangeEvent>>>;

/// Registry of feed subscriptions.
#[derive(Debug, Default)]
pub struct ChangeHub {
    subscribers: Arc<Registry>,
    next_id: AtomicU64,
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<ChangeEvent>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChangeHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Push an already decoded event to every live subscription.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|_, sender| sender.send(event.clone()).is_ok());
        subscribers.len()
    }
}

impl ChangeStream for ChangeHub {
    fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.subscribers).insert(id, sender);
        debug!(subscription = id, "feed subscription opened");

        let registry: Weak<Registry> = Arc::downgrade(&self.subscribers);
        Subscription::new(receiver, move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).remove(&id);
                debug!(subscription = id, "feed subscription released");
            }
        })
    }
}

impl ChangeSink for ChangeHub {
    fn publish_insert(
        &self,
        table: &str,
        record: serde_json::Value,
    ) -> Result<Option<usize>, ChangeSinkError> {
        let Some(event) = decode_change_record(table, record).map_err(ChangeSinkError::decode)?
        else {
            return Ok(None);
        };
        Ok(Some(self.publish(&event)))
    }

    fn publish_account_email_change(&self, user_id: &UserId) -> usize {
        self.publish(&ChangeEvent::AccountEmailChanged(user_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    fn email_record(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "recipient_email": "admin@clinic.test",
            "subject": "Weekly summary",
            "message": "All good",
            "created_at": "2024-03-15T12:00:00Z",
            "is_read": false
        })
    }

    #[tokio::test]
    async fn inserts_reach_every_subscription() {
        let hub = ChangeHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let delivered = hub
            .publish_insert("emails_to_admin", email_record(3))
            .expect("decodes");
        assert_eq!(delivered, Some(2));

        for subscription in [&mut first, &mut second] {
            match subscription.recv().await {
                Some(ChangeEvent::Email(message)) => {
                    assert_eq!(message.id, 3);
                    assert_eq!(
                        message.created_at,
                        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
                            .single()
                            .expect("valid")
                    );
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[rstest]
    fn releasing_unregisters_exactly_one() {
        let hub = ChangeHub::new();
        let kept = hub.subscribe();
        let released = hub.subscribe();
        assert_eq!(hub.active_subscriptions(), 2);

        released.release();
        assert_eq!(hub.active_subscriptions(), 1);
        drop(kept);
        assert_eq!(hub.active_subscriptions(), 0);
    }

    #[rstest]
    fn other_tables_are_acknowledged_without_fan_out() {
        let hub = ChangeHub::new();
        let _subscription = hub.subscribe();
        assert_eq!(hub.publish_insert("meals", json!({ "id": 1 })), Ok(None));
    }

    #[rstest]
    fn malformed_rows_are_decode_errors() {
        let hub = ChangeHub::new();
        let error = hub
            .publish_insert("notifications_report", json!({ "id": 1 }))
            .expect_err("missing created_at");
        assert!(matches!(error, ChangeSinkError::Decode { .. }));
    }

    #[tokio::test]
    async fn account_email_changes_reach_every_subscription() {
        let hub = ChangeHub::new();
        let mut subscription = hub.subscribe();
        let user_id = UserId::new("7").expect("user id");

        assert_eq!(hub.publish_account_email_change(&user_id), 1);
        assert_eq!(
            subscription.recv().await,
            Some(ChangeEvent::AccountEmailChanged(user_id))
        );
    }

    #[rstest]
    fn subscriptions_outliving_the_hub_release_quietly() {
        let hub = ChangeHub::new();
        let subscription = hub.subscribe();
        drop(hub);
        subscription.release();
    }
}
