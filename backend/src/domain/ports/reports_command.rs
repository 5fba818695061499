//! Driving port for report mutations.

use async_trait::async_trait;

use crate::domain::{AdminSession, Error, Report, ReportDraft, ReportStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportsCommand: Send + Sync {
    /// File a pending report authored by the session's administrator.
    async fn create(&self, author: &AdminSession, draft: ReportDraft) -> Result<Report, Error>;

    /// Move a report to `status`.
    async fn update_status(&self, id: i64, status: ReportStatus) -> Result<Report, Error>;
}
