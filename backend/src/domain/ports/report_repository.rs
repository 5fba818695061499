//! Port for the `reports` table.
use async_trait::async_trait;

use crate::domain::{NewReport, Report, ReportStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by report adapters.
    pub enum ReportRepositoryError {
        /// Backend could not be reached.
        Connection { message: String } => "report repository connection failed: {message}",
        /// Backend rejected or failed the request.
        Query { message: String } => "report repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Reports with the given archive flag, newest first.
    async fn list(&self, archived: bool) -> Result<Vec<Report>, ReportRepositoryError>;

    /// Newest active pending reports, at most `limit`.
    async fn recent_pending(&self, limit: usize) -> Result<Vec<Report>, ReportRepositoryError>;

    /// Insert a pending report.
    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError>;

    /// Change a report's status. `None` when the row does not exist.
    async fn update_status(
        &self,
        id: i64,
        status: ReportStatus,
    ) -> Result<Option<Report>, ReportRepositoryError>;
}
