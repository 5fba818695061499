//! Driving port for the report list and dashboard.

use async_trait::async_trait;

use crate::domain::{DashboardStats, Error, Report, ReportFilter};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportsQuery: Send + Sync {
    /// Active reports passing `filter`, newest first.
    async fn reports(&self, filter: ReportFilter) -> Result<Vec<Report>, Error>;

    /// Dashboard headline numbers, with the patient histogram for `year`.
    async fn dashboard(&self, year: i32) -> Result<DashboardStats, Error>;
}
