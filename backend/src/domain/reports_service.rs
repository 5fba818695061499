//! Reports and the dashboard.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join5;
use mockable::Clock;
use tracing::info;

use crate::domain::archive_service::map_archive_error;
use crate::domain::directory_service::map_directory_error;
use crate::domain::ports::{
    ArchiveRepository, DirectoryRepository, ReportRepository, ReportRepositoryError,
    ReportsCommand, ReportsQuery,
};
use crate::domain::{
    AdminSession, DashboardStats, Error, NewReport, RECENT_PENDING_LIMIT, RecordKind, Report,
    ReportDraft, ReportFilter, ReportStatus, patients_per_month,
};

pub(crate) fn map_report_error(error: ReportRepositoryError) -> Error {
    match error {
        ReportRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("reports unavailable: {message}"))
        }
        ReportRepositoryError::Query { message } => {
            Error::internal(format!("reports error: {message}"))
        }
    }
}

/// Report and dashboard service.
#[derive(Clone)]
pub struct ReportsService<R, A, D> {
    reports: Arc<R>,
    archive: Arc<A>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<R, A, D> ReportsService<R, A, D> {
    /// Create a service.
    pub fn new(reports: Arc<R>, archive: Arc<A>, directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reports,
            archive,
            directory,
            clock,
        }
    }
}

impl<R, A: ArchiveRepository, D> ReportsService<R, A, D> {
    async fn count(&self, kind: RecordKind) -> Result<u64, Error> {
        self.archive
            .count_active(kind)
            .await
            .map_err(map_archive_error)
    }
}

#[async_trait]
impl<R, A, D> ReportsQuery for ReportsService<R, A, D>
where
    R: ReportRepository,
    A: ArchiveRepository,
    D: DirectoryRepository,
{
    async fn reports(&self, filter: ReportFilter) -> Result<Vec<Report>, Error> {
        let reports = self.reports.list(false).await.map_err(map_report_error)?;
        Ok(filter.apply(reports))
    }

    async fn dashboard(&self, year: i32) -> Result<DashboardStats, Error> {
        let (patients, doctors, reports, recent_pending, created) = try_join5(
            self.count(RecordKind::Patient),
            self.count(RecordKind::Doctor),
            self.count(RecordKind::Report),
            async {
                self.reports
                    .recent_pending(RECENT_PENDING_LIMIT)
                    .await
                    .map_err(map_report_error)
            },
            async {
                self.directory
                    .patient_created_at()
                    .await
                    .map_err(map_directory_error)
            },
        )
        .await?;
        Ok(DashboardStats {
            patients,
            doctors,
            reports,
            recent_pending,
            year,
            patients_per_month: patients_per_month(created, year),
        })
    }
}

#[async_trait]
impl<R, A, D> ReportsCommand for ReportsService<R, A, D>
where
    R: ReportRepository,
    A: ArchiveRepository,
    D: DirectoryRepository,
{
    async fn create(&self, author: &AdminSession, draft: ReportDraft) -> Result<Report, Error> {
        let report = self
            .reports
            .insert(&NewReport {
                title: draft.title,
                report_data: draft.report_data,
                user_id: author.user_id().clone(),
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_report_error)?;
        info!(report_id = report.id, "report filed");
        Ok(report)
    }

    async fn update_status(&self, id: i64, status: ReportStatus) -> Result<Report, Error> {
        self.reports
            .update_status(id, status)
            .await
            .map_err(map_report_error)?
            .ok_or_else(|| Error::not_found(format!("report {id} not found")))
    }
}
