//! Archive and restore for doctors, patients and reports.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join3;
use tracing::info;

use crate::domain::directory_service::map_directory_error;
use crate::domain::ports::{
    ArchiveCommand, ArchiveQuery, ArchiveRepository, ArchiveRepositoryError, ArchivedRecords,
    DirectoryRepository, ReportRepository,
};
use crate::domain::reports_service::map_report_error;
use crate::domain::{Error, RecordKind};

pub(crate) fn map_archive_error(error: ArchiveRepositoryError) -> Error {
    match error {
        ArchiveRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("archive unavailable: {message}"))
        }
        ArchiveRepositoryError::Query { message } => {
            Error::internal(format!("archive error: {message}"))
        }
    }
}

/// Archive service.
#[derive(Clone)]
pub struct ArchiveService<A, D, R> {
    archive: Arc<A>,
    directory: Arc<D>,
    reports: Arc<R>,
}

impl<A, D, R> ArchiveService<A, D, R> {
    /// Create a service.
    pub fn new(archive: Arc<A>, directory: Arc<D>, reports: Arc<R>) -> Self {
        Self {
            archive,
            directory,
            reports,
        }
    }
}

impl<A: ArchiveRepository, D, R> ArchiveService<A, D, R> {
    async fn set_flag(&self, kind: RecordKind, id: i64, archived: bool) -> Result<(), Error> {
        let found = self
            .archive
            .set_archived(kind, id, archived)
            .await
            .map_err(map_archive_error)?;
        if !found {
            return Err(Error::not_found(format!("{} {id} not found", kind.table())));
        }
        info!(table = kind.table(), id, archived, "archive flag changed");
        Ok(())
    }
}

#[async_trait]
impl<A, D, R> ArchiveQuery for ArchiveService<A, D, R>
where
    A: ArchiveRepository,
    D: DirectoryRepository,
    R: ReportRepository,
{
    async fn archived(&self) -> Result<ArchivedRecords, Error> {
        let (doctors, patients, reports) = try_join3(
            async { self.directory.list_doctors(true).await.map_err(map_directory_error) },
            async { self.directory.list_patients(true).await.map_err(map_directory_error) },
            async { self.reports.list(true).await.map_err(map_report_error) },
        )
        .await?;
        Ok(ArchivedRecords {
            doctors,
            patients,
            reports,
        })
    }
}

#[async_trait]
impl<A, D, R> ArchiveCommand for ArchiveService<A, D, R>
where
    A: ArchiveRepository,
    D: DirectoryRepository,
    R: ReportRepository,
{
    async fn archive(&self, kind: RecordKind, id: i64) -> Result<(), Error> {
        self.set_flag(kind, id, true).await
    }

    async fn restore(&self, kind: RecordKind, id: i64) -> Result<(), Error> {
        self.set_flag(kind, id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        DirectoryRepositoryError, MockArchiveRepository, MockDirectoryRepository,
        MockReportRepository,
    };

    fn service(
        archive: MockArchiveRepository,
        directory: MockDirectoryRepository,
    ) -> ArchiveService<MockArchiveRepository, MockDirectoryRepository, MockReportRepository> {
        let mut reports = MockReportRepository::new();
        reports.expect_list().returning(|_| Ok(Vec::new()));
        ArchiveService::new(Arc::new(archive), Arc::new(directory), Arc::new(reports))
    }

    #[rstest]
    #[case(RecordKind::Doctor, true)]
    #[case(RecordKind::Report, false)]
    #[tokio::test]
    async fn flags_the_requested_table(#[case] kind: RecordKind, #[case] archive: bool) {
        let mut repo = MockArchiveRepository::new();
        repo.expect_set_archived()
            .withf(move |k, id, flag| *k == kind && *id == 4 && *flag == archive)
            .times(1)
            .return_once(|_, _, _| Ok(true));
        let svc = service(repo, MockDirectoryRepository::new());

        let result = if archive {
            svc.archive(kind, 4).await
        } else {
            svc.restore(kind, 4).await
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_row_is_not_found() {
        let mut repo = MockArchiveRepository::new();
        repo.expect_set_archived().return_once(|_, _, _| Ok(false));

        let err = service(repo, MockDirectoryRepository::new())
            .archive(RecordKind::Patient, 9)
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn archived_lists_only_archived_rows() {
        let mut directory = MockDirectoryRepository::new();
        directory
            .expect_list_doctors()
            .withf(|archived| *archived)
            .return_once(|_| Ok(Vec::new()));
        directory
            .expect_list_patients()
            .withf(|archived| *archived)
            .return_once(|_| Err(DirectoryRepositoryError::connection("down")));

        let err = service(MockArchiveRepository::new(), directory)
            .archived()
            .await
            .expect_err("one list failed");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
