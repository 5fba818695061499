//! Port for the `is_archived` flag shared by doctors, patients and reports.
use async_trait::async_trait;

use crate::domain::RecordKind;

use super::define_port_error;

define_port_error! {
    /// Errors raised by archive adapters.
    pub enum ArchiveRepositoryError {
        /// Backend could not be reached.
        Connection { message: String } => "archive repository connection failed: {message}",
        /// Backend rejected or failed the request.
        Query { message: String } => "archive repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Set the archive flag. Returns `false` when no row matched.
    async fn set_archived(
        &self,
        kind: RecordKind,
        id: i64,
        archived: bool,
    ) -> Result<bool, ArchiveRepositoryError>;

    /// Number of rows of `kind` that are not archived.
    async fn count_active(&self, kind: RecordKind) -> Result<u64, ArchiveRepositoryError>;
}
