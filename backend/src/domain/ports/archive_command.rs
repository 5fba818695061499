//! Driving port for archiving and restoring records.

use async_trait::async_trait;

use crate::domain::{Error, RecordKind};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveCommand: Send + Sync {
    /// Hide a record from the active lists. `not_found` for unknown ids.
    async fn archive(&self, kind: RecordKind, id: i64) -> Result<(), Error>;

    /// Return an archived record to the active lists.
    async fn restore(&self, kind: RecordKind, id: i64) -> Result<(), Error>;
}
