//! Driving port for the archive view.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Doctor, Error, Patient, Report};

/// Everything currently archived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedRecords {
    pub doctors: Vec<Doctor>,
    pub patients: Vec<Patient>,
    pub reports: Vec<Report>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveQuery: Send + Sync {
    /// Archived doctors, patients and reports.
    async fn archived(&self) -> Result<ArchivedRecords, Error>;
}
