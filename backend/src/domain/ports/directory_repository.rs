//! Port for the doctor and patient tables.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Doctor, DoctorProfile, NewDoctor, NewPatient, Patient, PatientProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by directory adapters.
    pub enum DirectoryRepositoryError {
        /// Backend could not be reached.
        Connection { message: String } => "directory repository connection failed: {message}",
        /// Backend rejected or failed the request.
        Query { message: String } => "directory repository query failed: {message}",
    }
}

/// Per-patient log tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientLogKind {
    GlucoseReadings,
    Meals,
    Activities,
    Logins,
}

impl PatientLogKind {
    /// Backing table name.
    pub const fn table(self) -> &'static str {
        match self {
            Self::GlucoseReadings => "cbgs",
            Self::Meals => "meals",
            Self::Activities => "activities",
            Self::Logins => "logins",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Doctors with the given archive flag.
    async fn list_doctors(&self, archived: bool) -> Result<Vec<Doctor>, DirectoryRepositoryError>;

    /// Insert a doctor row linked to an existing account.
    async fn insert_doctor(&self, doctor: &NewDoctor) -> Result<Doctor, DirectoryRepositoryError>;

    /// Overwrite a doctor's profile. `None` when the row does not exist.
    async fn update_doctor(
        &self,
        id: i64,
        profile: &DoctorProfile,
    ) -> Result<Option<Doctor>, DirectoryRepositoryError>;

    /// Patients with the given archive flag.
    async fn list_patients(&self, archived: bool)
    -> Result<Vec<Patient>, DirectoryRepositoryError>;

    /// Insert a patient row linked to an existing account.
    async fn insert_patient(
        &self,
        patient: &NewPatient,
    ) -> Result<Patient, DirectoryRepositoryError>;

    /// Overwrite a patient's profile. `None` when the row does not exist.
    async fn update_patient(
        &self,
        id: i64,
        profile: &PatientProfile,
    ) -> Result<Option<Patient>, DirectoryRepositoryError>;

    /// Creation timestamps of every patient row, archived or not.
    async fn patient_created_at(&self) -> Result<Vec<DateTime<Utc>>, DirectoryRepositoryError>;

    /// Rows of one log table for a patient.
    async fn patient_log(
        &self,
        kind: PatientLogKind,
        patient_id: i64,
    ) -> Result<Vec<serde_json::Value>, DirectoryRepositoryError>;
}
