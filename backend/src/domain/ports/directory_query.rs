//! Driving port for reading doctors and patients.

use async_trait::async_trait;

use crate::domain::{Doctor, Error, Patient, PatientLogs};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryQuery: Send + Sync {
    /// Active doctors.
    async fn doctors(&self) -> Result<Vec<Doctor>, Error>;

    /// Active patients.
    async fn patients(&self) -> Result<Vec<Patient>, Error>;

    /// Glucose, meal, activity and login logs for one patient, fetched
    /// concurrently. Any failing table fails the whole call.
    async fn patient_logs(&self, patient_id: i64) -> Result<PatientLogs, Error>;
}
