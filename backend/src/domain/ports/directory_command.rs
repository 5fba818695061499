//! Driving port for provisioning and editing doctors and patients.

use async_trait::async_trait;

use crate::domain::{
    Doctor, DoctorDraft, DoctorProfile, Error, Patient, PatientDraft, PatientProfile,
    ProvisionedDoctor, ProvisionedPatient,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryCommand: Send + Sync {
    /// Create a doctor account with a temporary password, then the doctor
    /// row. The plaintext password is returned once and never stored.
    async fn provision_doctor(&self, draft: DoctorDraft) -> Result<ProvisionedDoctor, Error>;

    /// Overwrite a doctor's profile.
    async fn update_doctor(&self, id: i64, profile: DoctorProfile) -> Result<Doctor, Error>;

    /// Create a patient account with a temporary password, then the
    /// patient row.
    async fn provision_patient(&self, draft: PatientDraft) -> Result<ProvisionedPatient, Error>;

    /// Overwrite a patient's profile.
    async fn update_patient(&self, id: i64, profile: PatientProfile) -> Result<Patient, Error>;
}
