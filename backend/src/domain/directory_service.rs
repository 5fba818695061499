//! Doctor and patient provisioning.
//!
//! Provisioning creates the login account first, with a freshly generated
//! temporary password stored only as a bcrypt hash, and then the profile row
//! linked to it. The plaintext is handed back once in the result.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join4;
use mockable::Clock;
use tracing::{error, info};

use crate::domain::auth_service::{hash_off_thread, map_user_error};
use crate::domain::ports::{
    DirectoryCommand, DirectoryQuery, DirectoryRepository, DirectoryRepositoryError, NewAccount,
    PatientLogKind, UserRepository,
};
use crate::domain::{
    Doctor, DoctorDraft, DoctorProfile, Email, Error, GeneratedCredentials, NewDoctor, NewPatient,
    PasswordAlphabet, Patient, PatientDraft, PatientLogs, PatientProfile, ProvisionedDoctor,
    ProvisionedPatient, Role, TEMPORARY_PASSWORD_LENGTH, UserAccount, generate_temporary_password,
    username_from_name,
};

pub(crate) fn map_directory_error(error: DirectoryRepositoryError) -> Error {
    match error {
        DirectoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("directory unavailable: {message}"))
        }
        DirectoryRepositoryError::Query { message } => {
            Error::internal(format!("directory error: {message}"))
        }
    }
}

/// Directory service over the account and directory repositories.
#[derive(Clone)]
pub struct DirectoryService<U, D> {
    users: Arc<U>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<U, D> DirectoryService<U, D> {
    /// Create a service.
    pub fn new(users: Arc<U>, directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            directory,
            clock,
        }
    }
}

impl<U: UserRepository, D: DirectoryRepository> DirectoryService<U, D> {
    /// Create a login account with a temporary password.
    async fn create_account(
        &self,
        full_name: &str,
        email: &Email,
        role: Role,
        alphabet: PasswordAlphabet,
    ) -> Result<(UserAccount, GeneratedCredentials), Error> {
        let username = username_from_name(full_name);
        let taken = self
            .users
            .is_taken(email, &username, None)
            .await
            .map_err(map_user_error)?;
        if taken {
            return Err(Error::conflict("email or username already exists"));
        }

        let password = generate_temporary_password(TEMPORARY_PASSWORD_LENGTH, alphabet);
        let password_hash = hash_off_thread(password.clone()).await?;
        let account = self
            .users
            .insert(&NewAccount {
                username,
                full_name: full_name.to_owned(),
                email: email.clone(),
                password_hash,
                role,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_user_error)?;
        let credentials = GeneratedCredentials {
            name: full_name.to_owned(),
            email: email.clone(),
            password,
        };
        Ok((account, credentials))
    }

    fn orphaned(account: &UserAccount, err: DirectoryRepositoryError) -> Error {
        error!(
            user_id = %account.id,
            error = %err,
            "profile insert failed after account creation; account left without profile"
        );
        map_directory_error(err)
    }
}

#[async_trait]
impl<U, D> DirectoryQuery for DirectoryService<U, D>
where
    U: UserRepository,
    D: DirectoryRepository,
{
    async fn doctors(&self) -> Result<Vec<Doctor>, Error> {
        self.directory
            .list_doctors(false)
            .await
            .map_err(map_directory_error)
    }

    async fn patients(&self) -> Result<Vec<Patient>, Error> {
        self.directory
            .list_patients(false)
            .await
            .map_err(map_directory_error)
    }

    async fn patient_logs(&self, patient_id: i64) -> Result<PatientLogs, Error> {
        let (glucose_readings, meals, activities, logins) = try_join4(
            self.directory
                .patient_log(PatientLogKind::GlucoseReadings, patient_id),
            self.directory.patient_log(PatientLogKind::Meals, patient_id),
            self.directory
                .patient_log(PatientLogKind::Activities, patient_id),
            self.directory.patient_log(PatientLogKind::Logins, patient_id),
        )
        .await
        .map_err(|err| {
            error!(patient_id, error = %err, "loading patient logs failed");
            map_directory_error(err)
        })?;
        Ok(PatientLogs {
            glucose_readings,
            meals,
            activities,
            logins,
        })
    }
}

#[async_trait]
impl<U, D> DirectoryCommand for DirectoryService<U, D>
where
    U: UserRepository,
    D: DirectoryRepository,
{
    async fn provision_doctor(&self, draft: DoctorDraft) -> Result<ProvisionedDoctor, Error> {
        let full_name = draft.profile.name.full();
        let (account, credentials) = self
            .create_account(
                &full_name,
                &draft.email,
                Role::Doctor,
                PasswordAlphabet::WithPunctuation,
            )
            .await?;
        let mut doctor = self
            .directory
            .insert_doctor(&NewDoctor {
                profile: draft.profile,
                user_id: account.id.clone(),
            })
            .await
            .map_err(|err| Self::orphaned(&account, err))?;
        doctor.email = Some(draft.email.to_string());
        info!(doctor_id = doctor.id, user_id = %account.id, "doctor provisioned");
        Ok(ProvisionedDoctor {
            doctor,
            credentials,
        })
    }

    async fn update_doctor(&self, id: i64, profile: DoctorProfile) -> Result<Doctor, Error> {
        self.directory
            .update_doctor(id, &profile)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("doctor {id} not found")))
    }

    async fn provision_patient(&self, draft: PatientDraft) -> Result<ProvisionedPatient, Error> {
        let (account, credentials) = self
            .create_account(
                &draft.profile.name,
                &draft.email,
                Role::Patient,
                PasswordAlphabet::Alphanumeric,
            )
            .await?;
        let mut patient = self
            .directory
            .insert_patient(&NewPatient {
                profile: draft.profile,
                user_id: account.id.clone(),
                created_at: self.clock.utc(),
            })
            .await
            .map_err(|err| Self::orphaned(&account, err))?;
        patient.email = Some(draft.email.to_string());
        info!(patient_id = patient.id, user_id = %account.id, "patient provisioned");
        Ok(ProvisionedPatient {
            patient,
            credentials,
        })
    }

    async fn update_patient(&self, id: i64, profile: PatientProfile) -> Result<Patient, Error> {
        self.directory
            .update_patient(id, &profile)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("patient {id} not found")))
    }
}

#[cfg(test)]
#[path = "directory_service_tests.rs"]
mod tests;
