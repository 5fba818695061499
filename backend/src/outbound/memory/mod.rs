//! In-memory implementation of every driven port.
//!
//! Used when no gateway is configured (development mode) and by integration
//! tests. Semantics follow the gateway adapters: filters, ordering and the
//! `is_archived` flag behave the same way, and ids are assigned in insert
//! order.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    AccountUpdate, ArchiveRepository, ArchiveRepositoryError, AvatarStorage, AvatarStorageError,
    DirectoryRepository, DirectoryRepositoryError, EmailRepository, FeedRepositoryError,
    NewAccount, NotificationRepository, PatientLogKind, ReportRepository, ReportRepositoryError,
    StoredAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{
    AVATAR_BUCKET, Doctor, DoctorProfile, Email, EmailMessage, FeedEntry, NewDoctor, NewPatient,
    NewReport, NotificationItem, NotificationKey, NotificationSource, Patient, PatientProfile,
    PasswordHash, RecordKind, Report, ReportStatus, StoredCredential, UserAccount, UserId,
};

#[derive(Debug, Default)]
struct State {
    users: Vec<StoredAccount>,
    notifications: Vec<NotificationItem>,
    emails: Vec<EmailMessage>,
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    reports: Vec<Report>,
    logs: HashMap<(PatientLogKind, i64), Vec<serde_json::Value>>,
    objects: HashMap<String, StoredObject>,
    next_id: i64,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account_email(&self, user_id: Option<&UserId>) -> Option<String> {
        let user_id = user_id?;
        self.users
            .iter()
            .find(|stored| &stored.account.id == user_id)
            .map(|stored| stored.account.email.to_string())
    }

    fn account_name(&self, user_id: &UserId) -> Option<String> {
        self.users
            .iter()
            .find(|stored| &stored.account.id == user_id)
            .and_then(|stored| stored.account.full_name.clone())
    }

    fn archive_flag(&mut self, kind: RecordKind, id: i64) -> Option<&mut bool> {
        match kind {
            RecordKind::Doctor => self
                .doctors
                .iter_mut()
                .find(|row| row.id == id)
                .map(|row| &mut row.is_archived),
            RecordKind::Patient => self
                .patients
                .iter_mut()
                .find(|row| row.id == id)
                .map(|row| &mut row.is_archived),
            RecordKind::Report => self
                .reports
                .iter_mut()
                .find(|row| row.id == id)
                .map(|row| &mut row.is_archived),
        }
    }
}

fn newest_first<T: FeedEntry>(items: &mut [T]) {
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an account with a raw `password` column value, as a legacy
    /// row would hold it. Returns the assigned id.
    ///
    /// # Errors
    ///
    /// Fails only if the generated id is rejected by [`UserId::new`].
    pub fn seed_account(
        &self,
        account: &NewAccount,
        raw_password: &str,
    ) -> Result<UserId, UserPersistenceError> {
        let mut state = self.state();
        let id = state.next_id();
        let user_id = UserId::new(id.to_string())
            .map_err(|error| UserPersistenceError::query(error.to_string()))?;
        state.users.push(StoredAccount {
            account: UserAccount {
                id: user_id.clone(),
                username: Some(account.username.clone()),
                full_name: Some(account.full_name.clone()),
                email: account.email.clone(),
                role: account.role,
                created_at: Some(account.created_at),
            },
            credential: StoredCredential::from_stored(raw_password),
        });
        Ok(user_id)
    }

    /// Raw credential currently stored for `id`.
    pub fn credential_of(&self, id: &UserId) -> Option<StoredCredential> {
        self.state()
            .users
            .iter()
            .find(|stored| &stored.account.id == id)
            .map(|stored| stored.credential.clone())
    }

    /// Add a notification row.
    pub fn seed_notification(&self, item: NotificationItem) {
        self.state().notifications.push(item);
    }

    /// Add an inbox row.
    pub fn seed_email(&self, message: EmailMessage) {
        self.state().emails.push(message);
    }

    /// Add a log row for a patient.
    pub fn seed_patient_log(&self, kind: PatientLogKind, patient_id: i64, row: serde_json::Value) {
        self.state()
            .logs
            .entry((kind, patient_id))
            .or_default()
            .push(row);
    }
}

#[async_trait]
impl UserRepository for InMemoryBackend {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, UserPersistenceError> {
        let email = email.trim();
        Ok(self
            .state()
            .users
            .iter()
            .find(|stored| stored.account.email.as_str() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|stored| &stored.account.id == id)
            .map(|stored| stored.account.clone()))
    }

    async fn is_taken(
        &self,
        email: &Email,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        Ok(self.state().users.iter().any(|stored| {
            except.as_ref() != Some(&stored.account.id)
                && (email.matches(stored.account.email.as_str())
                    || stored.account.username.as_deref() == Some(username))
        }))
    }

    async fn insert(&self, account: &NewAccount) -> Result<UserAccount, UserPersistenceError> {
        let id = self.seed_account(account, account.password_hash.as_str())?;
        self.find_by_id(&id)
            .await?
            .ok_or_else(|| UserPersistenceError::query("inserted account vanished"))
    }

    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        if let Some(stored) = self
            .state()
            .users
            .iter_mut()
            .find(|stored| &stored.account.id == id)
        {
            stored.credential = StoredCredential::Hashed(hash.clone());
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &AccountUpdate,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut state = self.state();
        let Some(stored) = state
            .users
            .iter_mut()
            .find(|stored| &stored.account.id == id)
        else {
            return Ok(None);
        };
        stored.account.username = Some(update.username.clone());
        stored.account.full_name = Some(update.full_name.clone());
        stored.account.email = update.email.clone();
        if let Some(hash) = &update.password_hash {
            stored.credential = StoredCredential::Hashed(hash.clone());
        }
        Ok(Some(stored.account.clone()))
    }

    async fn credentials(&self) -> Result<Vec<(UserId, StoredCredential)>, UserPersistenceError> {
        Ok(self
            .state()
            .users
            .iter()
            .map(|stored| (stored.account.id.clone(), stored.credential.clone()))
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryBackend {
    async fn list(
        &self,
        source: NotificationSource,
    ) -> Result<Vec<NotificationItem>, FeedRepositoryError> {
        let mut items: Vec<NotificationItem> = self
            .state()
            .notifications
            .iter()
            .filter(|item| item.source() == source)
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn mark_read(&self, key: NotificationKey) -> Result<(), FeedRepositoryError> {
        if let Some(item) = self
            .state()
            .notifications
            .iter_mut()
            .find(|item| item.key() == key)
        {
            item.mark_read();
        }
        Ok(())
    }

    async fn delete(&self, key: NotificationKey) -> Result<(), FeedRepositoryError> {
        self.state().notifications.retain(|item| item.key() != key);
        Ok(())
    }
}

#[async_trait]
impl EmailRepository for InMemoryBackend {
    async fn list_for(&self, recipient: &Email) -> Result<Vec<EmailMessage>, FeedRepositoryError> {
        let mut messages: Vec<EmailMessage> = self
            .state()
            .emails
            .iter()
            .filter(|message| message.is_addressed_to(recipient))
            .cloned()
            .collect();
        newest_first(&mut messages);
        Ok(messages)
    }

    async fn mark_read(&self, id: i64) -> Result<(), FeedRepositoryError> {
        if let Some(message) = self.state().emails.iter_mut().find(|m| m.id == id) {
            message.is_read = true;
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), FeedRepositoryError> {
        self.state().emails.retain(|message| message.id != id);
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryBackend {
    async fn list_doctors(&self, archived: bool) -> Result<Vec<Doctor>, DirectoryRepositoryError> {
        let state = self.state();
        let mut doctors: Vec<Doctor> = state
            .doctors
            .iter()
            .filter(|doctor| doctor.is_archived == archived)
            .map(|doctor| Doctor {
                email: state.account_email(doctor.user_id.as_ref()),
                ..doctor.clone()
            })
            .collect();
        doctors.sort_by(|a, b| a.profile.name.last.cmp(&b.profile.name.last));
        Ok(doctors)
    }

    async fn insert_doctor(&self, doctor: &NewDoctor) -> Result<Doctor, DirectoryRepositoryError> {
        let mut state = self.state();
        let id = state.next_id();
        let stored = Doctor {
            id,
            full_name: doctor.profile.name.full(),
            profile: doctor.profile.clone(),
            email: state.account_email(Some(&doctor.user_id)),
            user_id: Some(doctor.user_id.clone()),
            is_archived: false,
        };
        state.doctors.push(stored.clone());
        Ok(stored)
    }

    async fn update_doctor(
        &self,
        id: i64,
        profile: &DoctorProfile,
    ) -> Result<Option<Doctor>, DirectoryRepositoryError> {
        let mut state = self.state();
        let Some(doctor) = state.doctors.iter_mut().find(|doctor| doctor.id == id) else {
            return Ok(None);
        };
        doctor.profile = profile.clone();
        doctor.full_name = profile.name.full();
        let updated = doctor.clone();
        Ok(Some(Doctor {
            email: state.account_email(updated.user_id.as_ref()),
            ..updated
        }))
    }

    async fn list_patients(
        &self,
        archived: bool,
    ) -> Result<Vec<Patient>, DirectoryRepositoryError> {
        let state = self.state();
        let mut patients: Vec<Patient> = state
            .patients
            .iter()
            .filter(|patient| patient.is_archived == archived)
            .map(|patient| Patient {
                email: state.account_email(patient.user_id.as_ref()),
                ..patient.clone()
            })
            .collect();
        patients.sort_by(|a, b| a.profile.name.cmp(&b.profile.name));
        Ok(patients)
    }

    async fn insert_patient(
        &self,
        patient: &NewPatient,
    ) -> Result<Patient, DirectoryRepositoryError> {
        let mut state = self.state();
        let id = state.next_id();
        let stored = Patient {
            id,
            profile: patient.profile.clone(),
            email: state.account_email(Some(&patient.user_id)),
            user_id: Some(patient.user_id.clone()),
            is_archived: false,
            created_at: Some(patient.created_at),
        };
        state.patients.push(stored.clone());
        Ok(stored)
    }

    async fn update_patient(
        &self,
        id: i64,
        profile: &PatientProfile,
    ) -> Result<Option<Patient>, DirectoryRepositoryError> {
        let mut state = self.state();
        let Some(patient) = state.patients.iter_mut().find(|patient| patient.id == id) else {
            return Ok(None);
        };
        patient.profile = profile.clone();
        let updated = patient.clone();
        Ok(Some(Patient {
            email: state.account_email(updated.user_id.as_ref()),
            ..updated
        }))
    }

    async fn patient_created_at(&self) -> Result<Vec<DateTime<Utc>>, DirectoryRepositoryError> {
        Ok(self
            .state()
            .patients
            .iter()
            .filter(|patient| !patient.is_archived)
            .filter_map(|patient| patient.created_at)
            .collect())
    }

    async fn patient_log(
        &self,
        kind: PatientLogKind,
        patient_id: i64,
    ) -> Result<Vec<serde_json::Value>, DirectoryRepositoryError> {
        Ok(self
            .state()
            .logs
            .get(&(kind, patient_id))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ArchiveRepository for InMemoryBackend {
    async fn set_archived(
        &self,
        kind: RecordKind,
        id: i64,
        archived: bool,
    ) -> Result<bool, ArchiveRepositoryError> {
        let mut state = self.state();
        Ok(state
            .archive_flag(kind, id)
            .map(|flag| *flag = archived)
            .is_some())
    }

    async fn count_active(&self, kind: RecordKind) -> Result<u64, ArchiveRepositoryError> {
        let state = self.state();
        let active = match kind {
            RecordKind::Doctor => state.doctors.iter().filter(|r| !r.is_archived).count(),
            RecordKind::Patient => state.patients.iter().filter(|r| !r.is_archived).count(),
            RecordKind::Report => state.reports.iter().filter(|r| !r.is_archived).count(),
        };
        Ok(u64::try_from(active).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ReportRepository for InMemoryBackend {
    async fn list(&self, archived: bool) -> Result<Vec<Report>, ReportRepositoryError> {
        let mut reports: Vec<Report> = self
            .state()
            .reports
            .iter()
            .filter(|report| report.is_archived == archived)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn recent_pending(&self, limit: usize) -> Result<Vec<Report>, ReportRepositoryError> {
        let mut pending = ReportRepository::list(self, false).await?;
        pending.retain(|report| report.status == ReportStatus::Pending);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError> {
        let mut state = self.state();
        let id = state.next_id();
        let stored = Report {
            id,
            title: report.title.clone(),
            report_data: report.report_data.clone(),
            status: ReportStatus::Pending,
            created_at: report.created_at,
            user_id: Some(report.user_id.clone()),
            author_name: state.account_name(&report.user_id),
            is_archived: false,
        };
        state.reports.push(stored.clone());
        Ok(stored)
    }

    async fn update_status(
        &self,
        id: i64,
        status: ReportStatus,
    ) -> Result<Option<Report>, ReportRepositoryError> {
        let mut state = self.state();
        Ok(state
            .reports
            .iter_mut()
            .find(|report| report.id == id)
            .map(|report| {
                report.status = status;
                report.clone()
            }))
    }
}

#[async_trait]
impl AvatarStorage for InMemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AvatarStorageError> {
        self.state().objects.insert(
            path.to_owned(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, AvatarStorageError> {
        Ok(self
            .state()
            .objects
            .get(path)
            .is_some_and(|object| !object.bytes.is_empty() && !object.content_type.is_empty()))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{AVATAR_BUCKET}/{path}")
    }
}
