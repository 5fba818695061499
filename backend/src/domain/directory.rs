//! Doctor and patient records managed from the console.
//!
//! Drafts are validated here; persistence goes through
//! [`crate::domain::ports::DirectoryRepository`]. Account provisioning for
//! new records lives in [`crate::domain::DirectoryService`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::user::{Email, UserId, UserValidationError};

/// Kind of record that supports archiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Doctor,
    Patient,
    Report,
}

impl RecordKind {
    /// Backing table name.
    pub const fn table(self) -> &'static str {
        match self {
            Self::Doctor => "doctors",
            Self::Patient => "patients",
            Self::Report => "reports",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctors" | "doctor" => Ok(Self::Doctor),
            "patients" | "patient" => Ok(Self::Patient),
            "reports" | "report" => Ok(Self::Report),
            other => Err(UnknownRecordKind(other.to_owned())),
        }
    }
}

/// Raised for an unrecognised record kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind: {0}")]
pub struct UnknownRecordKind(pub String);

/// Postal address captured as separate parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
}

impl AddressParts {
    /// Join the non-empty parts with `", "`.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::AddressParts;
    ///
    /// let address = AddressParts {
    ///     street: "12 Rizal St".into(),
    ///     barangay: " ".into(),
    ///     city: "Cebu City".into(),
    ///     province: "Cebu".into(),
    /// };
    /// assert_eq!(address.joined(), "12 Rizal St, Cebu City, Cebu");
    /// ```
    pub fn joined(&self) -> String {
        [&self.street, &self.barangay, &self.city, &self.province]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Split a stored address back into parts, in order.
    pub fn split(joined: &str) -> Self {
        let mut parts = joined.split(',').map(|part| part.trim().to_owned());
        Self {
            street: parts.next().unwrap_or_default(),
            barangay: parts.next().unwrap_or_default(),
            city: parts.next().unwrap_or_default(),
            province: parts.next().unwrap_or_default(),
        }
    }
}

/// Person name in three parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub first: String,
    pub middle: Option<String>,
    pub last: String,
}

impl PersonName {
    /// Build a name, trimming parts and dropping a blank middle name.
    pub fn new(first: &str, middle: Option<&str>, last: &str) -> Self {
        Self {
            first: first.trim().to_owned(),
            middle: middle
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned),
            last: last.trim().to_owned(),
        }
    }

    /// Space-joined full name.
    pub fn full(&self) -> String {
        [Some(self.first.as_str()), self.middle.as_deref(), Some(self.last.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Split a full name: first word, last word, and everything between as
    /// the middle name.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::PersonName;
    ///
    /// let name = PersonName::split("Ana Maria de la Cruz");
    /// assert_eq!(name.first, "Ana");
    /// assert_eq!(name.middle.as_deref(), Some("Maria de la"));
    /// assert_eq!(name.last, "Cruz");
    /// ```
    pub fn split(full_name: &str) -> Self {
        let words: Vec<&str> = full_name.split_whitespace().collect();
        match words.as_slice() {
            [] => Self::default(),
            [only] => Self::new(only, None, ""),
            [first, middle @ .., last] => {
                let middle = middle.join(" ");
                Self::new(first, Some(middle.as_str()), last)
            }
        }
    }
}

/// Doctor profile fields editable from the console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub name: PersonName,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub prc_license: Option<String>,
    pub hospital_affiliate: Option<String>,
}

/// Stored doctor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub is_archived: bool,
}

/// Doctor row to insert after the login account exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctor {
    pub profile: DoctorProfile,
    pub user_id: UserId,
}

/// Doctor form problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoctorDraftValidationError {
    /// First name missing.
    #[error("first name must not be empty")]
    EmptyFirstName,
    /// Last name missing.
    #[error("last name must not be empty")]
    EmptyLastName,
    /// Email missing or malformed.
    #[error("{0}")]
    Email(UserValidationError),
}

impl DoctorDraftValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "firstName",
            Self::EmptyLastName => "lastName",
            Self::Email(_) => "email",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "empty_first_name",
            Self::EmptyLastName => "empty_last_name",
            Self::Email(UserValidationError::EmptyEmail) => "empty_email",
            Self::Email(_) => "invalid_email",
        }
    }
}

/// Raw doctor form input.
#[derive(Debug, Clone, Default)]
pub struct DoctorForm {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    pub address: AddressParts,
    pub gender: Option<String>,
    pub prc_license: Option<String>,
    pub hospital_affiliate: Option<String>,
}

/// Validated doctor form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorDraft {
    pub profile: DoctorProfile,
    pub email: Email,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

impl DoctorDraft {
    /// Validate a doctor form.
    pub fn try_from_form(form: DoctorForm) -> Result<Self, DoctorDraftValidationError> {
        if form.first_name.trim().is_empty() {
            return Err(DoctorDraftValidationError::EmptyFirstName);
        }
        if form.last_name.trim().is_empty() {
            return Err(DoctorDraftValidationError::EmptyLastName);
        }
        let email = Email::new(form.email).map_err(DoctorDraftValidationError::Email)?;
        let address = Some(form.address.joined()).filter(|joined| !joined.is_empty());
        Ok(Self {
            profile: DoctorProfile {
                name: PersonName::new(
                    &form.first_name,
                    form.middle_name.as_deref(),
                    &form.last_name,
                ),
                specialization: optional(form.specialization),
                phone_number: optional(form.phone_number),
                address,
                gender: optional(form.gender),
                prc_license: optional(form.prc_license),
                hospital_affiliate: optional(form.hospital_affiliate),
            },
            email,
        })
    }
}

/// Patient profile fields editable from the console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub name: String,
    pub age: Option<u16>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub condition: Option<String>,
    pub doctor_id: Option<i64>,
}

/// Stored patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    #[serde(flatten)]
    pub profile: PatientProfile,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub is_archived: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Patient row to insert after the login account exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub profile: PatientProfile,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Patient form problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatientDraftValidationError {
    /// Name missing.
    #[error("patient name must not be empty")]
    EmptyName,
    /// Supplied email malformed.
    #[error("{0}")]
    Email(UserValidationError),
}

impl PatientDraftValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::Email(_) => "email",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::Email(_) => "invalid_email",
        }
    }
}

/// Raw patient form input.
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
    pub name: String,
    pub email: Option<String>,
    pub age: Option<u16>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub condition: Option<String>,
    pub doctor_id: Option<i64>,
}

/// Domain used for placeholder patient addresses.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "tempmail.com";

/// Validated patient form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDraft {
    pub profile: PatientProfile,
    pub email: Email,
}

impl PatientDraft {
    /// Validate a patient form, deriving a placeholder email when none is
    /// given.
    pub fn try_from_form(form: PatientForm) -> Result<Self, PatientDraftValidationError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(PatientDraftValidationError::EmptyName);
        }
        let email = match optional(form.email) {
            Some(raw) => Email::new(raw),
            None => Email::new(format!(
                "{}@{PLACEHOLDER_EMAIL_DOMAIN}",
                super::user::username_from_name(name)
            )),
        }
        .map_err(PatientDraftValidationError::Email)?;
        Ok(Self {
            profile: PatientProfile {
                name: name.to_owned(),
                age: form.age,
                gender: optional(form.gender),
                date_of_birth: form.date_of_birth,
                address: optional(form.address),
                phone_number: optional(form.phone_number),
                condition: optional(form.condition),
                doctor_id: form.doctor_id,
            },
            email,
        })
    }
}

/// Ephemeral credentials for a freshly provisioned account.
///
/// Returned exactly once to the administrator; only the hash is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCredentials {
    pub name: String,
    pub email: Email,
    pub password: super::credentials::Password,
}

/// Result of provisioning a doctor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedDoctor {
    pub doctor: Doctor,
    pub credentials: GeneratedCredentials,
}

/// Result of provisioning a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedPatient {
    pub patient: Patient,
    pub credentials: GeneratedCredentials,
}

/// Related activity logs for one patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientLogs {
    pub glucose_readings: Vec<serde_json::Value>,
    pub meals: Vec<serde_json::Value>,
    pub activities: Vec<serde_json::Value>,
    pub logins: Vec<serde_json::Value>,
}
