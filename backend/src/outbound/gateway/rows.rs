//! Row DTOs for the backend tables.
//!
//! Adapters decode responses into these snake_case transport rows first,
//! then map them into domain records in one pass. Write payloads live here
//! too so column names stay in one place.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::ports::{NewAccount, StoredAccount};
use crate::domain::{
    ChangeEvent, Doctor, DoctorProfile, Email, EmailMessage, NewDoctor, NewPatient, NewReport,
    NotificationItem, NotificationSource, Patient, PatientNotification, PatientProfile, PersonName, Report,
    ReportNotification, ReportStatus, Role, StoredCredential, UserAccount, UserId,
};

/// Accept integer or text primary keys and carry them as strings.
fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(value) => value.to_string(),
        Raw::Text(value) => value,
    })
}

fn optional_id_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id_text")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(value)| value))
}

/// Parse `timestamptz` (RFC 3339) or `timestamp` (naive, read as UTC).
pub(super) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .map(|naive| naive.and_utc())
        })
        .map_err(|error| format!("invalid timestamp {raw}: {error}"))
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

fn user_id(raw: Option<String>) -> Option<UserId> {
    raw.and_then(|value| UserId::new(value).ok())
}

/// Embedded relation, returned as an object or a one-element array
/// depending on how the foreign key is declared.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum Embedded<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Embedded<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EmailEmbed {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthorEmbed {
    full_name: Option<String>,
}

// --- users -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UserRow {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    email: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl UserRow {
    pub(super) fn into_account(self) -> Result<UserAccount, String> {
        self.into_parts().map(|(account, _)| account)
    }

    pub(super) fn into_stored(self) -> Result<StoredAccount, String> {
        let (account, password) = self.into_parts()?;
        Ok(StoredAccount {
            account,
            credential: StoredCredential::from_stored(password.unwrap_or_default()),
        })
    }

    fn into_parts(self) -> Result<(UserAccount, Option<String>), String> {
        let id = UserId::new(self.id).map_err(|error| error.to_string())?;
        let email =
            Email::new(self.email).map_err(|error| format!("user {id} has {error}"))?;
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| format!("user {id} has no role"))?
            .parse::<Role>()
            .map_err(|error| format!("user {id}: {error}"))?;
        Ok((
            UserAccount {
                id,
                username: self.username,
                full_name: self.full_name,
                email,
                role,
                created_at: self.created_at,
            },
            self.password,
        ))
    }
}

/// Credential-only projection used by the migration job.
#[derive(Debug, Deserialize)]
pub(super) struct CredentialRow {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default)]
    password: Option<String>,
}

impl CredentialRow {
    pub(super) fn into_domain(self) -> Result<(UserId, StoredCredential), String> {
        let id = UserId::new(self.id).map_err(|error| error.to_string())?;
        Ok((id, StoredCredential::from_stored(self.password.unwrap_or_default())))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewUserRow<'a> {
    email: &'a str,
    username: &'a str,
    full_name: &'a str,
    password: &'a str,
    role: &'static str,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a NewAccount> for NewUserRow<'a> {
    fn from(account: &'a NewAccount) -> Self {
        Self {
            email: account.email.as_str(),
            username: &account.username,
            full_name: &account.full_name,
            password: account.password_hash.as_str(),
            role: account.role.as_str(),
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct UserPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) password: Option<&'a str>,
}

// --- feeds -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ReportNotificationRow {
    id: i64,
    #[serde(default)]
    message: String,
    #[serde(deserialize_with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_read: bool,
}

impl From<ReportNotificationRow> for NotificationItem {
    fn from(row: ReportNotificationRow) -> Self {
        Self::Report(ReportNotification {
            id: row.id,
            message: row.message,
            created_at: row.created_at,
            is_read: row.is_read,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PatientNotificationRow {
    id: i64,
    #[serde(default)]
    message: String,
    #[serde(deserialize_with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    patient_id: Option<i64>,
}

impl From<PatientNotificationRow> for NotificationItem {
    fn from(row: PatientNotificationRow) -> Self {
        Self::Patient(PatientNotification {
            id: row.id,
            message: row.message,
            created_at: row.created_at,
            is_read: row.is_read,
            patient_id: row.patient_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EmailRow {
    id: i64,
    recipient_email: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
    #[serde(deserialize_with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_read: bool,
}

impl From<EmailRow> for EmailMessage {
    fn from(row: EmailRow) -> Self {
        Self {
            id: row.id,
            recipient_email: row.recipient_email,
            subject: row.subject,
            message: row.message,
            created_at: row.created_at,
            is_read: row.is_read,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ReadPatch {
    pub(super) is_read: bool,
}

// --- directory -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DoctorRow {
    id: i64,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    middle_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    specialization: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    prc_license: Option<String>,
    #[serde(default)]
    hospital_affiliate: Option<String>,
    #[serde(default, deserialize_with = "optional_id_text")]
    user_id: Option<String>,
    #[serde(default)]
    is_archived: Option<bool>,
    #[serde(default)]
    users: Option<Embedded<EmailEmbed>>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        let name = match (&row.first_name, &row.last_name) {
            (None, None) => PersonName::split(row.full_name.as_deref().unwrap_or_default()),
            (first, last) => PersonName::new(
                first.as_deref().unwrap_or_default(),
                row.middle_name.as_deref(),
                last.as_deref().unwrap_or_default(),
            ),
        };
        let full_name = row
            .full_name
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| name.full());
        Self {
            id: row.id,
            full_name,
            profile: DoctorProfile {
                name,
                specialization: row.specialization,
                phone_number: row.phone_number,
                address: row.address,
                gender: row.gender,
                prc_license: row.prc_license,
                hospital_affiliate: row.hospital_affiliate,
            },
            email: row.users.and_then(Embedded::into_first).and_then(|u| u.email),
            user_id: user_id(row.user_id),
            is_archived: row.is_archived.unwrap_or(false),
        }
    }
}

/// Doctor columns written on insert and update.
#[derive(Debug, Serialize)]
pub(super) struct DoctorColumns<'a> {
    first_name: &'a str,
    middle_name: Option<&'a str>,
    last_name: &'a str,
    full_name: String,
    specialization: Option<&'a str>,
    phone_number: Option<&'a str>,
    address: Option<&'a str>,
    gender: Option<&'a str>,
    prc_license: Option<&'a str>,
    hospital_affiliate: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

impl<'a> From<&'a DoctorProfile> for DoctorColumns<'a> {
    fn from(profile: &'a DoctorProfile) -> Self {
        Self {
            first_name: &profile.name.first,
            middle_name: profile.name.middle.as_deref(),
            last_name: &profile.name.last,
            full_name: profile.name.full(),
            specialization: profile.specialization.as_deref(),
            phone_number: profile.phone_number.as_deref(),
            address: profile.address.as_deref(),
            gender: profile.gender.as_deref(),
            prc_license: profile.prc_license.as_deref(),
            hospital_affiliate: profile.hospital_affiliate.as_deref(),
            user_id: None,
        }
    }
}

impl<'a> From<&'a NewDoctor> for DoctorColumns<'a> {
    fn from(doctor: &'a NewDoctor) -> Self {
        Self {
            user_id: Some(doctor.user_id.as_ref()),
            ..Self::from(&doctor.profile)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PatientRow {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    age: Option<u16>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "optional_id_text")]
    user_id: Option<String>,
    #[serde(default)]
    is_archived: Option<bool>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    users: Option<Embedded<EmailEmbed>>,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: row.id,
            profile: PatientProfile {
                name: row.name.unwrap_or_default(),
                age: row.age,
                gender: row.gender,
                date_of_birth: row.date_of_birth,
                address: row.address,
                phone_number: row.phone_number,
                condition: row.condition,
                doctor_id: row.doctor_id,
            },
            email: row.users.and_then(Embedded::into_first).and_then(|u| u.email),
            user_id: user_id(row.user_id),
            is_archived: row.is_archived.unwrap_or(false),
            created_at: row.created_at,
        }
    }
}

/// Patient columns written on insert and update.
#[derive(Debug, Serialize)]
pub(super) struct PatientColumns<'a> {
    name: &'a str,
    age: Option<u16>,
    gender: Option<&'a str>,
    date_of_birth: Option<NaiveDate>,
    address: Option<&'a str>,
    phone_number: Option<&'a str>,
    condition: Option<&'a str>,
    doctor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a PatientProfile> for PatientColumns<'a> {
    fn from(profile: &'a PatientProfile) -> Self {
        Self {
            name: &profile.name,
            age: profile.age,
            gender: profile.gender.as_deref(),
            date_of_birth: profile.date_of_birth,
            address: profile.address.as_deref(),
            phone_number: profile.phone_number.as_deref(),
            condition: profile.condition.as_deref(),
            doctor_id: profile.doctor_id,
            user_id: None,
            created_at: None,
        }
    }
}

impl<'a> From<&'a NewPatient> for PatientColumns<'a> {
    fn from(patient: &'a NewPatient) -> Self {
        Self {
            user_id: Some(patient.user_id.as_ref()),
            created_at: Some(patient.created_at),
            ..Self::from(&patient.profile)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedAtRow {
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub(super) created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct ArchivePatch {
    pub(super) is_archived: bool,
}

// --- reports ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ReportRow {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    report_data: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_id_text")]
    user_id: Option<String>,
    #[serde(default)]
    doctor_name: Option<String>,
    #[serde(default)]
    is_archived: Option<bool>,
    #[serde(default)]
    users: Option<Embedded<AuthorEmbed>>,
}

impl TryFrom<ReportRow> for Report {
    type Error = String;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_deref() {
            None => ReportStatus::Pending,
            Some(raw) => raw
                .parse()
                .map_err(|error| format!("report {}: {error}", row.id))?,
        };
        let author_name = row
            .users
            .and_then(Embedded::into_first)
            .and_then(|author| author.full_name)
            .or(row.doctor_name);
        Ok(Self {
            id: row.id,
            title: row.title,
            report_data: row.report_data,
            status,
            created_at: row.created_at,
            user_id: user_id(row.user_id),
            author_name,
            is_archived: row.is_archived.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewReportRow<'a> {
    user_id: &'a str,
    title: &'a str,
    report_data: &'a str,
    status: &'static str,
    created_at: DateTime<Utc>,
    is_archived: bool,
}

impl<'a> From<&'a NewReport> for NewReportRow<'a> {
    fn from(report: &'a NewReport) -> Self {
        Self {
            user_id: report.user_id.as_ref(),
            title: &report.title,
            report_data: &report.report_data,
            status: ReportStatus::Pending.as_stored(),
            created_at: report.created_at,
            is_archived: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StatusPatch {
    pub(super) status: &'static str,
}

// --- change records ----------------------------------------------------------

/// Decode a row relayed by the change webhook.
///
/// Returns `Ok(None)` for tables that do not feed the console.
pub(crate) fn decode_change_record(
    table: &str,
    record: serde_json::Value,
) -> Result<Option<ChangeEvent>, String> {
    let decode = |error: serde_json::Error| format!("{table} record: {error}");
    let event = match NotificationSource::from_table(table) {
        Some(NotificationSource::Report) => ChangeEvent::Notification(
            serde_json::from_value::<ReportNotificationRow>(record)
                .map_err(decode)?
                .into(),
        ),
        Some(NotificationSource::Patient) => ChangeEvent::Notification(
            serde_json::from_value::<PatientNotificationRow>(record)
                .map_err(decode)?
                .into(),
        ),
        None if table == super::feeds::EMAIL_TABLE => ChangeEvent::Email(
            serde_json::from_value::<EmailRow>(record)
                .map_err(decode)?
                .into(),
        ),
        None => return Ok(None),
    };
    Ok(Some(event))
}
