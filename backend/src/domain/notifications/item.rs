//! Feed items: notifications from two sources and admin inbox messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::{Email, UserId};

/// Table a notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSource {
    /// System and report related events (`notifications_report`).
    Report,
    /// Patient assignment events (`notifications_patient_admin`).
    Patient,
}

impl NotificationSource {
    /// Backing table name.
    pub const fn table(self) -> &'static str {
        match self {
            Self::Report => "notifications_report",
            Self::Patient => "notifications_patient_admin",
        }
    }

    /// Resolve a table name to its source.
    pub fn from_table(table: &str) -> Option<Self> {
        match table {
            "notifications_report" => Some(Self::Report),
            "notifications_patient_admin" => Some(Self::Patient),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Report => "report",
            Self::Patient => "patient",
        })
    }
}

impl std::str::FromStr for NotificationSource {
    type Err = UnknownNotificationSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(Self::Report),
            "patient" => Ok(Self::Patient),
            other => Err(UnknownNotificationSource(other.to_owned())),
        }
    }
}

/// Raised when a source tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification source: {0}")]
pub struct UnknownNotificationSource(pub String);

/// Identity of a notification across both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationKey {
    pub source: NotificationSource,
    pub id: i64,
}

impl NotificationKey {
    /// Build a key.
    pub const fn new(source: NotificationSource, id: i64) -> Self {
        Self { source, id }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.id)
    }
}

/// Report related notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportNotification {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Patient assignment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientNotification {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub patient_id: Option<i64>,
}

/// Notification tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NotificationItem {
    Report(ReportNotification),
    Patient(PatientNotification),
}

impl NotificationItem {
    /// Source table of the item.
    pub const fn source(&self) -> NotificationSource {
        match self {
            Self::Report(_) => NotificationSource::Report,
            Self::Patient(_) => NotificationSource::Patient,
        }
    }

    /// Row identifier within the source table.
    pub const fn id(&self) -> i64 {
        match self {
            Self::Report(item) => item.id,
            Self::Patient(item) => item.id,
        }
    }

    /// Message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Report(item) => &item.message,
            Self::Patient(item) => &item.message,
        }
    }

    /// Linked patient, for patient-assignment items.
    pub const fn patient_id(&self) -> Option<i64> {
        match self {
            Self::Report(_) => None,
            Self::Patient(item) => item.patient_id,
        }
    }

    fn read_flag_mut(&mut self) -> &mut bool {
        match self {
            Self::Report(item) => &mut item.is_read,
            Self::Patient(item) => &mut item.is_read,
        }
    }
}

/// Inbox message addressed to one administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub id: i64,
    pub recipient_email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl EmailMessage {
    /// Whether the message is addressed to `recipient`.
    pub fn is_addressed_to(&self, recipient: &Email) -> bool {
        recipient.matches(&self.recipient_email)
    }
}

/// Behaviour shared by everything a [`super::Feed`] can hold.
pub trait FeedEntry {
    /// Identity used for idempotent updates.
    type Key: Copy + Eq + fmt::Debug;

    /// Identity of this entry.
    fn key(&self) -> Self::Key;
    /// Creation timestamp used for ordering.
    fn created_at(&self) -> DateTime<Utc>;
    /// Whether the entry has been read.
    fn is_read(&self) -> bool;
    /// Flip the entry to read.
    fn mark_read(&mut self);
}

impl FeedEntry for NotificationItem {
    type Key = NotificationKey;

    fn key(&self) -> Self::Key {
        NotificationKey::new(self.source(), self.id())
    }

    fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Report(item) => item.created_at,
            Self::Patient(item) => item.created_at,
        }
    }

    fn is_read(&self) -> bool {
        match self {
            Self::Report(item) => item.is_read,
            Self::Patient(item) => item.is_read,
        }
    }

    fn mark_read(&mut self) {
        *self.read_flag_mut() = true;
    }
}

impl FeedEntry for EmailMessage {
    type Key = i64;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_read(&self) -> bool {
        self.is_read
    }

    fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// Row insert relayed from the backend change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A notification row was inserted.
    Notification(NotificationItem),
    /// An inbox row was inserted.
    Email(EmailMessage),
    /// The account's login email changed, so feeds opened under the old
    /// address are stale.
    AccountEmailChanged(UserId),
}
