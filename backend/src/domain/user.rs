//! User account model shared by administrators, doctors and patients.
//!
//! Account rows live in the `users` table. Identifiers are opaque: the
//! gateway may hand out integers or UUIDs, and both are carried as text.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Validation errors for account primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was blank.
    #[error("user id must not be empty")]
    EmptyId,
    /// The email was blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The email did not look like `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// The username was blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// The role tag was not one of the known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Opaque account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct an identifier.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::UserId;
    ///
    /// let id = UserId::new("42").expect("valid id");
    /// assert_eq!(id.as_ref(), "42");
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Int(value) => value.to_string(),
            RawId::Text(value) => value,
        };
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address, trimmed and shape-checked.
///
/// Comparison through [`Email::matches`] ignores ASCII case; equality keeps
/// the stored spelling because the gateway filters are case sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an email address.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::Email;
    ///
    /// assert!(Email::new(" admin@clinic.test ").is_ok());
    /// assert!(Email::new("admin@clinic").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-insensitive comparison against a raw address.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Console administrator.
    Admin,
    /// Clinic doctor.
    Doctor,
    /// Patient using the mobile app.
    Patient,
}

impl Role {
    /// Stable lowercase tag stored in the `role` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "doctor" => Ok(Self::Doctor),
            "patient" => Ok(Self::Patient),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Login handle derived from a person's name.
///
/// # Examples
/// ```
/// use clinic_console::domain::username_from_name;
///
/// assert_eq!(username_from_name("Maria  Clara Santos"), "mariaclarasantos");
/// ```
pub fn username_from_name(full_name: &str) -> String {
    full_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Persisted account as read back from storage.
///
/// The stored credential is carried separately by the repository so the
/// account can travel freely without exposing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: UserId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Email,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// Name shown in the console header: username, then full name, then
    /// email, then a generic label.
    pub fn display_name(&self) -> String {
        [self.username.as_deref(), self.full_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map_or_else(|| self.email.to_string(), str::to_owned)
    }
}

/// Fallback label when no account details could be loaded.
pub const DEFAULT_DISPLAY_NAME: &str = "Admin";
