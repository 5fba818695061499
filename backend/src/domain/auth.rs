//! Authentication inputs: login, admin sign-up and password reset.
//!
//! Constructors validate raw strings before a handler talks to a service, so
//! the services only ever see well-formed requests.

use super::credentials::Password;
use super::user::{Email, UserValidationError};

/// Login payload problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl LoginValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "email",
            Self::EmptyPassword => "password",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "empty_email",
            Self::EmptyPassword => "empty_password",
        }
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and non-empty. Its shape is not checked: the lookup
///   simply misses for malformed input, which keeps the failure identical to
///   an unknown account.
/// - `password` is non-empty and keeps caller whitespace.
///
/// # Examples
/// ```
/// use clinic_console::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin@clinic.test ", "pw").expect("valid");
/// assert_eq!(creds.email(), "admin@clinic.test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_owned(),
            password: Password::new(password),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Submitted password.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Problems with a new password and its confirmation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordChangeError {
    /// The password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password and confirmation differ.
    #[error("passwords do not match")]
    Mismatch,
}

impl PasswordChangeError {
    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyPassword => "empty_password",
            Self::Mismatch => "password_mismatch",
        }
    }
}

/// Check a new password against its confirmation.
pub fn confirmed_password(password: &str, confirm: &str) -> Result<Password, PasswordChangeError> {
    if password.is_empty() {
        return Err(PasswordChangeError::EmptyPassword);
    }
    if password != confirm {
        return Err(PasswordChangeError::Mismatch);
    }
    Ok(Password::new(password))
}

/// Sign-up payload problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignUpValidationError {
    /// Full name was blank.
    #[error("full name must not be empty")]
    EmptyFullName,
    /// Username was blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Email missing or malformed.
    #[error("{0}")]
    Email(UserValidationError),
    /// Password missing or not confirmed.
    #[error("{0}")]
    Password(PasswordChangeError),
}

impl SignUpValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyFullName => "fullName",
            Self::EmptyUsername => "username",
            Self::Email(_) => "email",
            Self::Password(_) => "password",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyFullName => "empty_full_name",
            Self::EmptyUsername => "empty_username",
            Self::Email(UserValidationError::EmptyEmail) => "empty_email",
            Self::Email(_) => "invalid_email",
            Self::Password(err) => err.code(),
        }
    }
}

/// Raw sign-up inputs.
#[derive(Debug, Clone, Copy)]
pub struct SignUpParts<'a> {
    pub full_name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Validated administrator self-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    full_name: String,
    username: String,
    email: Email,
    password: Password,
}

impl SignUpRequest {
    /// Validate raw inputs.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::{SignUpParts, SignUpRequest};
    ///
    /// let request = SignUpRequest::try_from_parts(SignUpParts {
    ///     full_name: "Ada Admin",
    ///     username: "ada",
    ///     email: "ada@clinic.test",
    ///     password: "pw",
    ///     confirm_password: "pw",
    /// });
    /// assert!(request.is_ok());
    /// ```
    pub fn try_from_parts(parts: SignUpParts<'_>) -> Result<Self, SignUpValidationError> {
        let full_name = parts.full_name.trim();
        if full_name.is_empty() {
            return Err(SignUpValidationError::EmptyFullName);
        }
        let username = parts.username.trim();
        if username.is_empty() {
            return Err(SignUpValidationError::EmptyUsername);
        }
        let email = Email::new(parts.email).map_err(SignUpValidationError::Email)?;
        let password = confirmed_password(parts.password, parts.confirm_password)
            .map_err(SignUpValidationError::Password)?;
        Ok(Self {
            full_name: full_name.to_owned(),
            username: username.to_owned(),
            email,
            password,
        })
    }

    /// Display name for the new account.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Requested username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Requested email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Confirmed password.
    pub fn password(&self) -> &Password {
        &self.password
    }
}
