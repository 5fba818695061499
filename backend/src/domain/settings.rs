//! Administrator profile settings and avatar handling.

use serde::Serialize;

use super::auth::{PasswordChangeError, confirmed_password};
use super::credentials::Password;
use super::directory::PersonName;
use super::user::{Email, UserId, UserValidationError};

/// Storage bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "profile_pictures";

/// Extensions probed, in order, when looking up an existing avatar.
pub const AVATAR_PROBE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "JPG"];

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarFormat {
    Jpg,
    Jpeg,
    Png,
}

impl AvatarFormat {
    /// Parse a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Result<Self, SettingsValidationError> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" => Ok(Self::Jpg),
            "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(SettingsValidationError::UnsupportedImage),
        }
    }

    /// Extension used in the object path.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// MIME type sent with the upload.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Object path of an avatar inside [`AVATAR_BUCKET`].
///
/// # Examples
/// ```
/// use clinic_console::domain::{avatar_path, UserId};
///
/// let id = UserId::new("17").expect("id");
/// assert_eq!(avatar_path(&id, "png"), "avatars/17.png");
/// ```
pub fn avatar_path(user_id: &UserId, extension: &str) -> String {
    format!("avatars/{user_id}.{extension}")
}

/// Profile form problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsValidationError {
    /// First name missing.
    #[error("first name must not be empty")]
    EmptyFirstName,
    /// Last name missing.
    #[error("last name must not be empty")]
    EmptyLastName,
    /// Username missing.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Email missing or malformed.
    #[error("{0}")]
    Email(UserValidationError),
    /// New password not confirmed.
    #[error("{0}")]
    Password(PasswordChangeError),
    /// Avatar is not jpg, jpeg or png.
    #[error("only jpg, jpeg and png images are supported")]
    UnsupportedImage,
    /// Avatar upload was empty.
    #[error("image must not be empty")]
    EmptyImage,
}

impl SettingsValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "firstName",
            Self::EmptyLastName => "lastName",
            Self::EmptyUsername => "username",
            Self::Email(_) => "email",
            Self::Password(_) => "password",
            Self::UnsupportedImage | Self::EmptyImage => "avatar",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "empty_first_name",
            Self::EmptyLastName => "empty_last_name",
            Self::EmptyUsername => "empty_username",
            Self::Email(UserValidationError::EmptyEmail) => "empty_email",
            Self::Email(_) => "invalid_email",
            Self::Password(err) => err.code(),
            Self::UnsupportedImage => "unsupported_image",
            Self::EmptyImage => "empty_image",
        }
    }
}

/// Raw profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: PersonName,
    pub username: String,
    pub email: Email,
    pub new_password: Option<Password>,
}

impl ProfileUpdate {
    /// Validate a profile form. A blank password leaves the credential
    /// unchanged.
    pub fn try_from_form(form: ProfileForm) -> Result<Self, SettingsValidationError> {
        if form.first_name.trim().is_empty() {
            return Err(SettingsValidationError::EmptyFirstName);
        }
        if form.last_name.trim().is_empty() {
            return Err(SettingsValidationError::EmptyLastName);
        }
        let username = form.username.trim();
        if username.is_empty() {
            return Err(SettingsValidationError::EmptyUsername);
        }
        let email = Email::new(form.email).map_err(SettingsValidationError::Email)?;
        let new_password = match form.password.filter(|value| !value.is_empty()) {
            Some(password) => Some(
                confirmed_password(&password, form.confirm_password.as_deref().unwrap_or_default())
                    .map_err(SettingsValidationError::Password)?,
            ),
            None => None,
        };
        Ok(Self {
            name: PersonName::new(&form.first_name, form.middle_name.as_deref(), &form.last_name),
            username: username.to_owned(),
            email,
            new_password,
        })
    }
}

/// Profile shown on the settings page and in the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub name: PersonName,
    pub email: Email,
    pub display_name: String,
    pub avatar_url: Option<String>,
}
