//! Session cookie configuration and validation.
//!
//! Turns the session toggles from [`ConsoleSettings`] into a signing key and
//! cookie attributes. Debug builds tolerate missing or unsafe values with a
//! warning; release builds reject them.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroize;

use crate::settings::ConsoleSettings;

pub mod fingerprint;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
// `Key::derive_from` panics below this length.
const KEY_DERIVE_MIN_LEN: usize = 32;
const COOKIE_SECURE_SETTING: &str = "CLINIC_COOKIE_SECURE";
const SAME_SITE_SETTING: &str = "CLINIC_SAME_SITE";
const ALLOW_EPHEMERAL_SETTING: &str = "CLINIC_ALLOW_EPHEMERAL_SESSION_KEY";
const SAME_SITE_EXPECTED: &str = "strict|lax|none";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use clinic_console::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session cookie settings.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A toggle release builds require was not configured.
    #[error("missing required setting: {name}")]
    MissingSetting { name: &'static str },
    /// A toggle is present but holds an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` needs secure cookies.
    #[error("CLINIC_SAME_SITE=none requires CLINIC_COOKIE_SECURE=true")]
    InsecureSameSiteNone,
    /// Release builds must not fall back to a generated key.
    #[error("CLINIC_ALLOW_EPHEMERAL_SESSION_KEY must be false in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from console settings and build mode.
///
/// # Examples
///
/// ```rust
/// use clinic_console::inbound::http::session_config::{session_settings, BuildMode};
/// use clinic_console::settings::ConsoleSettings;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("clinic_session_key_example");
/// std::fs::write(&key_path, vec![b'a'; 64])?;
///
/// let settings = ConsoleSettings {
///     session_key_file: Some(key_path.clone()),
///     cookie_secure: Some(true),
///     same_site: Some("strict".into()),
///     allow_ephemeral_session_key: Some(false),
///     ..ConsoleSettings::default()
/// };
/// let session = session_settings(&settings, BuildMode::Release)?;
/// assert!(session.cookie_secure);
///
/// std::fs::remove_file(&key_path)?;
/// # Ok(())
/// # }
/// ```
pub fn session_settings(
    settings: &ConsoleSettings,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = cookie_secure(settings.cookie_secure, mode)?;
    let same_site = same_site(settings.same_site.as_deref(), mode, cookie_secure)?;
    let allow_ephemeral = allow_ephemeral(settings.allow_ephemeral_session_key, mode)?;
    let path = settings
        .session_key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));
    let key = session_key(&path, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn debug_warn_or_error<T>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
    warn_fn: impl FnOnce(),
) -> Result<T, SessionConfigError> {
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn cookie_secure(value: Option<bool>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match value {
        Some(flag) => Ok(flag),
        None => debug_warn_or_error(
            mode,
            true,
            SessionConfigError::MissingSetting {
                name: COOKIE_SECURE_SETTING,
            },
            || warn!("{COOKIE_SECURE_SETTING} not set; defaulting to secure"),
        ),
    }
}

fn same_site(
    value: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    let Some(value) = value else {
        return debug_warn_or_error(
            mode,
            default_same_site,
            SessionConfigError::MissingSetting {
                name: SAME_SITE_SETTING,
            },
            || warn!("{SAME_SITE_SETTING} not set; using default"),
        );
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => debug_warn_or_error(
            mode,
            SameSite::None,
            SessionConfigError::InsecureSameSiteNone,
            || warn!("SameSite=None without secure cookies; browsers may reject the session"),
        ),
        _ => debug_warn_or_error(
            mode,
            default_same_site,
            SessionConfigError::InvalidSetting {
                name: SAME_SITE_SETTING,
                value: value.to_owned(),
                expected: SAME_SITE_EXPECTED,
            },
            || warn!(value = %value, "invalid {SAME_SITE_SETTING}, using default"),
        ),
    }
}

fn allow_ephemeral(value: Option<bool>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match value {
        Some(true) if !mode.is_debug() => Err(SessionConfigError::EphemeralNotAllowed),
        Some(flag) => Ok(flag),
        None => debug_warn_or_error(
            mode,
            false,
            SessionConfigError::MissingSetting {
                name: ALLOW_EPHEMERAL_SETTING,
            },
            || warn!("{ALLOW_EPHEMERAL_SETTING} not set; defaulting to disabled"),
        ),
    }
}

fn session_key(path: &Path, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            if length < KEY_DERIVE_MIN_LEN {
                bytes.zeroize();
                warn!(
                    path = %path.display(),
                    length,
                    "session key too short to derive from; using temporary key (dev only)"
                );
                return Ok(Key::generate());
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
