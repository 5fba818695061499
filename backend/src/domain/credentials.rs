//! Credential manager: temporary passwords, hashing and hybrid verification.
//!
//! Stored credentials come in two shapes. Modern rows hold a self-describing
//! bcrypt string (`$2b$10$<salt><digest>`). Legacy rows still hold the
//! plaintext password. Verification accepts both; a legacy match tells the
//! caller to re-hash and overwrite the row so the store converges on hashes.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use zeroize::Zeroizing;

/// bcrypt cost factor applied to every new hash.
pub const HASH_COST: u32 = 10;

/// Default length of generated temporary passwords.
pub const TEMPORARY_PASSWORD_LENGTH: usize = 8;

/// Prefixes identifying bcrypt variants we can verify.
pub const KNOWN_HASH_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ALPHANUMERIC_WITH_PUNCTUATION: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()";

/// Symbol set used for temporary passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordAlphabet {
    /// Upper and lower case letters plus digits (62 symbols).
    Alphanumeric,
    /// [`PasswordAlphabet::Alphanumeric`] widened with `!@#$%^&*()`.
    WithPunctuation,
}

impl PasswordAlphabet {
    fn symbols(self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => ALPHANUMERIC,
            Self::WithPunctuation => ALPHANUMERIC_WITH_PUNCTUATION,
        }
    }
}

/// Errors raised by the credential manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The hashing primitive refused the input or failed internally.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
    /// A stored value carried a hash marker but could not be parsed.
    #[error("stored password hash is malformed: {message}")]
    MalformedHash { message: String },
}

/// Plaintext secret that is wiped from memory on drop.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a plaintext secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Self-describing bcrypt hash ready for storage.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The prefix identifies the scheme and cost; the rest stays private.
        let prefix = self.0.get(..7).unwrap_or_default();
        write!(f, "PasswordHash({prefix}...)")
    }
}

impl From<PasswordHash> for String {
    fn from(value: PasswordHash) -> Self {
        value.0
    }
}

/// Credential value as found in the `password` column.
#[derive(Clone, PartialEq, Eq)]
pub enum StoredCredential {
    /// A bcrypt hash carrying one of [`KNOWN_HASH_PREFIXES`].
    Hashed(PasswordHash),
    /// A legacy plaintext value awaiting migration.
    LegacyPlaintext(Password),
}

impl StoredCredential {
    /// Classify a raw column value by its scheme marker.
    ///
    /// # Examples
    /// ```
    /// use clinic_console::domain::StoredCredential;
    ///
    /// assert!(StoredCredential::from_stored("$2b$10$abc").is_hashed());
    /// assert!(!StoredCredential::from_stored("hunter2").is_hashed());
    /// ```
    pub fn from_stored(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if KNOWN_HASH_PREFIXES
            .iter()
            .any(|prefix| raw.starts_with(prefix))
        {
            Self::Hashed(PasswordHash(raw))
        } else {
            Self::LegacyPlaintext(Password::new(raw))
        }
    }

    /// Whether the value is already hashed.
    pub fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashed(hash) => f.debug_tuple("Hashed").field(hash).finish(),
            Self::LegacyPlaintext(_) => f.write_str("LegacyPlaintext(<redacted>)"),
        }
    }
}

/// Outcome of [`verify_password`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The password matched a stored hash.
    Verified,
    /// The password matched a legacy plaintext value; the caller must store
    /// a fresh hash before treating the login as complete.
    VerifiedNeedsRehash,
    /// The password did not match.
    Rejected,
}

impl Verification {
    /// Whether the password was accepted.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Hash a password with bcrypt at [`HASH_COST`].
pub fn hash_password(plaintext: &Password) -> Result<PasswordHash, CredentialError> {
    bcrypt::hash(plaintext.expose(), HASH_COST)
        .map(PasswordHash)
        .map_err(|err| CredentialError::Hashing {
            message: err.to_string(),
        })
}

/// Verify `plaintext` against a stored credential.
///
/// Hashed values go through bcrypt's constant-time comparison. Legacy values
/// are compared directly and report [`Verification::VerifiedNeedsRehash`] on
/// a match.
pub fn verify_password(
    plaintext: &Password,
    stored: &StoredCredential,
) -> Result<Verification, CredentialError> {
    match stored {
        StoredCredential::Hashed(hash) => bcrypt::verify(plaintext.expose(), hash.as_str())
            .map(|ok| {
                if ok {
                    Verification::Verified
                } else {
                    Verification::Rejected
                }
            })
            .map_err(|err| CredentialError::MalformedHash {
                message: err.to_string(),
            }),
        StoredCredential::LegacyPlaintext(legacy) => {
            if legacy.expose() == plaintext.expose() {
                Ok(Verification::VerifiedNeedsRehash)
            } else {
                Ok(Verification::Rejected)
            }
        }
    }
}

/// Generate a temporary password with the thread-local CSPRNG.
///
/// # Examples
/// ```
/// use clinic_console::domain::{generate_temporary_password, PasswordAlphabet};
///
/// let password = generate_temporary_password(8, PasswordAlphabet::Alphanumeric);
/// assert_eq!(password.expose().len(), 8);
/// assert!(password.expose().chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_temporary_password(length: usize, alphabet: PasswordAlphabet) -> Password {
    generate_temporary_password_with(&mut rand::thread_rng(), length, alphabet)
}

/// Generate a temporary password from the supplied random source.
pub fn generate_temporary_password_with<R>(
    rng: &mut R,
    length: usize,
    alphabet: PasswordAlphabet,
) -> Password
where
    R: Rng + ?Sized,
{
    let symbols = alphabet.symbols();
    let value: String = (0..length)
        .filter_map(|_| symbols.choose(rng).copied().map(char::from))
        .collect();
    Password::new(value)
}
