//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Email, PasswordHash, Role, StoredCredential, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// Account row together with its raw credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub account: UserAccount,
    pub credential: StoredCredential,
}

/// Account to insert. Only a hash is ever accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub full_name: String,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Profile fields written from the settings page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub username: String,
    pub full_name: String,
    pub email: Email,
    pub password_hash: Option<PasswordHash>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch an account and its credential by exact email.
    async fn find_by_email(&self, email: &str)
    -> Result<Option<StoredAccount>, UserPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Whether another account already uses `email` or `username`.
    ///
    /// `except` excludes the caller's own row when editing a profile.
    async fn is_taken(
        &self,
        email: &Email,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserPersistenceError>;

    /// Insert an account and return the stored row.
    async fn insert(&self, account: &NewAccount) -> Result<UserAccount, UserPersistenceError>;

    /// Overwrite the stored credential with a hash.
    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError>;

    /// Apply a profile update, returning the new row when it exists.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &AccountUpdate,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Every account identifier with its raw credential.
    async fn credentials(&self) -> Result<Vec<(UserId, StoredCredential)>, UserPersistenceError>;
}
