//! Driving port for self-service account flows: sign-up and password reset.

use async_trait::async_trait;

use crate::domain::{Email, Error, Password, SignUpRequest, UserAccount, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a new administrator. `conflict` when the email or username
    /// is already taken.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserAccount, Error>;

    /// Locate the account a reset applies to. `not_found` when no account
    /// uses the address.
    async fn find_reset_target(&self, email: &Email) -> Result<UserId, Error>;

    /// Store a fresh hash of `password` for `user_id`.
    async fn reset_password(&self, user_id: &UserId, password: &Password) -> Result<(), Error>;
}
