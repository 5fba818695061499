//! Authentication and self-service account flows.
//!
//! Implements [`LoginService`] and [`AccountCommand`]. Login verifies the
//! submitted password against whatever the account row holds: bcrypt hashes
//! are compared in constant time, legacy plaintext values by equality. A
//! legacy match is upgraded in place with exactly one hash write before the
//! session is opened.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{AccountCommand, LoginService, NewAccount, UserPersistenceError, UserRepository};
use crate::domain::{
    AdminSession, CredentialError, Email, Error, LoginCredentials, Password, PasswordHash, Role,
    SignUpRequest, StoredCredential, UserAccount, UserId, Verification, hash_password,
    verify_password,
};

/// Message shared by unknown-email and wrong-password failures.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Hash a password on the blocking pool; bcrypt is deliberately slow.
pub(crate) async fn hash_off_thread(password: Password) -> Result<PasswordHash, Error> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| Error::internal(err.to_string()))
}

async fn verify_off_thread(
    password: Password,
    stored: StoredCredential,
) -> Result<Result<Verification, CredentialError>, Error> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

/// Authentication service backed by a [`UserRepository`].
#[derive(Clone)]
pub struct AuthService<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U> AuthService<U> {
    /// Create a service over `users`.
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

impl<U: UserRepository> AuthService<U> {
    async fn migrate_legacy(&self, user_id: &UserId, password: &Password) {
        let hash = match hash_off_thread(password.clone()).await {
            Ok(hash) => hash,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "could not hash legacy credential");
                return;
            }
        };
        match self.users.update_password(user_id, &hash).await {
            Ok(()) => info!(user_id = %user_id, "legacy credential migrated to bcrypt"),
            Err(err) => warn!(user_id = %user_id, error = %err, "legacy credential rewrite failed"),
        }
    }
}

#[async_trait]
impl<U: UserRepository> LoginService for AuthService<U> {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<AdminSession, Error> {
        let Some(stored) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let account = stored.account;
        let verification =
            match verify_off_thread(credentials.password().clone(), stored.credential).await? {
                Ok(verification) => verification,
                Err(err) => {
                    warn!(user_id = %account.id, error = %err, "stored credential is unreadable");
                    Verification::Rejected
                }
            };

        match verification {
            Verification::Rejected => return Err(Error::unauthorized(INVALID_CREDENTIALS)),
            Verification::VerifiedNeedsRehash => {
                self.migrate_legacy(&account.id, credentials.password()).await;
            }
            Verification::Verified => {}
        }

        if account.role != Role::Admin {
            return Err(Error::forbidden("access denied: only administrators can log in"));
        }
        Ok(AdminSession::init(account.id, account.role, account.email))
    }
}

#[async_trait]
impl<U: UserRepository> AccountCommand for AuthService<U> {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserAccount, Error> {
        let taken = self
            .users
            .is_taken(request.email(), request.username(), None)
            .await
            .map_err(map_user_error)?;
        if taken {
            return Err(Error::conflict("email or username already exists"));
        }
        let password_hash = hash_off_thread(request.password().clone()).await?;
        let account = NewAccount {
            username: request.username().to_owned(),
            full_name: request.full_name().to_owned(),
            email: request.email().clone(),
            password_hash,
            role: Role::Admin,
            created_at: self.clock.utc(),
        };
        let created = self.users.insert(&account).await.map_err(map_user_error)?;
        info!(user_id = %created.id, "administrator account created");
        Ok(created)
    }

    async fn find_reset_target(&self, email: &Email) -> Result<UserId, Error> {
        self.users
            .find_by_email(email.as_str())
            .await
            .map_err(map_user_error)?
            .map(|stored| stored.account.id)
            .ok_or_else(|| Error::not_found("no account uses this email address"))
    }

    async fn reset_password(&self, user_id: &UserId, password: &Password) -> Result<(), Error> {
        if self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .is_none()
        {
            return Err(Error::not_found("account no longer exists"));
        }
        let hash = hash_off_thread(password.clone()).await?;
        self.users
            .update_password(user_id, &hash)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user_id, "password reset");
        Ok(())
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
