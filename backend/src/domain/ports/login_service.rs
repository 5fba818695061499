//! Driving port for administrator authentication.
//!
//! Inbound adapters call it to turn submitted credentials into an
//! [`AdminSession`] without knowing how accounts are stored, which keeps
//! HTTP handler tests free of persistence wiring.

use async_trait::async_trait;

use crate::domain::{AdminSession, Error, LoginCredentials};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and open a session for an administrator.
    ///
    /// # Errors
    ///
    /// - `unauthorized` for an unknown email or a wrong password; the two are
    ///   indistinguishable.
    /// - `forbidden` when the account is not an administrator.
    /// - `service_unavailable` or `internal_error` for backend failures.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<AdminSession, Error>;
}
