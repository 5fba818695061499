//! Driving port for the signed-in administrator's profile.

use async_trait::async_trait;

use crate::domain::{AdminProfile, AdminSession, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileQuery: Send + Sync {
    /// Profile, display name and avatar URL for the session's account.
    async fn profile(&self, session: &AdminSession) -> Result<AdminProfile, Error>;
}
