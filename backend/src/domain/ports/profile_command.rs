//! Driving port for settings changes.

use async_trait::async_trait;

use crate::domain::{AdminProfile, AdminSession, AvatarFormat, Error, ProfileUpdate};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileCommand: Send + Sync {
    /// Save profile fields and, when present, a new hashed password.
    /// The returned profile carries the possibly changed email.
    async fn update_profile(
        &self,
        session: &AdminSession,
        update: ProfileUpdate,
    ) -> Result<AdminProfile, Error>;

    /// Upload an avatar and return its public URL.
    async fn upload_avatar(
        &self,
        session: &AdminSession,
        format: AvatarFormat,
        bytes: Vec<u8>,
    ) -> Result<String, Error>;
}
