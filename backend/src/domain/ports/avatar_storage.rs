//! Port for the blob store holding profile pictures.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum AvatarStorageError {
        /// Storage could not be reached.
        Connection { message: String } => "avatar storage connection failed: {message}",
        /// Storage rejected the request.
        Rejected { message: String } => "avatar storage rejected the request: {message}",
    }
}

/// Object storage scoped to the avatar bucket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Upload `bytes` to `path`, replacing any existing object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AvatarStorageError>;

    /// Whether an object exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, AvatarStorageError>;

    /// Public URL of the object at `path`.
    fn public_url(&self, path: &str) -> String;
}
