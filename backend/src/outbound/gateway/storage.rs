//! `AvatarStorage` over the storage API.

use async_trait::async_trait;

use super::client::RestGateway;
use crate::domain::AVATAR_BUCKET;
use crate::domain::ports::{AvatarStorage, AvatarStorageError};

/// Gateway-backed avatar bucket.
#[derive(Debug, Clone)]
pub struct GatewayAvatarStorage {
    gateway: RestGateway,
    bucket: String,
}

impl GatewayAvatarStorage {
    /// Store avatars in the default profile picture bucket.
    pub fn new(gateway: RestGateway) -> Self {
        Self::with_bucket(gateway, AVATAR_BUCKET)
    }

    /// Store avatars in `bucket`.
    pub fn with_bucket(gateway: RestGateway, bucket: impl Into<String>) -> Self {
        Self {
            gateway,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl AvatarStorage for GatewayAvatarStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AvatarStorageError> {
        Ok(self
            .gateway
            .upload_object(&self.bucket, path, bytes, content_type)
            .await?)
    }

    async fn exists(&self, path: &str) -> Result<bool, AvatarStorageError> {
        Ok(self.gateway.object_exists(&self.bucket, path).await?)
    }

    fn public_url(&self, path: &str) -> String {
        self.gateway.public_object_url(&self.bucket, path)
    }
}
