//! Driving port for feed mutations.
//!
//! Each operation writes to the backend only. Callers holding local feed
//! state apply the change after a successful return and leave it untouched
//! on error.

use async_trait::async_trait;

use crate::domain::{Error, NotificationKey};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedCommand: Send + Sync {
    /// Persist the read flag of a notification.
    async fn mark_notification_read(&self, key: NotificationKey) -> Result<(), Error>;

    /// Delete a notification.
    async fn delete_notification(&self, key: NotificationKey) -> Result<(), Error>;

    /// Persist the read flag of an inbox message.
    async fn mark_email_read(&self, id: i64) -> Result<(), Error>;

    /// Delete an inbox message.
    async fn delete_email(&self, id: i64) -> Result<(), Error>;
}
