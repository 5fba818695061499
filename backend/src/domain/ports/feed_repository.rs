//! Ports for the notification tables and the admin inbox.
use async_trait::async_trait;

use crate::domain::{Email, EmailMessage, NotificationItem, NotificationKey, NotificationSource};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feed adapters.
    pub enum FeedRepositoryError {
        /// Backend could not be reached.
        Connection { message: String } => "feed repository connection failed: {message}",
        /// Backend rejected or failed the request.
        Query { message: String } => "feed repository query failed: {message}",
    }
}

/// Access to `notifications_report` and `notifications_patient_admin`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// All notifications of one source, newest first.
    async fn list(
        &self,
        source: NotificationSource,
    ) -> Result<Vec<NotificationItem>, FeedRepositoryError>;

    /// Set the read flag of one notification.
    async fn mark_read(&self, key: NotificationKey) -> Result<(), FeedRepositoryError>;

    /// Delete one notification. Absent rows are not an error.
    async fn delete(&self, key: NotificationKey) -> Result<(), FeedRepositoryError>;
}

/// Access to `emails_to_admin`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailRepository: Send + Sync {
    /// Messages addressed to `recipient`, newest first.
    async fn list_for(&self, recipient: &Email) -> Result<Vec<EmailMessage>, FeedRepositoryError>;

    /// Set the read flag of one message.
    async fn mark_read(&self, id: i64) -> Result<(), FeedRepositoryError>;

    /// Delete one message. Absent rows are not an error.
    async fn delete(&self, id: i64) -> Result<(), FeedRepositoryError>;
}
