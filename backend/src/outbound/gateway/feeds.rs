//! Notification and inbox repositories.

use async_trait::async_trait;

use super::client::{RestGateway, eq, ilike_exact};
use super::rows::{EmailRow, PatientNotificationRow, ReadPatch, ReportNotificationRow};
use crate::domain::ports::{EmailRepository, FeedRepositoryError, NotificationRepository};
use crate::domain::{Email, EmailMessage, NotificationItem, NotificationKey, NotificationSource};

/// Table holding admin inbox messages.
pub const EMAIL_TABLE: &str = "emails_to_admin";

fn newest_first() -> (&'static str, String) {
    ("order", "created_at.desc".to_owned())
}

/// Gateway-backed notification repository covering both source tables.
#[derive(Debug, Clone)]
pub struct GatewayNotificationRepository {
    gateway: RestGateway,
}

impl GatewayNotificationRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl NotificationRepository for GatewayNotificationRepository {
    async fn list(
        &self,
        source: NotificationSource,
    ) -> Result<Vec<NotificationItem>, FeedRepositoryError> {
        let query = [("select", "*".to_owned()), newest_first()];
        let items = match source {
            NotificationSource::Report => self
                .gateway
                .select::<ReportNotificationRow>(source.table(), &query)
                .await?
                .into_iter()
                .map(NotificationItem::from)
                .collect(),
            NotificationSource::Patient => self
                .gateway
                .select::<PatientNotificationRow>(source.table(), &query)
                .await?
                .into_iter()
                .map(NotificationItem::from)
                .collect(),
        };
        Ok(items)
    }

    async fn mark_read(&self, key: NotificationKey) -> Result<(), FeedRepositoryError> {
        let _: Vec<serde_json::Value> = self
            .gateway
            .update(
                key.source.table(),
                &[("id", eq(key.id))],
                &ReadPatch { is_read: true },
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, key: NotificationKey) -> Result<(), FeedRepositoryError> {
        self.gateway
            .delete(key.source.table(), &[("id", eq(key.id))])
            .await?;
        Ok(())
    }
}

/// Gateway-backed inbox repository.
#[derive(Debug, Clone)]
pub struct GatewayEmailRepository {
    gateway: RestGateway,
}

impl GatewayEmailRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl EmailRepository for GatewayEmailRepository {
    async fn list_for(&self, recipient: &Email) -> Result<Vec<EmailMessage>, FeedRepositoryError> {
        let rows: Vec<EmailRow> = self
            .gateway
            .select(
                EMAIL_TABLE,
                &[
                    ("select", "*".to_owned()),
                    ("recipient_email", ilike_exact(recipient.as_str())),
                    newest_first(),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(EmailMessage::from).collect())
    }

    async fn mark_read(&self, id: i64) -> Result<(), FeedRepositoryError> {
        let _: Vec<serde_json::Value> = self
            .gateway
            .update(EMAIL_TABLE, &[("id", eq(id))], &ReadPatch { is_read: true })
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), FeedRepositoryError> {
        self.gateway.delete(EMAIL_TABLE, &[("id", eq(id))]).await?;
        Ok(())
    }
}
