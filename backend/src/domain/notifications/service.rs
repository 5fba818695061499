//! Feed service implementing [`FeedQuery`] and [`FeedCommand`].

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join;
use tracing::{debug, warn};

use super::feed::{EmailFeed, Feed, NotificationFeed};
use super::item::{NotificationKey, NotificationSource};
use crate::domain::ports::{
    ChangeStream, EmailRepository, FeedCommand, FeedQuery, FeedRepositoryError,
    NotificationRepository, Subscription,
};
use crate::domain::{Email, Error};

fn map_feed_error(error: FeedRepositoryError) -> Error {
    match error {
        FeedRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("feed backend unavailable: {message}"))
        }
        FeedRepositoryError::Query { message } => {
            Error::internal(format!("feed backend error: {message}"))
        }
    }
}

/// Feed service over the notification and inbox repositories.
#[derive(Clone)]
pub struct FeedService<N, E> {
    notifications: Arc<N>,
    emails: Arc<E>,
    changes: Arc<dyn ChangeStream>,
}

impl<N, E> FeedService<N, E> {
    /// Create a service.
    pub fn new(notifications: Arc<N>, emails: Arc<E>, changes: Arc<dyn ChangeStream>) -> Self {
        Self {
            notifications,
            emails,
            changes,
        }
    }
}

impl<N: NotificationRepository, E: EmailRepository> FeedService<N, E> {
    async fn load_source(&self, source: NotificationSource) -> Vec<super::NotificationItem> {
        match self.notifications.list(source).await {
            Ok(items) => items,
            Err(err) => {
                warn!(source = %source, error = %err, "notification load failed; showing partial feed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<N, E> FeedQuery for FeedService<N, E>
where
    N: NotificationRepository,
    E: EmailRepository,
{
    async fn load_notifications(&self) -> NotificationFeed {
        let (reports, patients) = join(
            self.load_source(NotificationSource::Report),
            self.load_source(NotificationSource::Patient),
        )
        .await;
        Feed::merge([reports, patients])
    }

    async fn load_inbox(&self, recipient: &Email) -> EmailFeed {
        match self.emails.list_for(recipient).await {
            Ok(messages) => EmailFeed::load(recipient.clone(), messages),
            Err(err) => {
                warn!(error = %err, "inbox load failed; showing empty inbox");
                EmailFeed::empty(recipient.clone())
            }
        }
    }

    fn subscribe(&self) -> Subscription {
        self.changes.subscribe()
    }
}

#[async_trait]
impl<N, E> FeedCommand for FeedService<N, E>
where
    N: NotificationRepository,
    E: EmailRepository,
{
    async fn mark_notification_read(&self, key: NotificationKey) -> Result<(), Error> {
        self.notifications.mark_read(key).await.map_err(|err| {
            warn!(%key, error = %err, "mark-read failed");
            map_feed_error(err)
        })?;
        debug!(%key, "notification marked read");
        Ok(())
    }

    async fn delete_notification(&self, key: NotificationKey) -> Result<(), Error> {
        self.notifications.delete(key).await.map_err(|err| {
            warn!(%key, error = %err, "delete failed");
            map_feed_error(err)
        })?;
        debug!(%key, "notification deleted");
        Ok(())
    }

    async fn mark_email_read(&self, id: i64) -> Result<(), Error> {
        self.emails.mark_read(id).await.map_err(|err| {
            warn!(email_id = id, error = %err, "mark-read failed");
            map_feed_error(err)
        })
    }

    async fn delete_email(&self, id: i64) -> Result<(), Error> {
        self.emails.delete(id).await.map_err(|err| {
            warn!(email_id = id, error = %err, "delete failed");
            map_feed_error(err)
        })
    }
}
