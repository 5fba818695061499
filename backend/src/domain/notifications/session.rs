//! Per-connection feed state.
//!
//! A [`FeedSession`] owns one notification feed, one inbox and one
//! subscription. Its owner drains a single queue of client actions and
//! change events through `&mut self`, so local state is mutated by one task
//! only and every mutation is keyed by item identity.

use std::sync::Arc;

use futures_util::future::join;
use tracing::debug;

use super::feed::{EmailFeed, InsertOutcome, NotificationFeed};
use super::item::{ChangeEvent, EmailMessage, NotificationItem, NotificationKey};
use crate::domain::ports::{FeedCommand, FeedQuery, Subscription};
use crate::domain::{Email, Error};

/// Action requested by the connected administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAction {
    MarkNotificationRead(NotificationKey),
    DeleteNotification(NotificationKey),
    MarkEmailRead(i64),
    DeleteEmail(i64),
}

/// Local change to report to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    NotificationAdded(NotificationItem),
    EmailAdded(EmailMessage),
    NotificationRead(NotificationKey),
    NotificationDeleted(NotificationKey),
    EmailRead(i64),
    EmailDeleted(i64),
}

/// Live feed bound to one administrator.
pub struct FeedSession {
    notifications: NotificationFeed,
    inbox: EmailFeed,
    subscription: Option<Subscription>,
    commands: Arc<dyn FeedCommand>,
}

impl FeedSession {
    /// Subscribe, then load both feeds.
    ///
    /// Subscribing first means an insert landing during the load is either
    /// in the query result or queued; duplicates are ignored on arrival.
    pub async fn open(
        query: &dyn FeedQuery,
        commands: Arc<dyn FeedCommand>,
        recipient: Email,
    ) -> Self {
        let subscription = query.subscribe();
        let (notifications, inbox) =
            join(query.load_notifications(), query.load_inbox(&recipient)).await;
        Self {
            notifications,
            inbox,
            subscription: Some(subscription),
            commands,
        }
    }

    /// Current notification feed.
    pub fn notifications(&self) -> &NotificationFeed {
        &self.notifications
    }

    /// Current inbox.
    pub fn inbox(&self) -> &EmailFeed {
        &self.inbox
    }

    /// Next change event. Returns `None` once the source is gone or the
    /// session has been closed; callers keep serving client actions.
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.recv().await,
            None => None,
        }
    }

    /// Incorporate an inserted row. Emails for other recipients and items
    /// already present produce no update.
    pub fn apply_change(&mut self, event: ChangeEvent) -> Option<FeedUpdate> {
        match event {
            ChangeEvent::Notification(item) => {
                match self.notifications.apply_insert(item.clone()) {
                    InsertOutcome::Duplicate => None,
                    InsertOutcome::Prepended | InsertOutcome::Placed(_) => {
                        Some(FeedUpdate::NotificationAdded(item))
                    }
                }
            }
            ChangeEvent::Email(message) => match self.inbox.apply_insert(message.clone()) {
                Some(InsertOutcome::Prepended | InsertOutcome::Placed(_)) => {
                    Some(FeedUpdate::EmailAdded(message))
                }
                Some(InsertOutcome::Duplicate) => None,
                None => {
                    debug!(email_id = message.id, "ignored inbox insert for another recipient");
                    None
                }
            },
            ChangeEvent::AccountEmailChanged(_) => None,
        }
    }

    /// Persist an action, then apply it locally.
    ///
    /// On error the local feeds are untouched. On success an update is
    /// returned only when local state changed, so replays are silent.
    pub async fn perform(&mut self, action: FeedAction) -> Result<Option<FeedUpdate>, Error> {
        let update = match action {
            FeedAction::MarkNotificationRead(key) => {
                self.commands.mark_notification_read(key).await?;
                self.notifications
                    .mark_read(key)
                    .then_some(FeedUpdate::NotificationRead(key))
            }
            FeedAction::DeleteNotification(key) => {
                self.commands.delete_notification(key).await?;
                self.notifications
                    .remove(key)
                    .map(|_| FeedUpdate::NotificationDeleted(key))
            }
            FeedAction::MarkEmailRead(id) => {
                self.commands.mark_email_read(id).await?;
                self.inbox.mark_read(id).then_some(FeedUpdate::EmailRead(id))
            }
            FeedAction::DeleteEmail(id) => {
                self.commands.delete_email(id).await?;
                self.inbox.remove(id).map(|_| FeedUpdate::EmailDeleted(id))
            }
        };
        Ok(update)
    }

    /// Release the subscription. Further calls to
    /// [`FeedSession::next_change`] return `None`.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
