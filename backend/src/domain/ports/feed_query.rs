//! Driving port for reading the notification and inbox feeds.

use async_trait::async_trait;

use super::Subscription;
use crate::domain::{Email, EmailFeed, NotificationFeed};

/// Loads feeds and opens live subscriptions.
///
/// Loading never fails: backend errors are logged and the affected source
/// contributes nothing, so callers always receive a usable, possibly
/// partial, feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedQuery: Send + Sync {
    /// Merged report and patient notifications, newest first.
    async fn load_notifications(&self) -> NotificationFeed;

    /// Inbox for `recipient`, newest first.
    async fn load_inbox(&self, recipient: &Email) -> EmailFeed;

    /// Open a standing subscription to inserts on every feed table.
    fn subscribe(&self) -> Subscription;
}
