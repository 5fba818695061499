//! Ordered in-memory feed with an unread counter.
//!
//! ## Invariants
//! - Items are ordered by `created_at`, newest first.
//! - `unread_count` equals the number of unread items; it never underflows.
//! - Every mutation is keyed by item identity and is a no-op for unknown
//!   keys, so replays and races between local actions and inbound events
//!   are harmless.

use serde::Serialize;

use super::item::{EmailMessage, FeedEntry, NotificationItem};
use crate::domain::user::Email;

/// What [`Feed::apply_insert`] did with an inbound item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The item was newest and went to the front.
    Prepended,
    /// The item arrived out of order and was placed at its sorted position.
    Placed(usize),
    /// An item with the same key is already present.
    Duplicate,
}

/// Newest-first list of feed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed<T> {
    items: Vec<T>,
    unread_count: usize,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            unread_count: 0,
        }
    }
}

impl<T: FeedEntry> Feed<T> {
    /// Merge per-source result sets into one newest-first feed.
    ///
    /// The sort is stable: items sharing a timestamp keep the order of the
    /// sources as passed, then their order within each source.
    pub fn merge<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Vec<T>>,
    {
        let mut items: Vec<T> = sources.into_iter().flatten().collect();
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        let unread_count = items.iter().filter(|item| !item.is_read()).count();
        Self {
            items,
            unread_count,
        }
    }

    /// Items, newest first.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of unread items.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the feed holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look an item up by key.
    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Incorporate an inserted item.
    ///
    /// Inserts normally arrive newest-first and are prepended. Delivery is
    /// not guaranteed to be monotonic, so an older item is placed at its
    /// sorted position instead.
    pub fn apply_insert(&mut self, item: T) -> InsertOutcome {
        if self.get(item.key()).is_some() {
            return InsertOutcome::Duplicate;
        }
        let unread = !item.is_read();
        let created_at = item.created_at();
        let outcome = match self.items.first() {
            Some(head) if created_at < head.created_at() => {
                let index = self
                    .items
                    .partition_point(|existing| existing.created_at() >= created_at);
                self.items.insert(index, item);
                InsertOutcome::Placed(index)
            }
            _ => {
                self.items.insert(0, item);
                InsertOutcome::Prepended
            }
        };
        if unread {
            self.unread_count += 1;
        }
        outcome
    }

    /// Mark an item read. Returns `true` when an unread item changed state.
    pub fn mark_read(&mut self, key: T::Key) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.key() == key) else {
            return false;
        };
        if item.is_read() {
            return false;
        }
        item.mark_read();
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    /// Remove an item. Returns it when present.
    pub fn remove(&mut self, key: T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == key)?;
        let removed = self.items.remove(index);
        if !removed.is_read() {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        Some(removed)
    }
}

/// Merged feed of report and patient notifications.
pub type NotificationFeed = Feed<NotificationItem>;

/// Inbox feed scoped to one administrator's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailFeed {
    #[serde(skip)]
    recipient: Email,
    #[serde(flatten)]
    feed: Feed<EmailMessage>,
}

impl EmailFeed {
    /// Build the inbox from a query result, dropping rows for other
    /// recipients.
    pub fn load(recipient: Email, messages: Vec<EmailMessage>) -> Self {
        let own: Vec<EmailMessage> = messages
            .into_iter()
            .filter(|message| message.is_addressed_to(&recipient))
            .collect();
        Self {
            recipient,
            feed: Feed::merge([own]),
        }
    }

    /// Empty inbox for `recipient`.
    pub fn empty(recipient: Email) -> Self {
        Self {
            recipient,
            feed: Feed::default(),
        }
    }

    /// Address the inbox belongs to.
    pub fn recipient(&self) -> &Email {
        &self.recipient
    }

    /// Underlying feed.
    pub fn feed(&self) -> &Feed<EmailMessage> {
        &self.feed
    }

    /// Incorporate an inserted message after re-checking the recipient.
    /// Returns `None` when the message belongs to someone else.
    pub fn apply_insert(&mut self, message: EmailMessage) -> Option<InsertOutcome> {
        if !message.is_addressed_to(&self.recipient) {
            return None;
        }
        Some(self.feed.apply_insert(message))
    }

    /// See [`Feed::mark_read`].
    pub fn mark_read(&mut self, id: i64) -> bool {
        self.feed.mark_read(id)
    }

    /// See [`Feed::remove`].
    pub fn remove(&mut self, id: i64) -> Option<EmailMessage> {
        self.feed.remove(id)
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
