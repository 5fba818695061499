//! Row-insert subscriptions.
//!
//! A [`Subscription`] is the receiving end of a single update queue. The
//! owning task drains it sequentially, so feed state never needs a lock.
//! Dropping or releasing the subscription unregisters it from the source.

use std::fmt;

use tokio::sync::mpsc;

use super::define_port_error;
use crate::domain::{ChangeEvent, UserId};

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Standing subscription to inserts on the feed tables.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    release: Option<ReleaseHook>,
}

impl Subscription {
    /// Wrap a receiver with the hook that unregisters it.
    pub fn new<F>(receiver: mpsc::UnboundedReceiver<ChangeEvent>, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that never yields, for callers without a live source.
    pub fn closed() -> Self {
        let (_, receiver) = mpsc::unbounded_channel();
        Self {
            receiver,
            release: None,
        }
    }

    /// Wait for the next event. `None` once the source has gone away.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Unregister now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        self.receiver.close();
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish_non_exhaustive()
    }
}

/// Source of insert events for the notification and inbox tables.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeStream: Send + Sync {
    /// Open a subscription covering both notification tables and the inbox.
    fn subscribe(&self) -> Subscription;
}

define_port_error! {
    /// Errors raised while accepting a relayed row.
    pub enum ChangeSinkError {
        /// The row does not match the table's shape.
        Decode { message: String } => "change record could not be decoded: {message}",
    }
}

/// Sink the inbound webhook relays inserted rows into.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeSink: Send + Sync {
    /// Decode a row inserted into `table` and fan it out to every live
    /// subscription. Returns how many subscriptions received it, or `None`
    /// when `table` is not a feed table.
    fn publish_insert(
        &self,
        table: &str,
        record: serde_json::Value,
    ) -> Result<Option<usize>, ChangeSinkError>;

    /// Tell live subscriptions that `user_id` now signs in under another
    /// email. Returns how many subscriptions were told.
    fn publish_account_email_change(&self, user_id: &UserId) -> usize;
}
