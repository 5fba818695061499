//! Notification and inbox feeds.
//!
//! - `item`: feed entries tagged by source.
//! - `feed`: ordered lists with an unread counter.
//! - `service`: loading and persistence through the feed ports.
//! - `session`: live per-connection state fed by one update queue.

mod feed;
mod item;
mod service;
mod session;

pub use feed::{EmailFeed, Feed, InsertOutcome, NotificationFeed};
pub use item::{
    ChangeEvent, EmailMessage, FeedEntry, NotificationItem, NotificationKey, NotificationSource,
    PatientNotification, ReportNotification, UnknownNotificationSource,
};
pub use service::FeedService;
pub use session::{FeedAction, FeedSession, FeedUpdate};
