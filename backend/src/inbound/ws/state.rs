//! Shared WebSocket adapter state.
//!
//! The feed socket depends on the feed ports only, so tests can run it over
//! the in-memory backend and a local change hub.

use std::sync::Arc;

use url::Url;

use crate::domain::ports::{FeedCommand, FeedQuery};

/// Dependency bundle for the `/ws/feed` endpoint.
#[derive(Clone)]
pub struct WsState {
    pub feeds: Arc<dyn FeedQuery>,
    pub feed_commands: Arc<dyn FeedCommand>,
    /// Browser origins allowed to open a socket.
    pub origins: Arc<[Url]>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        feeds: Arc<dyn FeedQuery>,
        feed_commands: Arc<dyn FeedCommand>,
        origins: impl Into<Arc<[Url]>>,
    ) -> Self {
        Self {
            feeds,
            feed_commands,
            origins: origins.into(),
        }
    }
}
