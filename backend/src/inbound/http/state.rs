//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, ArchiveCommand, ArchiveQuery, ChangeSink, DirectoryCommand, DirectoryQuery,
    FeedCommand, FeedQuery, LoginService, ProfileCommand, ProfileQuery, ReportsCommand,
    ReportsQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountCommand>,
    pub feeds: Arc<dyn FeedQuery>,
    pub feed_commands: Arc<dyn FeedCommand>,
    pub directory: Arc<dyn DirectoryQuery>,
    pub directory_commands: Arc<dyn DirectoryCommand>,
    pub archive: Arc<dyn ArchiveQuery>,
    pub archive_commands: Arc<dyn ArchiveCommand>,
    pub reports: Arc<dyn ReportsQuery>,
    pub reports_commands: Arc<dyn ReportsCommand>,
    pub profile: Arc<dyn ProfileQuery>,
    pub profile_commands: Arc<dyn ProfileCommand>,
    /// Receives row inserts announced by the gateway webhook.
    pub changes: Arc<dyn ChangeSink>,
    /// Secret the webhook must present; `None` disables the endpoint.
    pub webhook_secret: Option<Arc<str>>,
}
