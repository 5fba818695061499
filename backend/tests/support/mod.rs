//! Shared fixtures for integration tests.
//!
//! Integration tests compile as separate crates, so each one pulls this
//! module in with `mod support;` and uses only what it needs.

#![allow(dead_code, reason = "each test crate uses a subset of the helpers")]

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use chrono::{TimeZone, Utc};
use mockable::DefaultClock;
use url::Url;

use clinic_console::domain::ports::{ChangeSink, NewAccount};
use clinic_console::domain::{
    ArchiveService, AuthService, DirectoryService, Email, FeedService, Password, ReportsService,
    Role, SettingsService, hash_password,
};
use clinic_console::inbound::http::state::HttpState;
use clinic_console::inbound::ws::state::WsState;
use clinic_console::outbound::memory::InMemoryBackend;
use clinic_console::outbound::realtime::ChangeHub;

pub const ADMIN_EMAIL: &str = "ada@clinic.test";
pub const ADMIN_PASSWORD: &str = "hunter2";
pub const WEBHOOK_SECRET: &str = "integration-secret";
pub const CONSOLE_ORIGIN: &str = "https://console.clinic.example";

/// Memory-backed console with one seeded administrator.
pub struct Console {
    pub backend: Arc<InMemoryBackend>,
    pub hub: Arc<ChangeHub>,
    pub http: HttpState,
    pub ws: WsState,
}

impl Console {
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let created_at = Utc
            .with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
            .single()
            .expect("fixture timestamp");
        backend
            .seed_account(
                &NewAccount {
                    username: "ada".into(),
                    full_name: "Ada Admin".into(),
                    email: Email::new(ADMIN_EMAIL).expect("fixture email"),
                    password_hash: hash_password(&Password::new(ADMIN_PASSWORD)).expect("hash"),
                    role: Role::Admin,
                    created_at,
                },
                ADMIN_PASSWORD,
            )
            .expect("seed admin");

        let hub = Arc::new(ChangeHub::new());
        let clock = Arc::new(DefaultClock);
        let auth = Arc::new(AuthService::new(backend.clone(), clock.clone()));
        let feeds = Arc::new(FeedService::new(
            backend.clone(),
            backend.clone(),
            hub.clone(),
        ));
        let directory = Arc::new(DirectoryService::new(
            backend.clone(),
            backend.clone(),
            clock.clone(),
        ));
        let archive = Arc::new(ArchiveService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
        ));
        let reports = Arc::new(ReportsService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            clock,
        ));
        let settings = Arc::new(SettingsService::new(backend.clone(), backend.clone()));
        let sink: Arc<dyn ChangeSink> = hub.clone();
        let origin = Url::parse(CONSOLE_ORIGIN).expect("origin literal");

        Self {
            ws: WsState::new(feeds.clone(), feeds.clone(), vec![origin]),
            http: HttpState {
                login: auth.clone(),
                accounts: auth,
                feeds: feeds.clone(),
                feed_commands: feeds,
                directory: directory.clone(),
                directory_commands: directory,
                archive: archive.clone(),
                archive_commands: archive,
                reports: reports.clone(),
                reports_commands: reports,
                profile: settings.clone(),
                profile_commands: settings,
                changes: sink,
                webhook_secret: Some(Arc::from(WEBHOOK_SECRET)),
            },
            backend,
            hub,
        }
    }
}

/// Session middleware for plain HTTP tests sharing `key` across scopes.
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}
