//! Builders wiring domain services over a chosen backend.
//!
//! Every service is generic over the driven ports, so one builder serves
//! both the gateway adapters and the in-memory backend.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use url::Url;

use clinic_console::domain::ports::{
    ArchiveRepository, AvatarStorage, ChangeSink, ChangeStream, DirectoryRepository,
    EmailRepository, NotificationRepository, ReportRepository, UserRepository,
};
use clinic_console::domain::{
    ArchiveService, AuthService, DirectoryService, FeedService, ReportsService, SettingsService,
};
use clinic_console::inbound::http::state::HttpState;
use clinic_console::inbound::ws::state::WsState;
use clinic_console::outbound::gateway::{
    GatewayArchiveRepository, GatewayAvatarStorage, GatewayDirectoryRepository,
    GatewayEmailRepository, GatewayNotificationRepository, GatewayReportRepository,
    GatewayUserRepository, RestGateway,
};
use clinic_console::outbound::memory::InMemoryBackend;
use clinic_console::outbound::realtime::ChangeHub;

use super::{BackendChoice, ServerConfig};

/// Driven-port implementations the services are built over.
struct Repositories<U, N, E, D, A, R, S> {
    users: Arc<U>,
    notifications: Arc<N>,
    emails: Arc<E>,
    directory: Arc<D>,
    archive: Arc<A>,
    reports: Arc<R>,
    avatars: Arc<S>,
}

impl Repositories<
    GatewayUserRepository,
    GatewayNotificationRepository,
    GatewayEmailRepository,
    GatewayDirectoryRepository,
    GatewayArchiveRepository,
    GatewayReportRepository,
    GatewayAvatarStorage,
> {
    fn gateway(gateway: &RestGateway) -> Self {
        Self {
            users: Arc::new(GatewayUserRepository::new(gateway.clone())),
            notifications: Arc::new(GatewayNotificationRepository::new(gateway.clone())),
            emails: Arc::new(GatewayEmailRepository::new(gateway.clone())),
            directory: Arc::new(GatewayDirectoryRepository::new(gateway.clone())),
            archive: Arc::new(GatewayArchiveRepository::new(gateway.clone())),
            reports: Arc::new(GatewayReportRepository::new(gateway.clone())),
            avatars: Arc::new(GatewayAvatarStorage::new(gateway.clone())),
        }
    }
}

impl
    Repositories<
        InMemoryBackend,
        InMemoryBackend,
        InMemoryBackend,
        InMemoryBackend,
        InMemoryBackend,
        InMemoryBackend,
        InMemoryBackend,
    >
{
    fn memory(backend: &Arc<InMemoryBackend>) -> Self {
        Self {
            users: backend.clone(),
            notifications: backend.clone(),
            emails: backend.clone(),
            directory: backend.clone(),
            archive: backend.clone(),
            reports: backend.clone(),
            avatars: backend.clone(),
        }
    }
}

/// Inputs shared by every backend choice.
struct Wiring {
    hub: Arc<ChangeHub>,
    clock: Arc<dyn Clock>,
    webhook_secret: Option<Arc<str>>,
    origins: Vec<Url>,
}

fn build_states<U, N, E, D, A, R, S>(
    repos: Repositories<U, N, E, D, A, R, S>,
    wiring: Wiring,
) -> (HttpState, WsState)
where
    U: UserRepository + 'static,
    N: NotificationRepository + 'static,
    E: EmailRepository + 'static,
    D: DirectoryRepository + 'static,
    A: ArchiveRepository + 'static,
    R: ReportRepository + 'static,
    S: AvatarStorage + 'static,
{
    let Wiring {
        hub,
        clock,
        webhook_secret,
        origins,
    } = wiring;
    let stream: Arc<dyn ChangeStream> = hub.clone();
    let sink: Arc<dyn ChangeSink> = hub;

    let auth = Arc::new(AuthService::new(repos.users.clone(), clock.clone()));
    let feeds = Arc::new(FeedService::new(repos.notifications, repos.emails, stream));
    let directory = Arc::new(DirectoryService::new(
        repos.users.clone(),
        repos.directory.clone(),
        clock.clone(),
    ));
    let archive = Arc::new(ArchiveService::new(
        repos.archive.clone(),
        repos.directory.clone(),
        repos.reports.clone(),
    ));
    let reports = Arc::new(ReportsService::new(
        repos.reports,
        repos.archive,
        repos.directory,
        clock,
    ));
    let settings = Arc::new(SettingsService::new(repos.users, repos.avatars));

    let ws_state = WsState::new(feeds.clone(), feeds.clone(), origins);
    let http_state = HttpState {
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
        webhook_secret,
    };
    (http_state, ws_state)
}

/// Build handler state for the configured backend.
pub(super) fn build_states_for(config: &ServerConfig) -> (HttpState, WsState) {
    let wiring = Wiring {
        hub: Arc::new(ChangeHub::new()),
        clock: Arc::new(DefaultClock),
        webhook_secret: config.webhook_secret.clone(),
        origins: config.allowed_origins.clone(),
    };
    match &config.backend {
        BackendChoice::Gateway(gateway) => build_states(Repositories::gateway(gateway), wiring),
        BackendChoice::Memory(backend) => build_states(Repositories::memory(backend), wiring),
    }
}
