//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use url::Url;

use clinic_console::inbound::http::health::BackendKind;
use clinic_console::outbound::gateway::RestGateway;
use clinic_console::outbound::memory::InMemoryBackend;

/// Where the console reads and writes its records.
pub enum BackendChoice {
    /// Hosted REST gateway.
    Gateway(RestGateway),
    /// Process-local store, for development.
    Memory(Arc<InMemoryBackend>),
}

impl BackendChoice {
    /// Kind reported by the health probes.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Gateway(_) => BackendKind::Gateway,
            Self::Memory(_) => BackendKind::Memory,
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) backend: BackendChoice,
    pub(crate) webhook_secret: Option<Arc<str>>,
    pub(crate) allowed_origins: Vec<Url>,
}

impl ServerConfig {
    /// Construct a configuration backed by a fresh in-memory store.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            backend: BackendChoice::Memory(Arc::new(InMemoryBackend::new())),
            webhook_secret: None,
            allowed_origins: Vec::new(),
        }
    }

    /// Read and write records through the hosted gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: RestGateway) -> Self {
        self.backend = BackendChoice::Gateway(gateway);
        self
    }

    /// Accept change webhooks presenting `secret`.
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: Option<&str>) -> Self {
        self.webhook_secret = secret.map(Arc::from);
        self
    }

    /// Origins allowed to open the feed socket.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<Url>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Backend the server will be wired to.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }
}
