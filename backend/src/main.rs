//! Console entry-point: loads settings, picks a backend and serves the API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use clinic_console::inbound::http::health::HealthState;
use clinic_console::inbound::http::session_config::fingerprint::key_fingerprint;
use clinic_console::inbound::http::session_config::{BuildMode, session_settings};
use clinic_console::outbound::gateway::RestGateway;
use clinic_console::settings::ConsoleSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ConsoleSettings::load_from_iter(std::env::args_os())
        .map_err(|e| io::Error::other(format!("failed to load settings: {e}")))?;
    let session = session_settings(&settings, BuildMode::from_debug_assertions())
        .map_err(|e| io::Error::other(e.to_string()))?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let origins = settings.allowed_origins().map_err(io::Error::other)?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_webhook_secret(settings.webhook_secret())
    .with_allowed_origins(origins);

    match settings.gateway_url() {
        Some(raw) => {
            let base = Url::parse(raw)
                .map_err(|e| io::Error::other(format!("invalid gateway url '{raw}': {e}")))?;
            let gateway = RestGateway::new(
                base,
                settings.gateway_api_key(),
                settings.gateway_timeout(),
            )
            .map_err(io::Error::other)?;
            info!(base = %gateway.base(), "using gateway backend");
            config = config.with_gateway(gateway);
        }
        None => warn!("no gateway configured; records live in memory and vanish on exit"),
    }
    if settings.webhook_secret().is_none() {
        warn!("no webhook secret configured; live feed inserts are disabled");
    }

    let health_state = web::Data::new(HealthState::new(config.backend_kind()));
    info!(%bind_addr, "starting clinic console");
    create_server(health_state, config)?.await
}
