//! Re-hash every legacy plaintext credential held by the gateway.
//!
//! Gateway settings are read the same way as the server's (`CLINIC_*`
//! environment variables or the config file).
//!
//! # Examples
//! ```sh
//! CLINIC_GATEWAY_URL=https://db.example/ CLINIC_GATEWAY_API_KEY=... \
//!     cargo run --bin migrate-passwords -- --dry-run
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use clinic_console::domain::{CredentialMigrationService, MigrationMode};
use clinic_console::outbound::gateway::{GatewayUserRepository, RestGateway};
use clinic_console::settings::ConsoleSettings;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

/// `migrate-passwords` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migrate-passwords",
    about = "Hash legacy plaintext passwords in one pass",
    version
)]
struct CliArgs {
    /// Count legacy credentials without rewriting them.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|error| eyre!("tracing init failed: {error}"))?;

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let settings = ConsoleSettings::load_from_iter([OsString::from("migrate-passwords")])
        .map_err(|error| eyre!("load console settings: {error}"))?;
    let raw_url = settings
        .gateway_url()
        .ok_or_else(|| eyre!("CLINIC_GATEWAY_URL must be set to migrate credentials"))?;
    let base = Url::parse(raw_url).wrap_err_with(|| format!("invalid gateway url '{raw_url}'"))?;
    let gateway = RestGateway::new(
        base,
        settings.gateway_api_key(),
        settings.gateway_timeout(),
    )
    .wrap_err("build gateway client")?;

    let mode = if args.dry_run {
        MigrationMode::DryRun
    } else {
        MigrationMode::Apply
    };
    let service = CredentialMigrationService::new(Arc::new(GatewayUserRepository::new(gateway)));
    let summary = service
        .run(mode)
        .await
        .map_err(|error| eyre!("credential sweep failed: {error}"))?;

    println!("scanned={}", summary.scanned);
    println!("legacy={}", summary.legacy);
    if mode == MigrationMode::Apply {
        println!("migrated={}", summary.migrated);
        println!("failed={}", summary.failed);
    }
    if summary.failed > 0 {
        return Err(eyre!("{} credential(s) could not be migrated", summary.failed));
    }
    Ok(())
}
