//! Console configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `CLINIC_*` environment variables and an
//! optional config file, in increasing order of precedence as documented by
//! `ortho_config`. Every field is optional; accessors supply defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Runtime settings for the console backend.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CLINIC")]
pub struct ConsoleSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Base URL of the hosted gateway. When absent the in-memory backend is
    /// used.
    pub gateway_url: Option<String>,
    /// API key sent to the gateway.
    pub gateway_api_key: Option<String>,
    /// Per-request gateway timeout in seconds.
    pub gateway_timeout_secs: Option<u64>,
    /// Shared secret expected on change webhooks.
    pub webhook_secret: Option<String>,
    /// Comma separated list of origins allowed to open the feed socket.
    pub allowed_origins: Option<String>,
    /// File holding the session signing key.
    pub session_key_file: Option<PathBuf>,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for session cookies (`lax`, `strict` or `none`).
    pub same_site: Option<String>,
    /// Permit a generated session key when the key file is unreadable.
    pub allow_ephemeral_session_key: Option<bool>,
}

/// Raised when a configured value cannot be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// An allowed origin is not an absolute URL.
    #[error("invalid allowed origin '{value}': {source}")]
    Origin {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

impl ConsoleSettings {
    /// Bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        match self.bind_addr.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                raw.parse().map_err(|source| SettingsError::BindAddr {
                    value: raw.to_owned(),
                    source,
                })
            }
            _ => Ok(DEFAULT_BIND_ADDR),
        }
    }

    /// Gateway base URL, if one is configured.
    pub fn gateway_url(&self) -> Option<&str> {
        self.gateway_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Gateway API key, empty when unset.
    pub fn gateway_api_key(&self) -> &str {
        self.gateway_api_key.as_deref().unwrap_or_default()
    }

    /// Gateway request timeout.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(
            self.gateway_timeout_secs
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS),
        )
    }

    /// Webhook secret, if one is configured.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .filter(|value| !value.is_empty())
    }

    /// Parsed origin allow-list. Blank entries are skipped.
    pub fn allowed_origins(&self) -> Result<Vec<url::Url>, SettingsError> {
        self.allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_ALLOWED_ORIGIN)
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                url::Url::parse(value).map_err(|source| SettingsError::Origin {
                    value: value.to_owned(),
                    source,
                })
            })
            .collect()
    }
}
