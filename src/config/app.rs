use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::document::GlobalConfig;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid PORT value '{0}'")]
    InvalidPort(String),

    #[error("Cannot resolve listen address {host}:{port}: {source}")]
    UnresolvableHost {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Listen address {host}:{port} resolved to nothing")]
    NoAddress { host: String, port: u16 },
}

/// Process settings read from the environment
///
/// `HOST` and `PORT` override the document's `global` section when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub hot_reload: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SettingsError> {
        let config_path = env::var("CONFIG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let port = match env::var("PORT") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| SettingsError::InvalidPort(raw.clone()))?,
            ),
            _ => None,
        };

        Ok(Self {
            config_path: PathBuf::from(config_path),
            host: env::var("HOST").ok().filter(|h| !h.trim().is_empty()),
            port,
            hot_reload: env::var("HOT_RELOAD")
                .map(|value| !matches!(value.as_str(), "0" | "false" | "FALSE" | "False"))
                .unwrap_or(true),
        })
    }

    /// Resolves the socket address to bind, preferring environment overrides
    ///
    /// `host` may be an IP literal or a hostname such as `localhost`; the
    /// first resolved address is used.
    pub async fn listen_addr(&self, global: &GlobalConfig) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(&global.host);
        let port = self.port.unwrap_or(global.port);

        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| SettingsError::UnresolvableHost {
                host: host.to_string(),
                port,
                source,
            })?;

        addrs.next().ok_or_else(|| SettingsError::NoAddress {
            host: host.to_string(),
            port,
        })
    }
}
