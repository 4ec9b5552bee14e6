//! Broker configuration.
//!
//! Loaded from environment variables with defaults; the CLI may override
//! individual fields afterwards.

use clipshare_core::IceServerConfig;
use clipshare_core::utils::default_ice_servers;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

/// Default WebSocket bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default capacity of the hub command queue.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

#[derive(Clone)]
pub struct ServerConfig {
    /// Address the WebSocket endpoint listens on.
    pub bind_address: SocketAddr,

    /// ICE servers announced to every client in `welcome`.
    pub ice_servers: Vec<IceServerConfig>,

    /// `tracing-subscriber` filter directive (e.g. "info,clipshare_server=debug").
    pub log_filter: String,

    /// Capacity of the hub's command queue.
    pub command_buffer: usize,
}

/// TURN credentials are redacted.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let urls: Vec<&String> = self.ice_servers.iter().flat_map(|s| &s.urls).collect();
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("ice_servers", &urls)
            .field(
                "ice_credentials",
                &self
                    .ice_servers
                    .iter()
                    .any(|s| s.credential.is_some())
                    .then_some("[REDACTED]"),
            )
            .field("log_filter", &self.log_filter)
            .field("command_buffer", &self.command_buffer)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3001)),
            ice_servers: default_ice_servers(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_raw = vars
            .get("CLIPSHARE_BIND_ADDRESS")
            .map(String::as_str)
            .unwrap_or(DEFAULT_BIND_ADDRESS);
        let bind_address = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: "CLIPSHARE_BIND_ADDRESS",
                value: bind_raw.to_string(),
            })?;

        let ice_servers = match vars.get("CLIPSHARE_ICE_SERVERS") {
            Some(raw) => {
                let urls: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect();
                if urls.is_empty() {
                    Vec::new()
                } else {
                    vec![IceServerConfig {
                        urls,
                        username: vars.get("CLIPSHARE_ICE_USERNAME").cloned(),
                        credential: vars.get("CLIPSHARE_ICE_CREDENTIAL").cloned(),
                    }]
                }
            }
            None => default_ice_servers(),
        };

        let log_filter = vars
            .get("CLIPSHARE_LOG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let command_buffer = match vars.get("CLIPSHARE_COMMAND_BUFFER") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: "CLIPSHARE_COMMAND_BUFFER",
                    value: raw.clone(),
                })?,
            None => DEFAULT_COMMAND_BUFFER,
        };

        Ok(Self {
            bind_address,
            ice_servers,
            log_filter,
            command_buffer,
        })
    }
}
