//! Connection configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";
/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable holding the server host.
pub const HOST_ENV: &str = "EDITOR_BRIDGE_HOST";
/// Environment variable holding the server port.
pub const PORT_ENV: &str = "EDITOR_BRIDGE_PORT";

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Server host is empty")]
    EmptyHost,
    #[error("Server port must be non-zero")]
    ZeroPort,
    #[error("Invalid server port: {0}")]
    InvalidPort(String),
}

/// Where the session server lives.
///
/// The host re-reads this on every configuration change and hands the fresh
/// value to the connection manager, which compares it with the one it last
/// connected with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build a configuration from a key lookup, falling back to defaults for
    /// missing keys.
    ///
    /// # Errors
    /// Returns error if the port is not a valid number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV)
            .map(|h| h.trim().to_string())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let config = Self { host, port };
        config.validate()?;
        Ok(config)
    }

    /// Read `EDITOR_BRIDGE_HOST` / `EDITOR_BRIDGE_PORT`.
    ///
    /// # Errors
    /// Returns error if the values are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Check that the configuration can be used to connect.
    ///
    /// # Errors
    /// Returns error on an empty host or a zero port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        Ok(())
    }

    /// `host:port`.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
