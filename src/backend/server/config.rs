/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 *
 * 1. Built-in defaults (`0.0.0.0:3000`, log filter `info`, default allocator)
 * 2. A TOML file named by `TASKBOARD_CONFIG`, if set
 * 3. Environment overrides: `SERVER_HOST`, `SERVER_PORT`, `RUST_LOG`
 *
 * # Example File
 *
 * ```toml
 * host = "127.0.0.1"
 * port = 8080
 * log_filter = "taskboard=debug"
 *
 * [allocator]
 * base = 1000
 * gap = 1000
 * epsilon = "0.000000001"
 * ```
 */

use crate::shared::config::{AllocatorConfig, ConfigError};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "TASKBOARD_CONFIG";

/// Server settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    pub allocator: AllocatorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_filter: "info".to_string(),
            allocator: AllocatorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load defaults, then the optional TOML file, then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "port",
                message: format!("'{}' is not a valid port", port),
            })?;
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.allocator.validate()
    }

    /// Address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "host",
                message: format!("'{}' is not a valid IP address", self.host),
            })
    }
}
