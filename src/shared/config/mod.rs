//! Application configuration module
//!
//! Provides configuration types shared by the server and the client: the
//! position allocator settings and the client connection settings.

use crate::shared::position::Position;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default position of the first item in an empty collection
pub const DEFAULT_BASE: i64 = 1000;

/// Default spacing between appended items and after renumbering
pub const DEFAULT_GAP: i64 = 1000;

/// Position allocator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Position assigned in an empty collection
    pub base: Position,
    /// Spacing used for appends and renumbering
    pub gap: Position,
    /// Narrowest gap an allocation may leave on either side
    pub epsilon: Position,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            base: Position::from_units(DEFAULT_BASE),
            gap: Position::from_units(DEFAULT_GAP),
            epsilon: Position::EPSILON,
        }
    }
}

impl AllocatorConfig {
    /// Validate the allocator settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base.is_positive() {
            return Err(ConfigError::InvalidValue {
                field: "allocator.base",
                message: format!("must be positive, got {}", self.base),
            });
        }
        if !self.gap.is_positive() {
            return Err(ConfigError::InvalidValue {
                field: "allocator.gap",
                message: format!("must be positive, got {}", self.gap),
            });
        }
        if !self.epsilon.is_positive() || self.epsilon >= self.gap {
            return Err(ConfigError::InvalidValue {
                field: "allocator.epsilon",
                message: format!("must be positive and below the gap, got {}", self.epsilon),
            });
        }
        Ok(())
    }
}

/// Client application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Server URL used for snapshot fetches
    pub server_url: Option<String>,
    /// Allocator used for optimistic placement
    pub allocator: AllocatorConfig,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        self.allocator.validate()
    }

    /// Server URL, or an error when it was never configured
    pub fn require_server_url(&self) -> Result<&str, ConfigError> {
        self.server_url
            .as_deref()
            .ok_or(ConfigError::MissingValue("server_url"))
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    allocator: Option<AllocatorConfig>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Override the allocator settings
    pub fn allocator(mut self, allocator: AllocatorConfig) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self.server_url,
            allocator: self.allocator.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
