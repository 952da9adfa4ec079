//! Shared Error Types
//!
//! This module defines error types that are shared between the server and the
//! client reconciler. These errors represent common failure cases that can
//! occur in both contexts.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures
//! - `InvalidPosition` - A position value that cannot be represented
//!
//! # Usage
//!
//! ```rust
//! use taskboard::shared::error::SharedError;
//!
//! let error = SharedError::validation("name", "List name cannot be empty");
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread boundaries.
use thiserror::Error;

/// Shared error types that can occur in both frontend and backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Position value outside the fixed-precision range
    #[error("Invalid position: {value}")]
    InvalidPosition {
        /// The offending input, as text
        value: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid position error
    pub fn invalid_position(value: impl Into<String>) -> Self {
        Self::InvalidPosition {
            value: value.into(),
        }
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
