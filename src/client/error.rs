//! Client Error Types
//!
//! Errors raised by local optimistic operations, the board session and the
//! HTTP snapshot client.

use crate::shared::config::ConfigError;
use crate::shared::SharedError;
use thiserror::Error;

/// Client-side error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure talking to the server
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request failed: {status} - {message}")]
    Status { status: u16, message: String },

    /// The referenced list is not in the local cache
    #[error("Unknown list: {0}")]
    UnknownList(String),

    /// The referenced card is not in the local cache
    #[error("Unknown card: {0}")]
    UnknownCard(String),

    /// The entity still has a temporary id and cannot be targeted yet
    #[error("{0} is not confirmed by the server yet")]
    Unconfirmed(String),

    /// The connection outbox is closed
    #[error("Board connection is closed")]
    Disconnected,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shared(#[from] SharedError),
}
