/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `HandlerError` - Errors raised directly by a handler with a chosen status
 * - `ServiceError` - Rejections from the mutation or query service
 * - `SharedError` - Errors from the shared module
 * - `SerializationError` - JSON serialization errors
 *
 * # Status Mapping
 *
 * Service rejections keep their taxonomy on the HTTP surface:
 * validation is 400, access denied 403, not found 404 and an unavailable
 * store 503.
 */

use crate::backend::mutation::ServiceError;
use crate::shared::SharedError;
use axum::http::StatusCode;
use thiserror::Error;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use taskboard::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid request body)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Rejection from the mutation or query service
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::ServiceError(err) => match err {
                ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
                ServiceError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::InvalidPosition { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::ServiceError(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
