/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "list l1 not found",
 *   "status": 404
 * }
 * ```
 */

use crate::backend::error::types::BackendError;
use axum::response::{IntoResponse, Json, Response};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Api] {} {}", status.as_u16(), message);
        } else {
            tracing::debug!("[Api] {} {}", status.as_u16(), message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
