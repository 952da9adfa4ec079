/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Board connection (`GET /ws`)
 * 2. API routes (health, boards, snapshots)
 * 3. Fallback handler (404)
 *
 * Every request is traced through `tower-http`'s `TraceLayer`.
 */

use crate::backend::realtime::handle_board_socket;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;
use axum::http::StatusCode;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", axum::routing::get(handle_board_socket));

    let router = configure_api_routes(router);

    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
