/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Create the board store and the broadcaster with an empty registry
 * 2. Create and configure the router
 * 3. Start the periodic registry cleanup task
 */

use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use axum::Router;
use std::time::Duration;

/// How often closed connections are swept from the registry
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing taskboard server");

    // Step 1: Create shared state
    let app_state = AppState::new(config);
    tracing::info!("Board store and broadcaster initialized");

    // Step 2: Create router with all routes
    let app = create_router(app_state.clone());

    // Step 3: Periodically drop members whose connection task died without
    // reaching its disconnect step
    let registry = app_state.broadcaster.registry().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = registry.cleanup_closed();
            tracing::debug!("[Realtime] Cleaned up {} closed connections", removed);
        }
    });

    tracing::info!("Router configured with periodic cleanup task");

    app
}
