/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The in-memory board store (mutation and query services)
 * - The broadcaster, which owns the channel registry
 * - The loaded server configuration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 */

use crate::backend::mutation::{MemoryBoardStore, QueryService};
use crate::backend::realtime::{Broadcaster, ChannelRegistry};
use crate::backend::server::config::ServerConfig;
use crate::shared::allocator::PositionAllocator;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Reference board store
    pub store: Arc<MemoryBoardStore>,

    /// Intent dispatcher and channel fan-out
    pub broadcaster: Broadcaster,

    /// Loaded server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire a store and a fresh registry into a broadcaster
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryBoardStore::new(PositionAllocator::new(config.allocator)));
        let broadcaster = Broadcaster::new(ChannelRegistry::new(), store.clone(), store.clone());
        Self {
            store,
            broadcaster,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Broadcaster {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broadcaster.clone()
    }
}

impl FromRef<AppState> for ChannelRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broadcaster.registry().clone()
    }
}

impl FromRef<AppState> for Arc<MemoryBoardStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QueryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
