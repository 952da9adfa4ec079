//! Backend Module
//!
//! This module contains all server-side code for the taskboard realtime core.
//! It provides an Axum HTTP server with a persistent board connection, the
//! board-scoped broadcaster and a reference board store.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`mutation`** - Mutation / query service contracts and the in-memory store
//! - **`realtime`** - Channel registry, broadcaster and WebSocket handler
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── mutation/       - Authoritative board state
//! ├── realtime/       - Board channels and fan-out
//! └── error/          - Error types
//! ```
//!
//! # Request Flow
//!
//! A client connects to `GET /ws`, sends `join` for a board, then sends
//! mutation intents. Each intent is committed by the `MutationService`
//! before the broadcaster publishes the canonical result to every member of
//! the board channel, the origin included. Rejections go to the origin only.
//!
//! # Thread Safety
//!
//! - Channel membership is an `Arc<std::sync::Mutex<..>>`, never locked across
//!   an await
//! - The board store uses `tokio::sync::RwLock`
//! - Each connection has an unbounded `mpsc` outbox drained by its writer task

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Mutation and query services
#[cfg(feature = "ssr")]
pub mod mutation;

/// Real-time board channels
#[cfg(feature = "ssr")]
pub mod realtime;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use mutation::{Actor, MemoryBoardStore, MutationService, QueryService, ServiceError};
#[cfg(feature = "ssr")]
pub use realtime::{Broadcaster, ChannelRegistry, ConnectionHandle, Outcome};
#[cfg(feature = "ssr")]
pub use server::{create_app, AppState, ServerConfig};
