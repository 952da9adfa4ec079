// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! Taskboard - Realtime Ordering Core
//!
//! The ordering and synchronization core of a collaborative task board:
//! boards hold ordered lists, lists hold ordered cards, and every connected
//! client converges on the same order without server-side locking or
//! renumbering on every edit.
//!
//! # Overview
//!
//! - A gap-based position allocator over a fixed-precision `Position`
//! - A board-scoped broadcaster that publishes each committed mutation to
//!   every connection joined to the board, the origin included
//! - A client reconciler that merges optimistic edits, board events and bulk
//!   snapshots into one normalized cache
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and client
//!   - Ids, lists, cards, positions, the allocator
//!   - Wire intents and events
//!   - Error and configuration types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum server with a WebSocket board connection
//!   - Mutation / query service contracts and an in-memory store
//!   - Channel registry and broadcaster
//!
//! - **`client`** - Client-side reconciliation
//!   - Normalized board cache and optimistic edit tracking
//!   - Async session wrapper and HTTP snapshot client
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend modules and the server binary (default)
//!
//! # Usage
//!
//! ## Server-Side
//!
//! ```rust,no_run
//! use taskboard::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() {
//! let app = create_app(ServerConfig::default()).await;
//! // Serve with axum::serve
//! # }
//! ```
//!
//! ## Client-Side
//!
//! ```rust
//! use taskboard::client::Reconciler;
//! use taskboard::shared::{BoardId, Placement, PositionAllocator};
//!
//! let mut reconciler = Reconciler::new(BoardId::new("b1"), PositionAllocator::default());
//! let staged = reconciler.create_list("Todo", Placement::end());
//! assert!(staged.id.is_temporary());
//! ```
//!
//! # Thread Safety
//!
//! - **Server**: channel membership sits behind one mutex; each connection
//!   has its own outbox task
//! - **Client**: a `Reconciler` is plain data mutated through `&mut self`;
//!   `BoardSession` shares it behind `Arc<RwLock<_>>`
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for wire and validation failures
//! - `backend::mutation::ServiceError` for rejected intents
//! - `backend::error::BackendError` for HTTP responses
//! - `client::ClientError` for local operations and snapshot fetches

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client-side board cache and reconciler
pub mod client;
