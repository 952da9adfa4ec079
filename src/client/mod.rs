//! Client Module
//!
//! Client-side board state: a normalized cache per board kept convergent
//! with the server by merging optimistic local edits, board events and bulk
//! snapshots.
//!
//! # Architecture
//!
//! - **`cache`** - Ordered lists and per-list card buckets
//! - **`optimistic`** - Pending local edits keyed by correlation token
//! - **`reconciler`** - Applies local edits, events and snapshots to the cache
//! - **`session`** - Async wrapper with an outbound intent queue
//! - **`remote`** - HTTP snapshot source
//! - **`error`** - Client error types
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── cache.rs        - BoardCache
//! ├── optimistic.rs   - OptimisticManager
//! ├── reconciler.rs   - Reconciler
//! ├── session.rs      - BoardSession
//! ├── remote.rs       - SnapshotSource and SnapshotClient
//! └── error.rs        - ClientError
//! ```

pub mod cache;
pub mod error;
pub mod optimistic;
pub mod reconciler;
pub mod remote;
pub mod session;

pub use cache::BoardCache;
pub use error::ClientError;
pub use optimistic::{OptimisticManager, PendingChange, PendingUpdate};
pub use reconciler::{Applied, Reconciler, Staged};
pub use remote::{SnapshotClient, SnapshotSource};
pub use session::BoardSession;
