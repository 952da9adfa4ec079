//! Real-time Board Module
//!
//! This module provides the board-scoped event fan-out: connections join
//! board channels, send mutation intents, and receive the committed canonical
//! results of every mutation on the boards they joined.
//!
//! # Architecture
//!
//! The realtime module is organized into focused submodules:
//!
//! - **`registry`** - Board to connection membership map
//! - **`broadcast`** - Intent dispatch, commit delegation and fan-out
//! - **`sequencer`** - Per-board commit order for publishing
//! - **`subscription`** - WebSocket connection handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - Channel membership registry
//! ├── broadcast.rs    - Broadcaster
//! ├── sequencer.rs    - Publish queue
//! └── subscription.rs - WebSocket connection handler
//! ```
//!
//! # Ordering
//!
//! There is no ordering guarantee across boards. Within one board, the store
//! numbers every commit and the broadcaster publishes strictly in that order,
//! holding back a result whose task overtook an earlier commit.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard::backend::mutation::MemoryBoardStore;
//! use taskboard::backend::realtime::{Broadcaster, ChannelRegistry};
//!
//! let store = Arc::new(MemoryBoardStore::default());
//! let broadcaster = Broadcaster::new(ChannelRegistry::new(), store.clone(), store);
//! ```

/// Channel membership registry
pub mod registry;

/// Intent dispatch and fan-out
pub mod broadcast;

/// Per-board publish ordering
pub mod sequencer;

/// WebSocket connection handler
pub mod subscription;

// Re-export commonly used types and functions
pub use broadcast::{Broadcaster, Outcome};
pub use registry::{ChannelRegistry, ConnectionHandle};
pub use subscription::handle_board_socket;
