//! Mutation Module
//!
//! Authoritative board state behind the broadcaster.
//!
//! # Architecture
//!
//! - **`service`** - `MutationService` / `QueryService` traits, `Actor`,
//!   `ServiceError`, `Committed` and `CardMove`
//! - **`memory`** - `MemoryBoardStore`, the in-memory reference implementation
//!
//! # Module Structure
//!
//! ```text
//! mutation/
//! ├── mod.rs     - Module exports and documentation
//! ├── service.rs - Service contracts and error taxonomy
//! └── memory.rs  - In-memory store
//! ```

/// Service contracts
pub mod service;

/// In-memory reference store
pub mod memory;

pub use memory::{BoardSummary, MemoryBoardStore};
pub use service::{Actor, CardMove, Committed, MutationService, QueryService, ServiceError};
