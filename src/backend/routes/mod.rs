//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation and route assembly
//! - **`api_routes`** - REST endpoints (health, boards, snapshots)
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - API endpoint handlers
//! ```
//!
//! # Routes
//!
//! - `GET /ws` - Board connection (WebSocket upgrade)
//! - `GET /health` - Liveness probe
//! - `POST /api/boards` - Create a board
//! - `GET /api/boards/{board_id}/snapshot` - Ordered bulk snapshot
//! - `GET /api/boards/{board_id}/channel` - Channel introspection

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
