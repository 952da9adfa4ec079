//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and the client reconciler: identifiers, board entities, the
//! fixed-precision position type and its allocator, and the wire protocol.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All wire types serialize as JSON text
//! frames on the board connection and as JSON bodies on the REST routes.

/// Identifier types
pub mod ids;

/// Fixed-precision positions
pub mod position;

/// Gap-based position allocator
pub mod allocator;

/// List and card entities
pub mod board;

/// Inbound intents
pub mod intent;

/// Outbound board events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use allocator::{Allocation, AllocationWarning, Edge, Placement, PositionAllocator};
pub use board::{BoardSnapshot, Card, CardUpdates, List, ListUpdates};
pub use config::{AllocatorConfig, AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{BoardEvent, ErrorKind, ErrorPayload, ServerMessage};
pub use ids::{BoardId, CardId, ConnectionId, ListId, UserId};
pub use intent::{ClientMessage, Intent};
pub use position::Position;
