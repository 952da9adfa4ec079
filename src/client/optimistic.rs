//! # Optimistic Updates
//!
//! Tracks local edits that were applied to the board cache before the server
//! confirmed them. Every pending edit is keyed by the correlation token that
//! travels with its intent, so the server's answer (an event or an error
//! carrying the same `ref`) resolves exactly one entry.
//!
//! ## Usage
//!
//! ```rust
//! use taskboard::client::optimistic::{OptimisticManager, PendingChange};
//! use taskboard::shared::ListId;
//!
//! let mut manager = OptimisticManager::new();
//! let temp_id = ListId::temporary();
//!
//! manager.apply("ref-1", PendingChange::CreateList { temp_id });
//! assert_eq!(manager.count_pending(), 1);
//!
//! // Server confirmed the create
//! assert!(manager.confirm("ref-1").is_some());
//! assert_eq!(manager.count_pending(), 0);
//! ```

use crate::shared::board::{Card, List};
use crate::shared::ids::{CardId, ListId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// What a pending edit changed locally, and what is needed to undo it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// Optimistically inserted list
    CreateList { temp_id: ListId },
    /// Optimistically inserted card
    CreateCard { temp_id: CardId, list_id: ListId },
    /// Card relocated or repositioned; `previous` is the state before the edit
    MoveCard { previous: Card },
    /// List repositioned; `previous` is the state before the edit
    MoveList { previous: List },
}

/// One pending optimistic edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub correlation: String,
    pub change: PendingChange,
    pub applied_at: DateTime<Utc>,
}

/// Pending optimistic edits keyed by correlation token
#[derive(Debug, Default)]
pub struct OptimisticManager {
    updates: HashMap<String, PendingUpdate>,
}

impl OptimisticManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an optimistic edit under its correlation token
    pub fn apply(&mut self, correlation: impl Into<String>, change: PendingChange) {
        let correlation = correlation.into();
        tracing::debug!("[Reconciler] Pending {} -> {:?}", correlation, change);
        let update = PendingUpdate {
            correlation: correlation.clone(),
            change,
            applied_at: Utc::now(),
        };
        self.updates.insert(correlation, update);
    }

    /// Resolve a pending edit the server accepted
    pub fn confirm(&mut self, correlation: &str) -> Option<PendingChange> {
        self.updates.remove(correlation).map(|update| update.change)
    }

    /// Resolve a pending edit the server rejected
    pub fn rollback(&mut self, correlation: &str) -> Option<PendingChange> {
        let update = self.updates.remove(correlation)?;
        tracing::debug!(
            "[Reconciler] Rolling back {} applied at {}",
            correlation,
            update.applied_at.to_rfc3339()
        );
        Some(update.change)
    }

    pub fn count_pending(&self) -> usize {
        self.updates.len()
    }

    /// Drop every pending edit; returns how many were discarded
    pub fn clear_all(&mut self) -> usize {
        let discarded = self.updates.len();
        self.updates.clear();
        discarded
    }
}
