//! Position Allocator
//!
//! Computes a new ordinal position for an item inserted into, or moved within,
//! an ordered sibling collection, without renumbering the siblings.
//!
//! # Rules
//!
//! - empty collection: `base`
//! - append at end: `last + gap`
//! - insert at top: `first / 2`
//! - insert between two siblings: their arithmetic mean
//! - unknown target: append at end, with a [`AllocationWarning::TargetNotFound`]
//!
//! The moving item is always removed from the sibling list before any rule
//! runs, so it never acts as its own neighbour.
//!
//! Repeated narrow insertions shrink gaps toward the fixed-precision floor.
//! When a slot can no longer be split so that both sides keep at least
//! `epsilon`, the allocation carries [`AllocationWarning::RebalanceRequired`].
//! The allocator never renumbers on its own; callers decide when to call
//! [`PositionAllocator::renumber`] and allocate again.

use crate::shared::config::AllocatorConfig;
use crate::shared::position::Position;
use serde::{Deserialize, Serialize};

/// Which side of the reference sibling to insert on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Insert before the reference (or at the top with no reference)
    Before,
    /// Insert after the reference (or at the end with no reference)
    #[default]
    After,
}

/// Insertion point within a sibling collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement<K> {
    /// Reference sibling, or `None` for the collection edges
    pub target: Option<K>,
    /// Side of the reference to insert on
    pub edge: Edge,
}

impl<K> Placement<K> {
    /// Append after the last sibling
    pub fn end() -> Self {
        Self {
            target: None,
            edge: Edge::After,
        }
    }

    /// Insert before the first sibling
    pub fn start() -> Self {
        Self {
            target: None,
            edge: Edge::Before,
        }
    }

    /// Insert directly before `target`
    pub fn before(target: K) -> Self {
        Self {
            target: Some(target),
            edge: Edge::Before,
        }
    }

    /// Insert directly after `target`
    pub fn after(target: K) -> Self {
        Self {
            target: Some(target),
            edge: Edge::After,
        }
    }
}

/// Caller-visible signal that the allocation resolved an ambiguity or hit the
/// precision floor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationWarning {
    /// The reference sibling was not found; the item was appended
    TargetNotFound,
    /// The chosen slot is too narrow; renumber and allocate again
    RebalanceRequired {
        /// Width of the slot that could not be split
        gap: Position,
    },
}

/// Result of one allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// The computed position
    pub position: Position,
    /// Optional warning for the caller
    pub warning: Option<AllocationWarning>,
}

impl Allocation {
    fn clean(position: Position) -> Self {
        Self {
            position,
            warning: None,
        }
    }

    /// Whether the caller must renumber before using this position
    pub fn needs_rebalance(&self) -> bool {
        matches!(self.warning, Some(AllocationWarning::RebalanceRequired { .. }))
    }
}

/// Gap-based position allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionAllocator {
    config: AllocatorConfig,
}

impl PositionAllocator {
    /// Create an allocator from validated settings
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// Compute a position for `moving` (or a new item when `None`) at `placement`
    pub fn allocate<K: PartialEq>(
        &self,
        siblings: &[(K, Position)],
        moving: Option<&K>,
        placement: &Placement<K>,
    ) -> Allocation {
        let mut ordered: Vec<&(K, Position)> = siblings
            .iter()
            .filter(|(id, _)| moving.map_or(true, |m| m != id))
            .collect();
        ordered.sort_by_key(|(_, position)| *position);

        if ordered.is_empty() {
            if placement.target.is_some() {
                tracing::warn!("[Allocator] Reference sibling missing from empty collection, using base");
                return Allocation {
                    position: self.config.base,
                    warning: Some(AllocationWarning::TargetNotFound),
                };
            }
            return Allocation::clean(self.config.base);
        }

        let Some(target) = placement.target.as_ref() else {
            return match placement.edge {
                Edge::After => self.append(ordered[ordered.len() - 1].1),
                Edge::Before => self.prepend(ordered[0].1),
            };
        };

        let Some(index) = ordered.iter().position(|(id, _)| id == target) else {
            tracing::warn!("[Allocator] Reference sibling not found, appending at end");
            let mut allocation = self.append(ordered[ordered.len() - 1].1);
            if allocation.warning.is_none() {
                allocation.warning = Some(AllocationWarning::TargetNotFound);
            }
            return allocation;
        };

        match placement.edge {
            Edge::After => match ordered.get(index + 1) {
                Some((_, next)) => self.between(ordered[index].1, *next),
                None => self.append(ordered[index].1),
            },
            Edge::Before => {
                if index == 0 {
                    self.prepend(ordered[0].1)
                } else {
                    self.between(ordered[index - 1].1, ordered[index].1)
                }
            }
        }
    }

    /// Evenly spaced positions `(i + 1) * gap` preserving current relative order
    pub fn renumber<K: Clone>(&self, ordered_items: &[(K, Position)]) -> Vec<(K, Position)> {
        let mut indexed: Vec<(usize, &(K, Position))> = ordered_items.iter().enumerate().collect();
        indexed.sort_by_key(|(i, (_, position))| (*position, *i));

        indexed
            .into_iter()
            .enumerate()
            .map(|(rank, (_, (id, _)))| {
                let factor = i64::try_from(rank + 1).unwrap_or(i64::MAX);
                let position = self
                    .config
                    .gap
                    .checked_mul(factor)
                    .unwrap_or(Position::from_raw(i64::MAX));
                (id.clone(), position)
            })
            .collect()
    }

    /// Whether any two adjacent positions are too close to split further
    pub fn needs_rebalance(&self, positions: &[Position]) -> bool {
        let mut sorted = positions.to_vec();
        sorted.sort();
        let floor = self.config.epsilon.doubled();
        sorted.windows(2).any(|pair| pair[0].gap_to(pair[1]) < floor)
            || sorted.first().is_some_and(|first| *first < floor)
    }

    fn append(&self, last: Position) -> Allocation {
        match last.checked_add(self.config.gap) {
            Some(position) => Allocation::clean(position),
            None => {
                tracing::warn!("[Allocator] Position overflow appending after {}", last);
                Allocation {
                    position: last,
                    warning: Some(AllocationWarning::RebalanceRequired { gap: Position::ZERO }),
                }
            }
        }
    }

    fn prepend(&self, first: Position) -> Allocation {
        let position = first.half();
        let below = position;
        let above = first.gap_to(position);
        if below < self.config.epsilon || above < self.config.epsilon {
            tracing::debug!("[Allocator] Top slot below {} exhausted", first);
            return Allocation {
                position,
                warning: Some(AllocationWarning::RebalanceRequired { gap: first }),
            };
        }
        Allocation::clean(position)
    }

    fn between(&self, lo: Position, hi: Position) -> Allocation {
        let position = lo.midpoint(hi);
        let gap = lo.gap_to(hi);
        if lo.gap_to(position) < self.config.epsilon || hi.gap_to(position) < self.config.epsilon {
            tracing::debug!("[Allocator] Slot between {} and {} exhausted", lo, hi);
            return Allocation {
                position,
                warning: Some(AllocationWarning::RebalanceRequired { gap }),
            };
        }
        Allocation::clean(position)
    }
}
