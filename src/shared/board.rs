//! Board Entities
//!
//! Canonical List and Card records as committed by the mutation service and
//! carried in full by every outbound event, plus the partial update payloads
//! and the bulk board snapshot.

use crate::shared::ids::{BoardId, CardId, ListId};
use crate::shared::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered container of cards within a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub name: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    /// Create a list stamped with the current time
    pub fn new(id: ListId, board_id: BoardId, name: impl Into<String>, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id,
            board_id,
            name: name.into(),
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, returning whether anything changed
    pub fn apply(&mut self, updates: &ListUpdates) -> bool {
        let mut changed = false;
        if let Some(name) = &updates.name {
            if *name != self.name {
                self.name = name.clone();
                changed = true;
            }
        }
        if let Some(position) = updates.position {
            if position != self.position {
                self.position = position;
                changed = true;
            }
        }
        changed
    }
}

/// A task item within a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Create a card stamped with the current time
    pub fn new(id: CardId, list_id: ListId, title: impl Into<String>, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id,
            list_id,
            title: title.into(),
            description: None,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, returning whether anything changed
    pub fn apply(&mut self, updates: &CardUpdates) -> bool {
        let mut changed = false;
        if let Some(title) = &updates.title {
            if *title != self.title {
                self.title = title.clone();
                changed = true;
            }
        }
        if let Some(description) = &updates.description {
            let next = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
            if next != self.description {
                self.description = next;
                changed = true;
            }
        }
        if let Some(position) = updates.position {
            if position != self.position {
                self.position = position;
                changed = true;
            }
        }
        changed
    }
}

/// Partial update for a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ListUpdates {
    /// Update only the position
    pub fn position(position: Position) -> Self {
        Self {
            name: None,
            position: Some(position),
        }
    }

    /// Whether the update carries no fields
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none()
    }
}

/// Partial update for a card; an empty description clears it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl CardUpdates {
    /// Update only the position
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Whether the update carries no fields
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.position.is_none()
    }
}

/// Ordered bulk view of one board
///
/// Lists are ordered by `(position, id)`; cards are grouped per list in list
/// order and ordered by `(position, id)` within each list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board_id: BoardId,
    pub lists: Vec<List>,
    pub cards: Vec<Card>,
}

impl BoardSnapshot {
    /// Empty snapshot for a board
    pub fn empty(board_id: BoardId) -> Self {
        Self {
            board_id,
            lists: Vec::new(),
            cards: Vec::new(),
        }
    }

    /// Build a snapshot in canonical order from unordered parts
    ///
    /// Cards whose list is not among `lists` are dropped.
    pub fn from_parts(board_id: BoardId, mut lists: Vec<List>, mut cards: Vec<Card>) -> Self {
        lists.sort_by(|a, b| (a.position, &a.id).cmp(&(b.position, &b.id)));
        cards.sort_by(|a, b| (a.position, &a.id).cmp(&(b.position, &b.id)));

        let mut ordered = Vec::with_capacity(cards.len());
        for list in &lists {
            ordered.extend(cards.iter().filter(|card| card.list_id == list.id).cloned());
        }

        Self {
            board_id,
            lists,
            cards: ordered,
        }
    }

    /// Cards of one list, in order
    pub fn cards_in<'a>(&'a self, list_id: &'a ListId) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |card| &card.list_id == list_id)
    }
}
