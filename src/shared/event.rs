/**
 * Board Events
 *
 * Outbound messages produced by the broadcaster. A `BoardEvent` is the
 * canonical result of one committed mutation and is fanned out to every
 * connection joined to the owning board. Every event carries the full
 * canonical entity, never a partial diff, so receivers only need identity
 * matching.
 *
 * `ServerMessage` wraps events together with the acknowledgements and
 * errors that are delivered to the originating connection only.
 */
use crate::shared::board::{Card, List};
use crate::shared::error::SharedError;
use crate::shared::ids::{BoardId, CardId, ListId};
use serde::{Deserialize, Serialize};

/// Canonical result of a committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BoardEvent {
    #[serde(rename = "list.created", rename_all = "camelCase")]
    ListCreated { list: List },

    #[serde(rename = "list.updated", rename_all = "camelCase")]
    ListUpdated { list: List },

    #[serde(rename = "list.deleted", rename_all = "camelCase")]
    ListDeleted { board_id: BoardId, list_id: ListId },

    #[serde(rename = "card.created", rename_all = "camelCase")]
    CardCreated { board_id: BoardId, card: Card },

    #[serde(rename = "card.updated", rename_all = "camelCase")]
    CardUpdated { board_id: BoardId, card: Card },

    #[serde(rename = "card.deleted", rename_all = "camelCase")]
    CardDeleted {
        board_id: BoardId,
        card_id: CardId,
        list_id: ListId,
    },

    /// The card carries its new list id; `from_list_id` is where it lived
    /// before the commit
    #[serde(rename = "card.moved", rename_all = "camelCase")]
    CardMoved {
        board_id: BoardId,
        card: Card,
        from_list_id: ListId,
    },
}

impl BoardEvent {
    /// Board whose channel receives the event
    pub fn board_id(&self) -> &BoardId {
        match self {
            BoardEvent::ListCreated { list } | BoardEvent::ListUpdated { list } => &list.board_id,
            BoardEvent::ListDeleted { board_id, .. }
            | BoardEvent::CardCreated { board_id, .. }
            | BoardEvent::CardUpdated { board_id, .. }
            | BoardEvent::CardDeleted { board_id, .. }
            | BoardEvent::CardMoved { board_id, .. } => board_id,
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::ListCreated { .. } => "list.created",
            BoardEvent::ListUpdated { .. } => "list.updated",
            BoardEvent::ListDeleted { .. } => "list.deleted",
            BoardEvent::CardCreated { .. } => "card.created",
            BoardEvent::CardUpdated { .. } => "card.updated",
            BoardEvent::CardDeleted { .. } => "card.deleted",
            BoardEvent::CardMoved { .. } => "card.moved",
        }
    }
}

/// Category of a rejected intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed intent, rejected before commit
    Validation,
    /// Origin lacks access to the board
    AccessDenied,
    /// Target entity vanished
    NotFound,
    /// Durable store temporarily unavailable
    Unavailable,
}

/// Error details delivered to the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

/// Any message the server sends on a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Fanned-out board event; `ref` is set only for the origin's own intent
    Event {
        #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
        correlation: Option<String>,
        event: BoardEvent,
    },

    /// Join acknowledgement
    #[serde(rename_all = "camelCase")]
    Joined { board_id: BoardId },

    /// Leave acknowledgement
    #[serde(rename_all = "camelCase")]
    Left { board_id: BoardId },

    /// Rejected intent, origin only
    Error {
        #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
        correlation: Option<String>,
        error: ErrorPayload,
    },
}

impl ServerMessage {
    /// Wrap an event with an optional correlation token
    pub fn event(correlation: Option<String>, event: BoardEvent) -> Self {
        Self::Event { correlation, event }
    }

    /// Build an error message
    pub fn error(correlation: Option<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            correlation,
            error: ErrorPayload {
                kind,
                message: message.into(),
            },
        }
    }

    /// Correlation token, if any
    pub fn correlation(&self) -> Option<&str> {
        match self {
            ServerMessage::Event { correlation, .. } | ServerMessage::Error { correlation, .. } => {
                correlation.as_deref()
            }
            ServerMessage::Joined { .. } | ServerMessage::Left { .. } => None,
        }
    }

    /// Same message with the correlation token removed
    pub fn without_correlation(&self) -> Self {
        match self {
            ServerMessage::Event { event, .. } => ServerMessage::Event {
                correlation: None,
                event: event.clone(),
            },
            ServerMessage::Error { error, .. } => ServerMessage::Error {
                correlation: None,
                error: error.clone(),
            },
            other => other.clone(),
        }
    }

    /// Decode from a JSON text frame
    pub fn from_json(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
