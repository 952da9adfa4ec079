/**
 * Inbound Intents
 *
 * Mutation and membership requests sent by a client over its persistent
 * connection. Each intent travels inside a `ClientMessage` envelope that may
 * carry a correlation token; the server echoes the token back on the result so
 * the origin can match its optimistic state without heuristics.
 *
 * # Wire Format
 *
 * ```json
 * {"ref": "ref-1", "intent": {"type": "card.move", "payload": {
 *     "boardId": "b1", "cardId": "c1", "fromListId": "l1",
 *     "toListId": "l2", "position": 1500}}}
 * ```
 */
use crate::shared::board::{CardUpdates, ListUpdates};
use crate::shared::ids::{BoardId, CardId, ListId};
use crate::shared::position::Position;
use serde::{Deserialize, Serialize};

/// Mutation or membership request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Intent {
    #[serde(rename = "join", rename_all = "camelCase")]
    Join { board_id: BoardId },

    #[serde(rename = "leave", rename_all = "camelCase")]
    Leave { board_id: BoardId },

    #[serde(rename = "list.create", rename_all = "camelCase")]
    CreateList {
        board_id: BoardId,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
    },

    #[serde(rename = "list.update", rename_all = "camelCase")]
    UpdateList {
        board_id: BoardId,
        list_id: ListId,
        updates: ListUpdates,
    },

    #[serde(rename = "list.delete", rename_all = "camelCase")]
    DeleteList { board_id: BoardId, list_id: ListId },

    #[serde(rename = "card.create", rename_all = "camelCase")]
    CreateCard {
        board_id: BoardId,
        list_id: ListId,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
    },

    #[serde(rename = "card.update", rename_all = "camelCase")]
    UpdateCard {
        board_id: BoardId,
        card_id: CardId,
        updates: CardUpdates,
    },

    #[serde(rename = "card.delete", rename_all = "camelCase")]
    DeleteCard {
        board_id: BoardId,
        card_id: CardId,
        list_id: ListId,
    },

    #[serde(rename = "card.move", rename_all = "camelCase")]
    MoveCard {
        board_id: BoardId,
        card_id: CardId,
        from_list_id: ListId,
        to_list_id: ListId,
        position: Position,
    },
}

impl Intent {
    /// Board the intent targets
    pub fn board_id(&self) -> &BoardId {
        match self {
            Intent::Join { board_id }
            | Intent::Leave { board_id }
            | Intent::CreateList { board_id, .. }
            | Intent::UpdateList { board_id, .. }
            | Intent::DeleteList { board_id, .. }
            | Intent::CreateCard { board_id, .. }
            | Intent::UpdateCard { board_id, .. }
            | Intent::DeleteCard { board_id, .. }
            | Intent::MoveCard { board_id, .. } => board_id,
        }
    }

    /// Wire name of the intent
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Join { .. } => "join",
            Intent::Leave { .. } => "leave",
            Intent::CreateList { .. } => "list.create",
            Intent::UpdateList { .. } => "list.update",
            Intent::DeleteList { .. } => "list.delete",
            Intent::CreateCard { .. } => "card.create",
            Intent::UpdateCard { .. } => "card.update",
            Intent::DeleteCard { .. } => "card.delete",
            Intent::MoveCard { .. } => "card.move",
        }
    }
}

/// Envelope for an intent with its optional correlation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    pub intent: Intent,
}

impl ClientMessage {
    /// Envelope without a correlation token
    pub fn new(intent: Intent) -> Self {
        Self {
            correlation: None,
            intent,
        }
    }

    /// Envelope with a correlation token
    pub fn with_ref(correlation: impl Into<String>, intent: Intent) -> Self {
        Self {
            correlation: Some(correlation.into()),
            intent,
        }
    }

    /// Decode from a JSON text frame
    pub fn from_json(text: &str) -> Result<Self, crate::shared::SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, crate::shared::SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
