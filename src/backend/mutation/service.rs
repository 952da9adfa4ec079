/**
 * Mutation and Query Service Contracts
 *
 * The broadcaster never touches board state directly. Every intent is
 * delegated to an authoritative `MutationService`, which commits it durably
 * and returns the canonical entity, or rejects it with a `ServiceError`.
 * Bulk ordered reads go through the `QueryService`.
 *
 * # Commit Sequence
 *
 * Every successful mutation is stamped with its board's commit number while
 * the commit is still exclusive. Numbers start at 1 and grow by one per
 * commit on that board, so gaps never appear and the broadcaster can publish
 * in commit order.
 *
 * # Error Taxonomy
 *
 * - `Validation` - malformed intent, rejected before commit
 * - `AccessDenied` - the actor has no access to the board
 * - `NotFound` - the target vanished, e.g. after a concurrent delete
 * - `Unavailable` - the durable store is temporarily unreachable
 *
 * All four are reported to the originating connection only.
 */
use crate::shared::board::{BoardSnapshot, Card, CardUpdates, List, ListUpdates};
use crate::shared::event::ErrorKind;
use crate::shared::ids::{BoardId, CardId, ConnectionId, ListId, UserId};
use crate::shared::position::Position;
use async_trait::async_trait;
use thiserror::Error;

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Connection the intent arrived on
    pub connection_id: ConnectionId,
    /// Authenticated user, if the connection identified one
    pub user_id: Option<UserId>,
}

impl Actor {
    pub fn new(connection_id: ConnectionId, user_id: Option<UserId>) -> Self {
        Self {
            connection_id,
            user_id,
        }
    }

    /// Actor without a user, for anonymous access to open boards
    pub fn anonymous() -> Self {
        Self::new(ConnectionId::new(), None)
    }
}

/// Typed failure of a mutation or query
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Access denied to board {board_id}")]
    AccessDenied { board_id: BoardId },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Wire category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }
}

/// A committed result together with its board commit number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub sequence: u64,
    pub value: T,
}

impl<T> Committed<T> {
    pub fn new(sequence: u64, value: T) -> Self {
        Self { sequence, value }
    }

    /// Transform the value, keeping the commit number
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            sequence: self.sequence,
            value: f(self.value),
        }
    }
}

/// Result of a committed card move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMove {
    /// Canonical card, carrying its new list and position
    pub card: Card,
    /// List the card lived in before the commit
    pub from_list_id: ListId,
}

impl CardMove {
    /// Whether the move crossed lists
    pub fn crossed_lists(&self) -> bool {
        self.card.list_id != self.from_list_id
    }
}

/// Authoritative writer for board state
#[async_trait]
pub trait MutationService: Send + Sync {
    /// Create a list; an omitted position appends at the end
    async fn create_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        name: &str,
        position: Option<Position>,
    ) -> Result<Committed<List>, ServiceError>;

    async fn update_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
        updates: &ListUpdates,
    ) -> Result<Committed<List>, ServiceError>;

    /// Delete a list together with its cards, returning the removed list
    async fn delete_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
    ) -> Result<Committed<List>, ServiceError>;

    /// Create a card; an omitted position appends at the end of the list
    async fn create_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
        title: &str,
        position: Option<Position>,
    ) -> Result<Committed<Card>, ServiceError>;

    async fn update_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        updates: &CardUpdates,
    ) -> Result<Committed<Card>, ServiceError>;

    /// Delete a card, returning it as it was at commit time
    async fn delete_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        list_id: &ListId,
    ) -> Result<Committed<Card>, ServiceError>;

    /// Move a card to `to_list_id` at `position`
    ///
    /// `from_list_id` is the caller's belief; the returned `CardMove` carries
    /// the list the card actually left.
    async fn move_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        from_list_id: &ListId,
        to_list_id: &ListId,
        position: Position,
    ) -> Result<Committed<CardMove>, ServiceError>;
}

/// Authoritative reader for board state
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Ordered bulk snapshot of a board
    async fn snapshot(&self, actor: &Actor, board_id: &BoardId) -> Result<BoardSnapshot, ServiceError>;

    /// Verify the actor may read and write the board
    async fn check_access(&self, actor: &Actor, board_id: &BoardId) -> Result<(), ServiceError>;
}
