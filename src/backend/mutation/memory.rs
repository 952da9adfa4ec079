/**
 * In-Memory Board Store
 *
 * Reference implementation of both `MutationService` and `QueryService`,
 * used by the server binary and the integration tests.
 *
 * # Storage
 *
 * Boards live in a single `tokio::sync::RwLock<HashMap<..>>`. Each mutation
 * takes the write lock for the duration of its commit, so a committed result
 * is never observed half-applied by a concurrent snapshot. The board's commit
 * number is advanced under the same lock, after every check has passed.
 *
 * # Access
 *
 * A board created with a member set only admits actors whose user id is in
 * the set. Boards created without one are open to every actor.
 *
 * # Failure Simulation
 *
 * `set_unavailable(true)` makes every operation fail with
 * `ServiceError::Unavailable`, standing in for a durable store outage.
 */
use crate::backend::mutation::service::{
    Actor, CardMove, Committed, MutationService, QueryService, ServiceError,
};
use crate::shared::allocator::{Placement, PositionAllocator};
use crate::shared::board::{BoardSnapshot, Card, CardUpdates, List, ListUpdates};
use crate::shared::ids::{BoardId, CardId, ListId, UserId};
use crate::shared::position::Position;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Longest accepted list name, in characters
pub const MAX_NAME_LEN: usize = 256;

/// Longest accepted card title, in characters
pub const MAX_TITLE_LEN: usize = 512;

/// Public summary of a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub name: String,
}

#[derive(Debug)]
struct BoardRecord {
    name: String,
    members: Option<HashSet<UserId>>,
    lists: HashMap<ListId, List>,
    cards: HashMap<CardId, Card>,
    sequence: u64,
}

impl BoardRecord {
    /// Advance the commit number; call once per successful mutation
    fn stamp<T>(&mut self, value: T) -> Committed<T> {
        self.sequence += 1;
        Committed::new(self.sequence, value)
    }

    fn admits(&self, actor: &Actor) -> bool {
        match &self.members {
            None => true,
            Some(members) => actor
                .user_id
                .as_ref()
                .is_some_and(|user| members.contains(user)),
        }
    }

    fn list_siblings(&self) -> Vec<(ListId, Position)> {
        self.lists
            .values()
            .map(|list| (list.id.clone(), list.position))
            .collect()
    }

    fn card_siblings(&self, list_id: &ListId) -> Vec<(CardId, Position)> {
        self.cards
            .values()
            .filter(|card| &card.list_id == list_id)
            .map(|card| (card.id.clone(), card.position))
            .collect()
    }
}

/// Reference in-memory board store
#[derive(Debug)]
pub struct MemoryBoardStore {
    boards: RwLock<HashMap<BoardId, BoardRecord>>,
    allocator: PositionAllocator,
    unavailable: AtomicBool,
}

impl Default for MemoryBoardStore {
    fn default() -> Self {
        Self::new(PositionAllocator::default())
    }
}

impl MemoryBoardStore {
    pub fn new(allocator: PositionAllocator) -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            allocator,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Create a board; `None` members leaves it open to every actor
    pub async fn create_board(
        &self,
        name: &str,
        members: Option<HashSet<UserId>>,
    ) -> Result<BoardSummary, ServiceError> {
        self.ensure_available()?;
        let name = validate_text("name", name, MAX_NAME_LEN)?;
        let id = BoardId::generate();

        self.boards.write().await.insert(
            id.clone(),
            BoardRecord {
                name: name.clone(),
                members,
                lists: HashMap::new(),
                cards: HashMap::new(),
                sequence: 0,
            },
        );

        tracing::info!("[Store] Created board {} ({})", id, name);
        Ok(BoardSummary { id, name })
    }

    /// Summary of an existing board
    pub async fn board(&self, board_id: &BoardId) -> Option<BoardSummary> {
        self.boards.read().await.get(board_id).map(|record| BoardSummary {
            id: board_id.clone(),
            name: record.name.clone(),
        })
    }

    /// Toggle simulated store outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
        tracing::warn!("[Store] Availability set to {}", !unavailable);
    }

    fn ensure_available(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::unavailable("board store is not reachable"));
        }
        Ok(())
    }
}

fn validate_text(field: &str, value: &str, max: usize) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(ServiceError::validation(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_position(position: Position) -> Result<Position, ServiceError> {
    if !position.is_positive() {
        return Err(ServiceError::validation(
            "position",
            format!("must be positive, got {}", position),
        ));
    }
    Ok(position)
}

fn open_board<'a>(
    boards: &'a mut HashMap<BoardId, BoardRecord>,
    actor: &Actor,
    board_id: &BoardId,
) -> Result<&'a mut BoardRecord, ServiceError> {
    let record = boards
        .get_mut(board_id)
        .ok_or_else(|| ServiceError::not_found("board", board_id))?;
    if !record.admits(actor) {
        return Err(ServiceError::AccessDenied {
            board_id: board_id.clone(),
        });
    }
    Ok(record)
}

#[async_trait]
impl MutationService for MemoryBoardStore {
    async fn create_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        name: &str,
        position: Option<Position>,
    ) -> Result<Committed<List>, ServiceError> {
        self.ensure_available()?;
        let name = validate_text("name", name, MAX_NAME_LEN)?;
        let position = position.map(validate_position).transpose()?;

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;

        let position = match position {
            Some(position) => position,
            None => {
                self.allocator
                    .allocate(&record.list_siblings(), None, &Placement::end())
                    .position
            }
        };

        let list = List::new(ListId::generate(), board_id.clone(), name, position);
        record.lists.insert(list.id.clone(), list.clone());

        tracing::debug!("[Store] Committed list {} at {}", list.id, list.position);
        Ok(record.stamp(list))
    }

    async fn update_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
        updates: &ListUpdates,
    ) -> Result<Committed<List>, ServiceError> {
        self.ensure_available()?;
        if updates.is_empty() {
            return Err(ServiceError::validation("updates", "must change at least one field"));
        }
        let updates = ListUpdates {
            name: updates
                .name
                .as_deref()
                .map(|name| validate_text("name", name, MAX_NAME_LEN))
                .transpose()?,
            position: updates.position.map(validate_position).transpose()?,
        };

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        let list = record
            .lists
            .get_mut(list_id)
            .ok_or_else(|| ServiceError::not_found("list", list_id))?;

        if list.apply(&updates) {
            list.updated_at = Utc::now();
        }
        let list = list.clone();

        Ok(record.stamp(list))
    }

    async fn delete_list(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
    ) -> Result<Committed<List>, ServiceError> {
        self.ensure_available()?;

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        let list = record
            .lists
            .remove(list_id)
            .ok_or_else(|| ServiceError::not_found("list", list_id))?;

        let before = record.cards.len();
        record.cards.retain(|_, card| &card.list_id != list_id);
        tracing::debug!(
            "[Store] Deleted list {} and {} cards",
            list_id,
            before - record.cards.len()
        );

        Ok(record.stamp(list))
    }

    async fn create_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        list_id: &ListId,
        title: &str,
        position: Option<Position>,
    ) -> Result<Committed<Card>, ServiceError> {
        self.ensure_available()?;
        let title = validate_text("title", title, MAX_TITLE_LEN)?;
        let position = position.map(validate_position).transpose()?;

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        if !record.lists.contains_key(list_id) {
            return Err(ServiceError::not_found("list", list_id));
        }

        let position = match position {
            Some(position) => position,
            None => {
                self.allocator
                    .allocate(&record.card_siblings(list_id), None, &Placement::end())
                    .position
            }
        };

        let card = Card::new(CardId::generate(), list_id.clone(), title, position);
        record.cards.insert(card.id.clone(), card.clone());

        tracing::debug!("[Store] Committed card {} in {} at {}", card.id, list_id, card.position);
        Ok(record.stamp(card))
    }

    async fn update_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        updates: &CardUpdates,
    ) -> Result<Committed<Card>, ServiceError> {
        self.ensure_available()?;
        if updates.is_empty() {
            return Err(ServiceError::validation("updates", "must change at least one field"));
        }
        let updates = CardUpdates {
            title: updates
                .title
                .as_deref()
                .map(|title| validate_text("title", title, MAX_TITLE_LEN))
                .transpose()?,
            description: updates.description.clone(),
            position: updates.position.map(validate_position).transpose()?,
        };

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        let card = record
            .cards
            .get_mut(card_id)
            .ok_or_else(|| ServiceError::not_found("card", card_id))?;

        if card.apply(&updates) {
            card.updated_at = Utc::now();
        }
        let card = card.clone();

        Ok(record.stamp(card))
    }

    async fn delete_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        list_id: &ListId,
    ) -> Result<Committed<Card>, ServiceError> {
        self.ensure_available()?;

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        let card = record
            .cards
            .remove(card_id)
            .ok_or_else(|| ServiceError::not_found("card", card_id))?;

        if &card.list_id != list_id {
            tracing::debug!(
                "[Store] Card {} deleted from {}, caller expected {}",
                card_id,
                card.list_id,
                list_id
            );
        }

        Ok(record.stamp(card))
    }

    async fn move_card(
        &self,
        actor: &Actor,
        board_id: &BoardId,
        card_id: &CardId,
        from_list_id: &ListId,
        to_list_id: &ListId,
        position: Position,
    ) -> Result<Committed<CardMove>, ServiceError> {
        self.ensure_available()?;
        let position = validate_position(position)?;

        let mut boards = self.boards.write().await;
        let record = open_board(&mut boards, actor, board_id)?;
        if !record.lists.contains_key(to_list_id) {
            return Err(ServiceError::not_found("list", to_list_id));
        }
        let card = record
            .cards
            .get_mut(card_id)
            .ok_or_else(|| ServiceError::not_found("card", card_id))?;

        let previous = card.list_id.clone();
        if &previous != from_list_id {
            tracing::debug!(
                "[Store] Card {} moved from {}, caller expected {}",
                card_id,
                previous,
                from_list_id
            );
        }

        card.list_id = to_list_id.clone();
        card.position = position;
        card.updated_at = Utc::now();
        let moved = CardMove {
            card: card.clone(),
            from_list_id: previous,
        };

        Ok(record.stamp(moved))
    }
}

#[async_trait]
impl QueryService for MemoryBoardStore {
    async fn snapshot(&self, actor: &Actor, board_id: &BoardId) -> Result<BoardSnapshot, ServiceError> {
        self.check_access(actor, board_id).await?;

        let boards = self.boards.read().await;
        let record = boards
            .get(board_id)
            .ok_or_else(|| ServiceError::not_found("board", board_id))?;

        Ok(BoardSnapshot::from_parts(
            board_id.clone(),
            record.lists.values().cloned().collect(),
            record.cards.values().cloned().collect(),
        ))
    }

    async fn check_access(&self, actor: &Actor, board_id: &BoardId) -> Result<(), ServiceError> {
        self.ensure_available()?;

        let boards = self.boards.read().await;
        let record = boards
            .get(board_id)
            .ok_or_else(|| ServiceError::not_found("board", board_id))?;
        if !record.admits(actor) {
            return Err(ServiceError::AccessDenied {
                board_id: board_id.clone(),
            });
        }
        Ok(())
    }
}
