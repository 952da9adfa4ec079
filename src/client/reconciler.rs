//! # Reconciler
//!
//! Merges three update sources into one board cache:
//!
//! - **Snapshots**: a bulk fetch replaces the cache and discards every
//!   pending optimistic edit
//! - **Local edits**: creates and moves are applied immediately with a
//!   temporary id and a provisional position from the allocator, and return
//!   the intents to send
//! - **Server events**: canonical entities replace, insert, move or remove
//!   cached entities by identity
//!
//! ## Matching confirmed creates
//!
//! A `*.created` event resolves the optimistic entity it confirms in this
//! order:
//!
//! 1. the event's `ref` names a pending create: the temp entity is replaced
//! 2. otherwise a temp entity with equal name/title and equal position is
//!    replaced
//! 3. otherwise the entity is inserted, or replaced if its permanent id is
//!    already cached
//!
//! Every event handler finishes inside one `&mut self` call, so a moved card
//! is never visible in zero or two lists.

use crate::client::cache::BoardCache;
use crate::client::error::ClientError;
use crate::client::optimistic::{OptimisticManager, PendingChange};
use crate::shared::allocator::{Allocation, Placement, PositionAllocator};
use crate::shared::board::{BoardSnapshot, Card, CardUpdates, List, ListUpdates};
use crate::shared::event::{BoardEvent, ServerMessage};
use crate::shared::ids::{correlation_token, BoardId, CardId, ListId};
use crate::shared::intent::{ClientMessage, Intent};
use crate::shared::position::Position;

/// What applying one server message did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new entity was added
    Inserted,
    /// An optimistic entity was replaced by its confirmed counterpart
    Confirmed,
    /// A cached entity was replaced by id
    Replaced,
    /// An entity was removed
    Removed,
    /// A card changed list or position
    Moved,
    /// Nothing changed
    Ignored,
    /// A rejected optimistic edit was undone
    RolledBack,
}

/// Result of a local optimistic operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged<I> {
    /// Id of the affected entity (temporary for creates)
    pub id: I,
    /// Correlation token of the primary intent
    pub correlation: String,
    /// Intents to send, in order; rebalance updates precede the primary intent
    pub messages: Vec<ClientMessage>,
}

/// Client-side reconciler for one board
#[derive(Debug)]
pub struct Reconciler {
    cache: BoardCache,
    optimistic: OptimisticManager,
    allocator: PositionAllocator,
}

impl Reconciler {
    /// Reconciler over an empty board cache
    pub fn new(board_id: BoardId, allocator: PositionAllocator) -> Self {
        Self {
            cache: BoardCache::new(board_id),
            optimistic: OptimisticManager::new(),
            allocator,
        }
    }

    /// Reconciler seeded from a bulk snapshot
    pub fn from_snapshot(snapshot: BoardSnapshot, allocator: PositionAllocator) -> Self {
        Self {
            cache: BoardCache::from_snapshot(snapshot),
            optimistic: OptimisticManager::new(),
            allocator,
        }
    }

    pub fn board_id(&self) -> &BoardId {
        self.cache.board_id()
    }

    pub fn cache(&self) -> &BoardCache {
        &self.cache
    }

    /// Canonical snapshot of the cached state
    pub fn snapshot(&self) -> BoardSnapshot {
        self.cache.to_snapshot()
    }

    pub fn pending_count(&self) -> usize {
        self.optimistic.count_pending()
    }

    /// Replace the cache with a fresh fetch; returns the discarded edit count
    pub fn apply_snapshot(&mut self, snapshot: BoardSnapshot) -> usize {
        if &snapshot.board_id != self.cache.board_id() {
            tracing::warn!(
                "[Reconciler] Snapshot for board {} applied to cache of board {}",
                snapshot.board_id,
                self.cache.board_id()
            );
        }
        self.cache = BoardCache::from_snapshot(snapshot);
        let discarded = self.optimistic.clear_all();
        if discarded > 0 {
            tracing::info!("[Reconciler] Snapshot discarded {} pending edits", discarded);
        }
        discarded
    }

    /// Optimistically create a list
    pub fn create_list(&mut self, name: impl Into<String>, placement: Placement<ListId>) -> Staged<ListId> {
        let name = name.into();
        let mut messages = Vec::new();
        let allocation = self.allocate_list(None, &placement, &mut messages);

        let temp_id = ListId::temporary();
        let list = List::new(
            temp_id.clone(),
            self.cache.board_id().clone(),
            name.clone(),
            allocation.position,
        );
        self.cache.upsert_list(list);

        let correlation = correlation_token();
        self.optimistic.apply(
            correlation.clone(),
            PendingChange::CreateList {
                temp_id: temp_id.clone(),
            },
        );
        messages.push(ClientMessage::with_ref(
            correlation.clone(),
            Intent::CreateList {
                board_id: self.cache.board_id().clone(),
                name,
                position: Some(allocation.position),
            },
        ));

        Staged {
            id: temp_id,
            correlation,
            messages,
        }
    }

    /// Optimistically create a card in a confirmed list
    pub fn create_card(
        &mut self,
        list_id: &ListId,
        title: impl Into<String>,
        placement: Placement<CardId>,
    ) -> Result<Staged<CardId>, ClientError> {
        self.require_confirmed_list(list_id)?;

        let title = title.into();
        let mut messages = Vec::new();
        let allocation = self.allocate_card(list_id, None, &placement, &mut messages);

        let temp_id = CardId::temporary();
        let card = Card::new(temp_id.clone(), list_id.clone(), title.clone(), allocation.position);
        self.cache.upsert_card(card);

        let correlation = correlation_token();
        self.optimistic.apply(
            correlation.clone(),
            PendingChange::CreateCard {
                temp_id: temp_id.clone(),
                list_id: list_id.clone(),
            },
        );
        messages.push(ClientMessage::with_ref(
            correlation.clone(),
            Intent::CreateCard {
                board_id: self.cache.board_id().clone(),
                list_id: list_id.clone(),
                title,
                position: Some(allocation.position),
            },
        ));

        Ok(Staged {
            id: temp_id,
            correlation,
            messages,
        })
    }

    /// Optimistically move a card within or across lists
    pub fn move_card(
        &mut self,
        card_id: &CardId,
        to_list_id: &ListId,
        placement: Placement<CardId>,
    ) -> Result<Staged<CardId>, ClientError> {
        if card_id.is_temporary() {
            return Err(ClientError::Unconfirmed(card_id.to_string()));
        }
        let previous = self
            .cache
            .card(card_id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownCard(card_id.to_string()))?;
        self.require_confirmed_list(to_list_id)?;

        let mut messages = Vec::new();
        let allocation = self.allocate_card(to_list_id, Some(card_id), &placement, &mut messages);

        let mut moved = previous.clone();
        moved.list_id = to_list_id.clone();
        moved.position = allocation.position;
        self.cache.move_card(&previous.list_id, moved);

        let correlation = correlation_token();
        let from_list_id = previous.list_id.clone();
        self.optimistic
            .apply(correlation.clone(), PendingChange::MoveCard { previous });
        messages.push(ClientMessage::with_ref(
            correlation.clone(),
            Intent::MoveCard {
                board_id: self.cache.board_id().clone(),
                card_id: card_id.clone(),
                from_list_id,
                to_list_id: to_list_id.clone(),
                position: allocation.position,
            },
        ));

        Ok(Staged {
            id: card_id.clone(),
            correlation,
            messages,
        })
    }

    /// Optimistically reorder a list on the board
    pub fn move_list(
        &mut self,
        list_id: &ListId,
        placement: Placement<ListId>,
    ) -> Result<Staged<ListId>, ClientError> {
        self.require_confirmed_list(list_id)?;
        let previous = self
            .cache
            .list(list_id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownList(list_id.to_string()))?;

        let mut messages = Vec::new();
        let allocation = self.allocate_list(Some(list_id), &placement, &mut messages);

        let mut moved = previous.clone();
        moved.position = allocation.position;
        self.cache.upsert_list(moved);

        let correlation = correlation_token();
        self.optimistic
            .apply(correlation.clone(), PendingChange::MoveList { previous });
        messages.push(ClientMessage::with_ref(
            correlation.clone(),
            Intent::UpdateList {
                board_id: self.cache.board_id().clone(),
                list_id: list_id.clone(),
                updates: ListUpdates::position(allocation.position),
            },
        ));

        Ok(Staged {
            id: list_id.clone(),
            correlation,
            messages,
        })
    }

    /// Apply any server message
    pub fn apply_message(&mut self, message: &ServerMessage) -> Applied {
        match message {
            ServerMessage::Event { correlation, event } => self.apply_event(event, correlation.as_deref()),
            ServerMessage::Error {
                correlation: Some(correlation),
                error,
            } => {
                tracing::warn!(
                    "[Reconciler] Intent {} rejected ({:?}): {}",
                    correlation,
                    error.kind,
                    error.message
                );
                self.reject(correlation)
            }
            ServerMessage::Error { correlation: None, error } => {
                tracing::warn!("[Reconciler] Uncorrelated error ({:?}): {}", error.kind, error.message);
                Applied::Ignored
            }
            ServerMessage::Joined { .. } | ServerMessage::Left { .. } => Applied::Ignored,
        }
    }

    /// Apply one board event, with the correlation token if it was ours
    pub fn apply_event(&mut self, event: &BoardEvent, correlation: Option<&str>) -> Applied {
        if event.board_id() != self.cache.board_id() {
            tracing::debug!(
                "[Reconciler] Ignoring {} for board {}",
                event.name(),
                event.board_id()
            );
            return Applied::Ignored;
        }

        let pending = correlation.and_then(|token| self.optimistic.confirm(token));
        tracing::debug!(
            "[Reconciler] Applying {} (correlated: {})",
            event.name(),
            pending.is_some()
        );

        match event {
            BoardEvent::ListCreated { list } => self.list_created(list, pending),
            BoardEvent::ListUpdated { list } => {
                if self.cache.upsert_list(list.clone()) {
                    Applied::Inserted
                } else {
                    Applied::Replaced
                }
            }
            BoardEvent::ListDeleted { list_id, .. } => match self.cache.remove_list(list_id) {
                Some(_) => Applied::Removed,
                None => Applied::Ignored,
            },
            BoardEvent::CardCreated { card, .. } => self.card_created(card, pending),
            BoardEvent::CardUpdated { card, .. } => match self.cache.upsert_card(card.clone()) {
                Some(_) => Applied::Replaced,
                None => Applied::Inserted,
            },
            BoardEvent::CardDeleted { card_id, .. } => match self.cache.remove_card(card_id) {
                Some(_) => Applied::Removed,
                None => Applied::Ignored,
            },
            BoardEvent::CardMoved {
                card, from_list_id, ..
            } => {
                self.cache.move_card(from_list_id, card.clone());
                Applied::Moved
            }
        }
    }

    /// Undo the optimistic edit behind a rejected intent
    pub fn reject(&mut self, correlation: &str) -> Applied {
        let Some(change) = self.optimistic.rollback(correlation) else {
            return Applied::Ignored;
        };

        match change {
            PendingChange::CreateList { temp_id } => match self.cache.remove_list(&temp_id) {
                Some(_) => Applied::RolledBack,
                None => Applied::Ignored,
            },
            PendingChange::CreateCard { temp_id, .. } => match self.cache.remove_card(&temp_id) {
                Some(_) => Applied::RolledBack,
                None => Applied::Ignored,
            },
            PendingChange::MoveCard { previous } => {
                if !self.cache.contains_list(&previous.list_id) {
                    return Applied::Ignored;
                }
                // the destination list may have been deleted, taking the card with it
                let Some(current) = self.cache.card(&previous.id).cloned() else {
                    tracing::debug!("[Reconciler] Reinstating card {} in {}", previous.id, previous.list_id);
                    self.cache.upsert_card(previous);
                    return Applied::RolledBack;
                };
                let mut restored = current.clone();
                restored.list_id = previous.list_id;
                restored.position = previous.position;
                self.cache.move_card(&current.list_id, restored);
                Applied::RolledBack
            }
            PendingChange::MoveList { previous } => {
                let Some(mut restored) = self.cache.list(&previous.id).cloned() else {
                    return Applied::Ignored;
                };
                restored.position = previous.position;
                self.cache.upsert_list(restored);
                Applied::RolledBack
            }
        }
    }

    fn list_created(&mut self, list: &List, pending: Option<PendingChange>) -> Applied {
        if let Some(PendingChange::CreateList { temp_id }) = pending {
            self.cache.replace_list(&temp_id, list.clone());
            return Applied::Confirmed;
        }
        if let Some(temp_id) = self.cache.find_temp_list(&list.name, list.position) {
            tracing::debug!("[Reconciler] Matched {} to temporary list {}", list.id, temp_id);
            self.cache.replace_list(&temp_id, list.clone());
            return Applied::Confirmed;
        }
        if self.cache.upsert_list(list.clone()) {
            Applied::Inserted
        } else {
            Applied::Replaced
        }
    }

    fn card_created(&mut self, card: &Card, pending: Option<PendingChange>) -> Applied {
        if let Some(PendingChange::CreateCard { temp_id, .. }) = pending {
            self.cache.replace_card(&temp_id, card.clone());
            return Applied::Confirmed;
        }
        if let Some(temp_id) = self.cache.find_temp_card(&card.list_id, &card.title, card.position) {
            tracing::debug!("[Reconciler] Matched {} to temporary card {}", card.id, temp_id);
            self.cache.replace_card(&temp_id, card.clone());
            return Applied::Confirmed;
        }
        match self.cache.upsert_card(card.clone()) {
            Some(_) => Applied::Replaced,
            None => Applied::Inserted,
        }
    }

    fn require_confirmed_list(&self, list_id: &ListId) -> Result<(), ClientError> {
        if list_id.is_temporary() {
            return Err(ClientError::Unconfirmed(list_id.to_string()));
        }
        if !self.cache.contains_list(list_id) {
            return Err(ClientError::UnknownList(list_id.to_string()));
        }
        Ok(())
    }

    fn allocate_list(
        &mut self,
        moving: Option<&ListId>,
        placement: &Placement<ListId>,
        messages: &mut Vec<ClientMessage>,
    ) -> Allocation {
        let allocation = self
            .allocator
            .allocate(&self.cache.list_siblings(), moving, placement);
        if !allocation.needs_rebalance() {
            return allocation;
        }

        tracing::info!("[Reconciler] Renumbering lists of board {}", self.cache.board_id());
        let siblings: Vec<(ListId, Position)> = self
            .cache
            .list_siblings()
            .into_iter()
            .filter(|(id, _)| Some(id) != moving)
            .collect();
        for (list_id, position) in self.allocator.renumber(&siblings) {
            let Some(previous) = self.cache.list(&list_id).cloned() else {
                continue;
            };
            if previous.position == position {
                continue;
            }
            let mut renumbered = previous.clone();
            renumbered.position = position;
            self.cache.upsert_list(renumbered);

            if list_id.is_temporary() {
                continue;
            }
            let correlation = correlation_token();
            self.optimistic
                .apply(correlation.clone(), PendingChange::MoveList { previous });
            messages.push(ClientMessage::with_ref(
                correlation,
                Intent::UpdateList {
                    board_id: self.cache.board_id().clone(),
                    list_id,
                    updates: ListUpdates::position(position),
                },
            ));
        }

        self.allocator
            .allocate(&self.cache.list_siblings(), moving, placement)
    }

    fn allocate_card(
        &mut self,
        list_id: &ListId,
        moving: Option<&CardId>,
        placement: &Placement<CardId>,
        messages: &mut Vec<ClientMessage>,
    ) -> Allocation {
        let allocation = self
            .allocator
            .allocate(&self.cache.card_siblings(list_id), moving, placement);
        if !allocation.needs_rebalance() {
            return allocation;
        }

        tracing::info!("[Reconciler] Renumbering cards of list {}", list_id);
        let siblings: Vec<(CardId, Position)> = self
            .cache
            .card_siblings(list_id)
            .into_iter()
            .filter(|(id, _)| Some(id) != moving)
            .collect();
        for (card_id, position) in self.allocator.renumber(&siblings) {
            let Some(previous) = self.cache.card(&card_id).cloned() else {
                continue;
            };
            if previous.position == position {
                continue;
            }
            let mut renumbered = previous.clone();
            renumbered.position = position;
            self.cache.upsert_card(renumbered);

            if card_id.is_temporary() {
                continue;
            }
            let correlation = correlation_token();
            self.optimistic
                .apply(correlation.clone(), PendingChange::MoveCard { previous });
            messages.push(ClientMessage::with_ref(
                correlation,
                Intent::UpdateCard {
                    board_id: self.cache.board_id().clone(),
                    card_id,
                    updates: CardUpdates::position(position),
                },
            ));
        }

        self.allocator
            .allocate(&self.cache.card_siblings(list_id), moving, placement)
    }
}
