//! # Board Cache
//!
//! Normalized client-side copy of one board: the ordered lists, and per list
//! an ordered card bucket. Every collection is kept sorted by
//! `(position, id)`, the same order the query service uses for snapshots, so
//! a cache can be compared to a fresh fetch with `==` on
//! [`BoardCache::to_snapshot`].
//!
//! Each mutating method completes within one `&mut self` call. A card that
//! changes list is removed from its old bucket and inserted into the new one
//! before the method returns, so no reader can observe it in zero or two
//! lists.

use crate::shared::board::{BoardSnapshot, Card, List};
use crate::shared::ids::{BoardId, CardId, ListId};
use crate::shared::position::Position;
use std::collections::HashMap;

/// Normalized list and card cache for one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardCache {
    board_id: BoardId,
    lists: Vec<List>,
    cards: HashMap<ListId, Vec<Card>>,
}

fn sort_lists(lists: &mut [List]) {
    lists.sort_by(|a, b| (a.position, &a.id).cmp(&(b.position, &b.id)));
}

fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| (a.position, &a.id).cmp(&(b.position, &b.id)));
}

impl BoardCache {
    /// Empty cache for a board
    pub fn new(board_id: BoardId) -> Self {
        Self {
            board_id,
            lists: Vec::new(),
            cards: HashMap::new(),
        }
    }

    /// Build a cache from a bulk snapshot
    pub fn from_snapshot(snapshot: BoardSnapshot) -> Self {
        let mut cache = Self::new(snapshot.board_id);
        cache.lists = snapshot.lists;
        sort_lists(&mut cache.lists);
        for list in &cache.lists {
            cache.cards.entry(list.id.clone()).or_default();
        }
        for card in snapshot.cards {
            cache.cards.entry(card.list_id.clone()).or_default().push(card);
        }
        for bucket in cache.cards.values_mut() {
            sort_cards(bucket);
        }
        cache
    }

    /// Canonical snapshot of the cached state
    pub fn to_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_parts(
            self.board_id.clone(),
            self.lists.clone(),
            self.cards.values().flatten().cloned().collect(),
        )
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Lists in render order
    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn list(&self, list_id: &ListId) -> Option<&List> {
        self.lists.iter().find(|list| &list.id == list_id)
    }

    pub fn contains_list(&self, list_id: &ListId) -> bool {
        self.list(list_id).is_some()
    }

    /// Cards of a list in render order (empty for unknown lists)
    pub fn cards(&self, list_id: &ListId) -> &[Card] {
        self.cards.get(list_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards
            .values()
            .flat_map(|bucket| bucket.iter())
            .find(|card| &card.id == card_id)
    }

    /// List whose bucket currently holds the card
    pub fn locate_card(&self, card_id: &CardId) -> Option<&ListId> {
        self.cards
            .iter()
            .find(|(_, bucket)| bucket.iter().any(|card| &card.id == card_id))
            .map(|(list_id, _)| list_id)
    }

    /// Total number of cached cards
    pub fn card_count(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    /// List ids and positions, for allocation
    pub fn list_siblings(&self) -> Vec<(ListId, Position)> {
        self.lists
            .iter()
            .map(|list| (list.id.clone(), list.position))
            .collect()
    }

    /// Card ids and positions within one list, for allocation
    pub fn card_siblings(&self, list_id: &ListId) -> Vec<(CardId, Position)> {
        self.cards(list_id)
            .iter()
            .map(|card| (card.id.clone(), card.position))
            .collect()
    }

    /// Insert or replace a list by id; returns `true` when newly inserted
    pub fn upsert_list(&mut self, list: List) -> bool {
        let inserted = match self.lists.iter_mut().find(|existing| existing.id == list.id) {
            Some(existing) => {
                *existing = list.clone();
                false
            }
            None => {
                self.lists.push(list.clone());
                true
            }
        };
        self.cards.entry(list.id).or_default();
        sort_lists(&mut self.lists);
        inserted
    }

    /// Remove a list and its cards
    pub fn remove_list(&mut self, list_id: &ListId) -> Option<(List, Vec<Card>)> {
        let index = self.lists.iter().position(|list| &list.id == list_id)?;
        let list = self.lists.remove(index);
        let cards = self.cards.remove(list_id).unwrap_or_default();
        Some((list, cards))
    }

    /// Replace a list with its confirmed counterpart under a new id
    ///
    /// Cards cached under the old id follow the list to the new id.
    pub fn replace_list(&mut self, old_id: &ListId, list: List) {
        let moved = match self.remove_list(old_id) {
            Some((_, cards)) => cards,
            None => Vec::new(),
        };
        let new_id = list.id.clone();
        self.upsert_list(list);
        if !moved.is_empty() {
            let bucket = self.cards.entry(new_id.clone()).or_default();
            for mut card in moved {
                card.list_id = new_id.clone();
                bucket.push(card);
            }
            sort_cards(bucket);
        }
    }

    /// Insert or replace a card by id, relocating it to `card.list_id`
    ///
    /// Returns the list the card was previously cached in, if any.
    pub fn upsert_card(&mut self, card: Card) -> Option<ListId> {
        let previous = self.take_card(&card.id).map(|old| old.list_id);
        let bucket = self.cards.entry(card.list_id.clone()).or_default();
        bucket.push(card);
        sort_cards(bucket);
        previous
    }

    /// Relocate a card from `from_list_id` into `card.list_id` in one step
    ///
    /// Falls back to wherever the card is currently cached when it is not in
    /// `from_list_id`. Returns whether the card was found anywhere.
    pub fn move_card(&mut self, from_list_id: &ListId, card: Card) -> bool {
        let found = match self.cards.get_mut(from_list_id) {
            Some(bucket) => match bucket.iter().position(|c| c.id == card.id) {
                Some(index) => {
                    bucket.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };
        let found = found || self.take_card(&card.id).is_some();

        let bucket = self.cards.entry(card.list_id.clone()).or_default();
        bucket.push(card);
        sort_cards(bucket);
        found
    }

    /// Remove a card wherever it is cached
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<Card> {
        self.take_card(card_id)
    }

    /// Replace a card with its confirmed counterpart under a new id
    pub fn replace_card(&mut self, old_id: &CardId, card: Card) {
        self.take_card(old_id);
        self.upsert_card(card);
    }

    /// Temporary list with the given name and position
    pub fn find_temp_list(&self, name: &str, position: Position) -> Option<ListId> {
        self.lists
            .iter()
            .find(|list| list.id.is_temporary() && list.name == name && list.position == position)
            .map(|list| list.id.clone())
    }

    /// Temporary card in a list with the given title and position
    pub fn find_temp_card(&self, list_id: &ListId, title: &str, position: Position) -> Option<CardId> {
        self.cards(list_id)
            .iter()
            .find(|card| card.id.is_temporary() && card.title == title && card.position == position)
            .map(|card| card.id.clone())
    }

    fn take_card(&mut self, card_id: &CardId) -> Option<Card> {
        for bucket in self.cards.values_mut() {
            if let Some(index) = bucket.iter().position(|card| &card.id == card_id) {
                return Some(bucket.remove(index));
            }
        }
        None
    }
}
