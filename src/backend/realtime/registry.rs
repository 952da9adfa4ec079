/**
 * Board Channel Registry
 *
 * Process-wide membership map from board id to the connections joined to
 * that board's channel. This is the only server-side shared mutable state in
 * the realtime core.
 *
 * # Concurrency
 *
 * The map sits behind an `Arc<std::sync::Mutex<..>>`. Join, leave and
 * disconnect are each one critical section, so membership is always updated
 * atomically. The lock is never held across an await point.
 *
 * # Lifecycle
 *
 * Channels are created lazily on first join and removed as soon as their
 * last member leaves. A reverse index from connection to boards lets a
 * disconnect clear every membership in one step.
 */
use crate::shared::event::ServerMessage;
use crate::shared::ids::{BoardId, ConnectionId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Outbound side of one persistent connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    /// Wrap a fresh connection outbox
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    /// Create a handle together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message; returns `false` when the connection is gone
    pub fn send(&self, message: ServerMessage) -> bool {
        self.sender.send(message).is_ok()
    }

    /// Whether the receiving end has been dropped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Debug, Default)]
struct Channels {
    boards: HashMap<BoardId, HashMap<ConnectionId, ConnectionHandle>>,
    memberships: HashMap<ConnectionId, HashSet<BoardId>>,
}

impl Channels {
    fn remove(&mut self, board_id: &BoardId, connection_id: ConnectionId) -> bool {
        let removed = match self.boards.get_mut(board_id) {
            Some(members) => {
                let removed = members.remove(&connection_id).is_some();
                if members.is_empty() {
                    self.boards.remove(board_id);
                }
                removed
            }
            None => false,
        };

        if let Some(boards) = self.memberships.get_mut(&connection_id) {
            boards.remove(board_id);
            if boards.is_empty() {
                self.memberships.remove(&connection_id);
            }
        }

        removed
    }
}

/// Board to connections membership registry
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Arc<Mutex<Channels>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        // Membership stays consistent per critical section, so a poisoned
        // lock still guards valid data
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a connection to a board channel; returns `false` if already joined
    pub fn join(&self, board_id: &BoardId, handle: ConnectionHandle) -> bool {
        let mut channels = self.lock();
        let connection_id = handle.id();
        let inserted = channels
            .boards
            .entry(board_id.clone())
            .or_default()
            .insert(connection_id, handle)
            .is_none();
        channels
            .memberships
            .entry(connection_id)
            .or_default()
            .insert(board_id.clone());

        if inserted {
            tracing::info!("[Realtime] {} joined board {}", connection_id, board_id);
        } else {
            tracing::debug!("[Realtime] {} already joined board {}", connection_id, board_id);
        }
        inserted
    }

    /// Remove a connection from a board channel; returns `false` if not joined
    pub fn leave(&self, board_id: &BoardId, connection_id: ConnectionId) -> bool {
        let removed = self.lock().remove(board_id, connection_id);
        if removed {
            tracing::info!("[Realtime] {} left board {}", connection_id, board_id);
        }
        removed
    }

    /// Remove a connection from every channel; returns the boards it left
    pub fn disconnect(&self, connection_id: ConnectionId) -> Vec<BoardId> {
        let mut channels = self.lock();
        let boards: Vec<BoardId> = channels
            .memberships
            .remove(&connection_id)
            .map(|boards| boards.into_iter().collect())
            .unwrap_or_default();

        for board_id in &boards {
            if let Some(members) = channels.boards.get_mut(board_id) {
                members.remove(&connection_id);
                if members.is_empty() {
                    channels.boards.remove(board_id);
                }
            }
        }

        if !boards.is_empty() {
            tracing::info!(
                "[Realtime] {} disconnected from {} boards",
                connection_id,
                boards.len()
            );
        }
        boards
    }

    /// Handles of every connection joined to a board
    pub fn members(&self, board_id: &BoardId) -> Vec<ConnectionHandle> {
        self.lock()
            .boards
            .get(board_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a connection is joined to a board
    pub fn is_member(&self, board_id: &BoardId, connection_id: ConnectionId) -> bool {
        self.lock()
            .boards
            .get(board_id)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    /// Number of connections joined to a board
    pub fn subscriber_count(&self, board_id: &BoardId) -> usize {
        self.lock().boards.get(board_id).map_or(0, HashMap::len)
    }

    /// Number of boards with at least one member
    pub fn board_count(&self) -> usize {
        self.lock().boards.len()
    }

    /// Drop members whose connection has gone away
    pub fn cleanup_closed(&self) -> usize {
        let mut channels = self.lock();
        let closed: Vec<(BoardId, ConnectionId)> = channels
            .boards
            .iter()
            .flat_map(|(board_id, members)| {
                members
                    .values()
                    .filter(|handle| handle.is_closed())
                    .map(move |handle| (board_id.clone(), handle.id()))
            })
            .collect();

        for (board_id, connection_id) in &closed {
            channels.remove(board_id, *connection_id);
        }
        closed.len()
    }
}
