//! Board fixtures and an in-process server harness
//!
//! `TestServer` wires a `MemoryBoardStore` into a `Broadcaster` exactly the
//! way `AppState` does, and `TestClient` stands in for one WebSocket
//! connection: intents go straight to `Broadcaster::handle`, and everything
//! the server would write to the socket lands in the client's inbox.

use taskboard::shared::{BoardId, Card, CardId, List, ListId, Position};

/// Board id used by fixtures that never touch a store
pub fn board_id() -> BoardId {
    BoardId::new("b1")
}

pub fn list(id: &str, position: i64) -> List {
    List::new(ListId::new(id), board_id(), id, Position::from_units(position))
}

pub fn card(id: &str, list_id: &str, title: &str, position: i64) -> Card {
    Card::new(
        CardId::new(id),
        ListId::new(list_id),
        title,
        Position::from_units(position),
    )
}

#[cfg(feature = "ssr")]
pub use harness::*;

#[cfg(feature = "ssr")]
mod harness {
    use std::collections::HashSet;
    use std::sync::Arc;
    use taskboard::backend::realtime::{Broadcaster, ChannelRegistry, ConnectionHandle, Outcome};
    use taskboard::backend::{Actor, MemoryBoardStore, QueryService};
    use taskboard::shared::{BoardEvent, BoardId, BoardSnapshot, ClientMessage, Intent, ServerMessage, UserId};
    use tokio::sync::mpsc;

    /// Store plus broadcaster, no HTTP
    pub struct TestServer {
        pub store: Arc<MemoryBoardStore>,
        pub broadcaster: Broadcaster,
    }

    impl TestServer {
        pub fn new() -> Self {
            let store = Arc::new(MemoryBoardStore::default());
            let broadcaster = Broadcaster::new(ChannelRegistry::new(), store.clone(), store.clone());
            Self { store, broadcaster }
        }

        /// Create a board open to every actor
        pub async fn open_board(&self, name: &str) -> BoardId {
            crate::assert_ok!(self.store.create_board(name, None).await).id
        }

        /// Create a board restricted to the given users
        pub async fn private_board(&self, name: &str, members: &[&str]) -> BoardId {
            let members: HashSet<UserId> = members.iter().map(|m| UserId::new(*m)).collect();
            crate::assert_ok!(self.store.create_board(name, Some(members)).await).id
        }

        /// Open an anonymous connection
        pub fn connect(&self) -> TestClient {
            self.connect_as(None)
        }

        /// Open a connection acting as `user`
        pub fn connect_as(&self, user: Option<&str>) -> TestClient {
            let (handle, inbox) = ConnectionHandle::channel();
            let actor = Actor::new(handle.id(), user.map(UserId::new));
            TestClient {
                broadcaster: self.broadcaster.clone(),
                handle,
                actor,
                inbox,
            }
        }

        /// Authoritative snapshot, as a fresh bulk fetch would see it
        pub async fn fetch(&self, board_id: &BoardId) -> BoardSnapshot {
            crate::assert_ok!(self.store.snapshot(&Actor::anonymous(), board_id).await)
        }
    }

    /// One simulated connection
    pub struct TestClient {
        broadcaster: Broadcaster,
        pub handle: ConnectionHandle,
        pub actor: Actor,
        pub inbox: mpsc::UnboundedReceiver<ServerMessage>,
    }

    impl TestClient {
        /// Send one intent and wait for the broadcaster to finish it
        pub async fn send(&self, message: ClientMessage) -> Outcome {
            self.broadcaster.handle(&self.handle, &self.actor, message).await
        }

        pub async fn send_intent(&self, intent: Intent) -> Outcome {
            self.send(ClientMessage::new(intent)).await
        }

        pub async fn join(&mut self, board_id: &BoardId) {
            let outcome = self
                .send_intent(Intent::Join {
                    board_id: board_id.clone(),
                })
                .await;
            assert_eq!(outcome, Outcome::Joined);
            assert_eq!(
                self.drain(),
                vec![ServerMessage::Joined {
                    board_id: board_id.clone()
                }]
            );
        }

        /// Everything delivered so far
        pub fn drain(&mut self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Ok(message) = self.inbox.try_recv() {
                messages.push(message);
            }
            messages
        }

        /// Board events delivered so far, with their correlation tokens
        pub fn events(&mut self) -> Vec<(Option<String>, BoardEvent)> {
            self.drain()
                .into_iter()
                .filter_map(|message| match message {
                    ServerMessage::Event { correlation, event } => Some((correlation, event)),
                    _ => None,
                })
                .collect()
        }
    }
}
