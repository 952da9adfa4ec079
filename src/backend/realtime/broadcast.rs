/**
 * Board Event Broadcaster
 *
 * Receives intents from a connection, delegates mutations to the
 * authoritative `MutationService`, and fans the committed canonical result out
 * to every connection joined to the board's channel.
 *
 * # Publishing Rules
 *
 * - An event is published strictly after the mutation service returns, and
 *   never ahead of an earlier commit on the same board (see `sequencer`), so
 *   per-board delivery order matches commit order.
 * - The originating connection always receives the result, carrying its
 *   correlation token, whether or not it has joined the board.
 * - A rejected intent is reported to the origin only. Nothing is broadcast.
 * - Connections whose outbox is gone are pruned from the registry.
 *
 * No per-board lock is held while awaiting a commit. A result that overtakes
 * an earlier commit is held and fanned out by whichever task publishes the
 * commit it was waiting for.
 */
use crate::backend::mutation::{Actor, Committed, MutationService, QueryService, ServiceError};
use crate::backend::realtime::registry::{ChannelRegistry, ConnectionHandle};
use crate::backend::realtime::sequencer::PublishQueue;
use crate::shared::event::{BoardEvent, ServerMessage};
use crate::shared::ids::BoardId;
use crate::shared::intent::{ClientMessage, Intent};
use std::sync::Arc;

/// What handling one intent did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The origin joined (or was already in) the board channel
    Joined,
    /// The origin left (or was not in) the board channel
    Left,
    /// The mutation committed and its event reached `recipients` connections
    Published { recipients: usize },
    /// The mutation committed ahead of an unpublished earlier commit; its
    /// event goes out right after that one
    Queued,
    /// The intent was rejected; only the origin was told
    Rejected(ServiceError),
}

/// A committed event waiting for its turn
struct Pending {
    origin: ConnectionHandle,
    correlation: Option<String>,
    event: BoardEvent,
}

/// Intent dispatcher and board-scoped fan-out
#[derive(Clone)]
pub struct Broadcaster {
    registry: ChannelRegistry,
    mutations: Arc<dyn MutationService>,
    queries: Arc<dyn QueryService>,
    order: Arc<PublishQueue<Pending>>,
}

impl Broadcaster {
    pub fn new(
        registry: ChannelRegistry,
        mutations: Arc<dyn MutationService>,
        queries: Arc<dyn QueryService>,
    ) -> Self {
        Self {
            registry,
            mutations,
            queries,
            order: Arc::new(PublishQueue::new()),
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Handle one intent from `origin` to completion
    pub async fn handle(&self, origin: &ConnectionHandle, actor: &Actor, message: ClientMessage) -> Outcome {
        let ClientMessage { correlation, intent } = message;
        tracing::debug!("[Broadcast] {} sent {}", origin.id(), intent.name());

        let mutations = &self.mutations;
        let committed = match intent {
            Intent::Join { board_id } => return self.join(origin, actor, correlation, board_id).await,
            Intent::Leave { board_id } => {
                self.registry.leave(&board_id, origin.id());
                origin.send(ServerMessage::Left { board_id });
                return Outcome::Left;
            }
            Intent::CreateList {
                board_id,
                name,
                position,
            } => mutations
                .create_list(actor, &board_id, &name, position)
                .await
                .map(|committed| committed.map(|list| BoardEvent::ListCreated { list })),
            Intent::UpdateList {
                board_id,
                list_id,
                updates,
            } => mutations
                .update_list(actor, &board_id, &list_id, &updates)
                .await
                .map(|committed| committed.map(|list| BoardEvent::ListUpdated { list })),
            Intent::DeleteList { board_id, list_id } => mutations
                .delete_list(actor, &board_id, &list_id)
                .await
                .map(|committed| {
                    committed.map(|list| BoardEvent::ListDeleted {
                        board_id,
                        list_id: list.id,
                    })
                }),
            Intent::CreateCard {
                board_id,
                list_id,
                title,
                position,
            } => mutations
                .create_card(actor, &board_id, &list_id, &title, position)
                .await
                .map(|committed| committed.map(|card| BoardEvent::CardCreated { board_id, card })),
            Intent::UpdateCard {
                board_id,
                card_id,
                updates,
            } => mutations
                .update_card(actor, &board_id, &card_id, &updates)
                .await
                .map(|committed| committed.map(|card| BoardEvent::CardUpdated { board_id, card })),
            Intent::DeleteCard {
                board_id,
                card_id,
                list_id,
            } => mutations
                .delete_card(actor, &board_id, &card_id, &list_id)
                .await
                .map(|committed| {
                    committed.map(|card| BoardEvent::CardDeleted {
                        board_id,
                        card_id: card.id,
                        list_id: card.list_id,
                    })
                }),
            Intent::MoveCard {
                board_id,
                card_id,
                from_list_id,
                to_list_id,
                position,
            } => mutations
                .move_card(actor, &board_id, &card_id, &from_list_id, &to_list_id, position)
                .await
                .map(|committed| {
                    committed.map(|moved| BoardEvent::CardMoved {
                        board_id,
                        card: moved.card,
                        from_list_id: moved.from_list_id,
                    })
                }),
        };

        // no await point between the commit returning and its release
        match committed {
            Ok(Committed { sequence, value: event }) => {
                let board_id = event.board_id().clone();
                let pending = Pending {
                    origin: origin.clone(),
                    correlation,
                    event,
                };
                let released = self.order.release(&board_id, sequence, pending, |pending| {
                    self.publish(&pending.origin, pending.correlation, pending.event)
                });
                match released {
                    Some(recipients) => Outcome::Published { recipients },
                    None => Outcome::Queued,
                }
            }
            Err(error) => self.reject(origin, correlation, error),
        }
    }

    async fn join(
        &self,
        origin: &ConnectionHandle,
        actor: &Actor,
        correlation: Option<String>,
        board_id: BoardId,
    ) -> Outcome {
        if let Err(error) = self.queries.check_access(actor, &board_id).await {
            return self.reject(origin, correlation, error);
        }
        self.registry.join(&board_id, origin.clone());
        origin.send(ServerMessage::Joined { board_id });
        Outcome::Joined
    }

    /// Fan a committed event out to the board channel and the origin
    fn publish(&self, origin: &ConnectionHandle, correlation: Option<String>, event: BoardEvent) -> usize {
        let board_id = event.board_id().clone();
        let name = event.name();
        let members = self.registry.members(&board_id);

        let shared = ServerMessage::event(None, event.clone());
        let own = ServerMessage::event(correlation, event);

        let mut recipients = 0;
        let mut dead = Vec::new();
        let mut origin_reached = false;

        for member in &members {
            let delivered = if member.id() == origin.id() {
                origin_reached = true;
                member.send(own.clone())
            } else {
                member.send(shared.clone())
            };
            if delivered {
                recipients += 1;
            } else {
                dead.push(member.id());
            }
        }

        if !origin_reached && origin.send(own) {
            recipients += 1;
        }

        for connection_id in dead {
            tracing::warn!("[Broadcast] Dropping closed connection {}", connection_id);
            self.registry.disconnect(connection_id);
        }

        tracing::info!("[Broadcast] {} on board {} sent to {} connections", name, board_id, recipients);
        recipients
    }

    fn reject(&self, origin: &ConnectionHandle, correlation: Option<String>, error: ServiceError) -> Outcome {
        tracing::warn!("[Broadcast] Rejected intent from {}: {}", origin.id(), error);
        origin.send(ServerMessage::error(correlation, error.kind(), error.to_string()));
        Outcome::Rejected(error)
    }
}
