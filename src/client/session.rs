//! # Board Session
//!
//! Async wrapper around a [`Reconciler`] for one board connection. Local
//! actions are applied to the cache first and then queued on the outbox for
//! the connection writer; server messages are fed in through
//! [`BoardSession::handle`]. Observers watch a revision counter that is bumped
//! whenever the cache changes.
//!
//! A session never owns the transport. Whatever drives the socket drains the
//! outbox receiver returned by [`BoardSession::new`] and forwards decoded
//! [`ServerMessage`]s to `handle` (or hands a channel to [`BoardSession::run`]).

use crate::client::error::ClientError;
use crate::client::reconciler::{Applied, Reconciler, Staged};
use crate::client::remote::SnapshotSource;
use crate::shared::allocator::Placement;
use crate::shared::board::BoardSnapshot;
use crate::shared::event::ServerMessage;
use crate::shared::ids::{BoardId, CardId, ListId};
use crate::shared::intent::{ClientMessage, Intent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};

/// Shared handle to one board's reconciler and its outbound intent queue
#[derive(Debug, Clone)]
pub struct BoardSession {
    board_id: BoardId,
    reconciler: Arc<RwLock<Reconciler>>,
    outbox: mpsc::UnboundedSender<ClientMessage>,
    revision: Arc<watch::Sender<u64>>,
}

impl BoardSession {
    /// Create a session; the receiver yields intents to write to the connection
    pub fn new(reconciler: Reconciler) -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (outbox, receiver) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        let session = Self {
            board_id: reconciler.board_id().clone(),
            reconciler: Arc::new(RwLock::new(reconciler)),
            outbox,
            revision: Arc::new(revision),
        };
        (session, receiver)
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Revision counter bumped on every cache change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.reconciler.read().await.snapshot()
    }

    pub async fn pending_count(&self) -> usize {
        self.reconciler.read().await.pending_count()
    }

    /// Join the board channel
    pub fn join(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::new(Intent::Join {
            board_id: self.board_id.clone(),
        }))
    }

    /// Leave the board channel
    pub fn leave(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::new(Intent::Leave {
            board_id: self.board_id.clone(),
        }))
    }

    pub async fn create_list(
        &self,
        name: impl Into<String>,
        placement: Placement<ListId>,
    ) -> Result<ListId, ClientError> {
        let staged = self.reconciler.write().await.create_list(name, placement);
        self.dispatch(staged)
    }

    pub async fn create_card(
        &self,
        list_id: &ListId,
        title: impl Into<String>,
        placement: Placement<CardId>,
    ) -> Result<CardId, ClientError> {
        let staged = self
            .reconciler
            .write()
            .await
            .create_card(list_id, title, placement)?;
        self.dispatch(staged)
    }

    pub async fn move_card(
        &self,
        card_id: &CardId,
        to_list_id: &ListId,
        placement: Placement<CardId>,
    ) -> Result<(), ClientError> {
        let staged = self
            .reconciler
            .write()
            .await
            .move_card(card_id, to_list_id, placement)?;
        self.dispatch(staged).map(|_| ())
    }

    pub async fn move_list(&self, list_id: &ListId, placement: Placement<ListId>) -> Result<(), ClientError> {
        let staged = self.reconciler.write().await.move_list(list_id, placement)?;
        self.dispatch(staged).map(|_| ())
    }

    /// Apply one message received from the server
    pub async fn handle(&self, message: ServerMessage) -> Applied {
        let applied = self.reconciler.write().await.apply_message(&message);
        if applied != Applied::Ignored {
            self.bump();
        }
        applied
    }

    /// Apply server messages until the inbound channel closes
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<ServerMessage>) {
        while let Some(message) = inbound.recv().await {
            self.handle(message).await;
        }
        tracing::info!("[Session] Inbound stream for board {} closed", self.board_id);
    }

    /// Replace the cache with a fresh snapshot, discarding optimistic state
    pub async fn refresh<S: SnapshotSource + ?Sized>(&self, source: &S) -> Result<usize, ClientError> {
        let snapshot = source.fetch_snapshot(&self.board_id).await?;
        let discarded = self.reconciler.write().await.apply_snapshot(snapshot);
        self.bump();
        tracing::info!(
            "[Session] Refreshed board {} ({} pending edits discarded)",
            self.board_id,
            discarded
        );
        Ok(discarded)
    }

    fn dispatch<I>(&self, staged: Staged<I>) -> Result<I, ClientError> {
        self.bump();
        for message in staged.messages {
            self.send(message)?;
        }
        Ok(staged.id)
    }

    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.outbox.send(message).map_err(|_| {
            tracing::warn!("[Session] Outbox for board {} is closed", self.board_id);
            ClientError::Disconnected
        })
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
