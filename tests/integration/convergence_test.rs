//! End-to-end convergence tests
//!
//! Clients apply optimistic edits, send the resulting intents through the
//! broadcaster, and reconcile whatever lands in their inbox. After the last
//! event every cache must equal a fresh bulk fetch.

use crate::common::{TestClient, TestServer};
use async_trait::async_trait;
use std::sync::Arc;
use taskboard::backend::{Actor, MemoryBoardStore, QueryService};
use taskboard::client::{Applied, BoardSession, ClientError, Reconciler, SnapshotSource};
use taskboard::shared::{
    BoardEvent, BoardId, BoardSnapshot, Card, CardId, CardUpdates, Intent, List, ListId, Placement, Position,
    PositionAllocator,
};

/// Snapshot source reading straight from the store
struct StoreSource(Arc<MemoryBoardStore>);

#[async_trait]
impl SnapshotSource for StoreSource {
    async fn fetch_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot, ClientError> {
        self.0
            .snapshot(&Actor::anonymous(), board_id)
            .await
            .map_err(|error| ClientError::Status {
                status: 500,
                message: error.to_string(),
            })
    }
}

async fn reconciler_for(server: &TestServer, board_id: &BoardId) -> Reconciler {
    Reconciler::from_snapshot(server.fetch(board_id).await, PositionAllocator::default())
}

/// Apply every message waiting in the client's inbox
fn deliver(reconciler: &mut Reconciler, client: &mut TestClient) -> Vec<Applied> {
    client
        .drain()
        .iter()
        .map(|message| reconciler.apply_message(message))
        .collect()
}

async fn send_all(client: &TestClient, messages: Vec<taskboard::shared::ClientMessage>) {
    for message in messages {
        client.send(message).await;
    }
}

#[tokio::test]
async fn test_todo_list_appears_once_for_origin_and_subscriber() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;
    let mut alice_view = reconciler_for(&server, &board_id).await;
    let mut bob_view = reconciler_for(&server, &board_id).await;

    let staged = alice_view.create_list("Todo", Placement::end());
    assert_eq!(alice_view.cache().lists()[0].position, Position::from_units(1000));
    send_all(&alice, staged.messages).await;

    assert_eq!(deliver(&mut alice_view, &mut alice), vec![Applied::Confirmed]);
    assert_eq!(deliver(&mut bob_view, &mut bob), vec![Applied::Inserted]);

    for view in [&alice_view, &bob_view] {
        let lists = view.cache().lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Todo");
        assert_eq!(lists[0].position, Position::from_units(1000));
        assert!(!lists[0].id.is_temporary());
    }
    let fresh = server.fetch(&board_id).await;
    assert_same_board!(alice_view.snapshot(), fresh.clone());
    assert_same_board!(bob_view.snapshot(), fresh);
    assert_eq!(alice_view.pending_count(), 0);
}

#[tokio::test]
async fn test_committed_sequence_converges_to_fresh_fetch() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut writer = server.connect();
    let mut observer = server.connect();
    writer.join(&board_id).await;
    observer.join(&board_id).await;

    // initial state: two lists and card B, committed before anyone caches
    let mut writer_view = reconciler_for(&server, &board_id).await;
    let l1 = writer_view.create_list("L1", Placement::end());
    send_all(&writer, l1.messages).await;
    let l2 = writer_view.create_list("L2", Placement::end());
    send_all(&writer, l2.messages).await;
    deliver(&mut writer_view, &mut writer);
    let lists: Vec<List> = writer_view.cache().lists().to_vec();
    let (l1, l2) = (lists[0].id.clone(), lists[1].id.clone());
    let b = assert_ok!(writer_view.create_card(&l1, "B", Placement::end()));
    send_all(&writer, b.messages).await;
    deliver(&mut writer_view, &mut writer);
    observer.drain();

    let mut observer_view = reconciler_for(&server, &board_id).await;
    let card_b = observer_view.cache().cards(&l1)[0].id.clone();

    // create A
    let a = assert_ok!(writer_view.create_card(&l1, "A", Placement::start()));
    send_all(&writer, a.messages).await;
    deliver(&mut writer_view, &mut writer);
    let card_a: CardId = writer_view
        .cache()
        .cards(&l1)
        .iter()
        .find(|card| card.title == "A")
        .map(|card| card.id.clone())
        .unwrap();
    assert!(!card_a.is_temporary());

    // update A
    writer
        .send_intent(Intent::UpdateCard {
            board_id: board_id.clone(),
            card_id: card_a.clone(),
            updates: CardUpdates {
                title: Some("A2".to_string()),
                description: Some("details".to_string()),
                position: None,
            },
        })
        .await;

    // move A from L1 to L2
    let moved = assert_ok!(writer_view.move_card(&card_a, &l2, Placement::end()));
    send_all(&writer, moved.messages).await;

    // delete B
    writer
        .send_intent(Intent::DeleteCard {
            board_id: board_id.clone(),
            card_id: card_b.clone(),
            list_id: l1.clone(),
        })
        .await;

    let applied = deliver(&mut observer_view, &mut observer);
    assert_eq!(
        applied,
        vec![
            Applied::Inserted,
            Applied::Replaced,
            Applied::Moved,
            Applied::Removed
        ]
    );
    deliver(&mut writer_view, &mut writer);

    let fresh = server.fetch(&board_id).await;
    assert_same_board!(observer_view.snapshot(), fresh.clone());
    assert_same_board!(writer_view.snapshot(), fresh.clone());
    assert!(fresh.cards_in(&l1).next().is_none());
    assert_eq!(fresh.cards_in(&l2).map(|card| card.title.as_str()).collect::<Vec<_>>(), vec!["A2"]);
}

#[tokio::test]
async fn test_duplicate_delete_is_noop() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut view = reconciler_for(&server, &board_id).await;
    let event = BoardEvent::CardDeleted {
        board_id: board_id.clone(),
        card_id: CardId::new("gone"),
        list_id: ListId::new("l1"),
    };

    assert_eq!(view.apply_event(&event, None), Applied::Ignored);
    assert_eq!(view.apply_event(&event, None), Applied::Ignored);
    let list_event = BoardEvent::ListDeleted {
        board_id: board_id.clone(),
        list_id: ListId::new("l1"),
    };
    assert_eq!(view.apply_event(&list_event, None), Applied::Ignored);
}

#[tokio::test]
async fn test_temp_card_replaced_by_matching_created_event() {
    let board_id = BoardId::new("b1");
    let l1 = List::new(ListId::new("l1"), board_id.clone(), "Groceries", Position::from_units(1000));
    let temp = Card::new(CardId::new("temp-abc"), l1.id.clone(), "Buy milk", Position::from_units(1500));
    let mut view = Reconciler::from_snapshot(
        BoardSnapshot::from_parts(board_id.clone(), vec![l1.clone()], vec![temp]),
        PositionAllocator::default(),
    );

    let real = Card::new(CardId::new("real-123"), l1.id.clone(), "Buy milk", Position::from_units(1500));
    let applied = view.apply_event(
        &BoardEvent::CardCreated {
            board_id,
            card: real.clone(),
        },
        None,
    );

    assert_eq!(applied, Applied::Confirmed);
    assert_eq!(view.cache().cards(&l1.id), &[real]);
}

#[tokio::test]
async fn test_identical_concurrent_creates_do_not_collapse() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;
    let mut alice_view = reconciler_for(&server, &board_id).await;
    let mut bob_view = reconciler_for(&server, &board_id).await;

    // both stage before either sees the other's result
    let from_alice = alice_view.create_list("Todo", Placement::end());
    let from_bob = bob_view.create_list("Todo", Placement::end());
    send_all(&bob, from_bob.messages).await;
    send_all(&alice, from_alice.messages).await;

    deliver(&mut alice_view, &mut alice);
    deliver(&mut bob_view, &mut bob);

    let fresh = server.fetch(&board_id).await;
    assert_eq!(fresh.lists.len(), 2);
    assert_same_board!(alice_view.snapshot(), fresh.clone());
    assert_same_board!(bob_view.snapshot(), fresh);
}

#[tokio::test]
async fn test_rejected_create_is_rolled_back() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut alice = server.connect();
    alice.join(&board_id).await;
    let mut view = reconciler_for(&server, &board_id).await;

    server.store.set_unavailable(true);
    let staged = view.create_list("Todo", Placement::end());
    send_all(&alice, staged.messages).await;

    assert_eq!(deliver(&mut view, &mut alice), vec![Applied::RolledBack]);
    assert!(view.cache().lists().is_empty());
    assert_eq!(view.pending_count(), 0);
}

#[tokio::test]
async fn test_reconnect_refresh_discards_unsent_edits() {
    let server = TestServer::new();
    let board_id = server.open_board("b1").await;
    let mut alice = server.connect();
    alice.join(&board_id).await;
    let view = reconciler_for(&server, &board_id).await;

    let (session, outbox) = BoardSession::new(view);
    drop(outbox);
    assert_err!(session.create_list("lost", Placement::end()).await, ClientError::Disconnected);
    assert_eq!(session.snapshot().await.lists.len(), 1);

    // meanwhile someone else commits
    alice
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: "kept".to_string(),
            position: None,
        })
        .await;

    let discarded = assert_ok!(session.refresh(&StoreSource(server.store.clone())).await);
    assert_eq!(discarded, 1);
    assert_same_board!(session.snapshot().await, server.fetch(&board_id).await);
}
