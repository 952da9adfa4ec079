//! Real-time broadcast integration tests

use crate::common::{TestClient, TestServer};
use assert_matches::assert_matches;
use taskboard::backend::realtime::Outcome;
use taskboard::backend::ServiceError;
use taskboard::shared::{
    BoardEvent, BoardId, Card, CardId, ClientMessage, ErrorKind, Intent, List, ListId, ListUpdates, Position,
    ServerMessage,
};

async fn create_list(server: &TestServer, client: &TestClient, board_id: &BoardId, name: &str) -> List {
    let outcome = client
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: name.to_string(),
            position: None,
        })
        .await;
    assert_matches!(outcome, Outcome::Published { .. });
    let found = server
        .fetch(board_id)
        .await
        .lists
        .into_iter()
        .find(|list| list.name == name);
    assert_ok!(found.ok_or("list missing from snapshot"))
}

async fn create_card(
    server: &TestServer,
    client: &TestClient,
    board_id: &BoardId,
    list_id: &ListId,
    title: &str,
) -> Card {
    let outcome = client
        .send_intent(Intent::CreateCard {
            board_id: board_id.clone(),
            list_id: list_id.clone(),
            title: title.to_string(),
            position: None,
        })
        .await;
    assert_matches!(outcome, Outcome::Published { .. });
    let found = server
        .fetch(board_id)
        .await
        .cards
        .into_iter()
        .find(|card| card.title == title);
    assert_ok!(found.ok_or("card missing from snapshot"))
}

#[tokio::test]
async fn test_event_reaches_every_member_including_origin() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;

    let outcome = alice
        .send(ClientMessage::with_ref(
            "ref-1",
            Intent::CreateList {
                board_id: board_id.clone(),
                name: "Todo".to_string(),
                position: Some(Position::from_units(1000)),
            },
        ))
        .await;

    assert_eq!(outcome, Outcome::Published { recipients: 2 });

    let own = alice.events();
    let shared = bob.events();
    assert_eq!(own.len(), 1);
    assert_eq!(shared.len(), 1);
    assert_eq!(own[0].0.as_deref(), Some("ref-1"));
    assert_eq!(shared[0].0, None);
    assert_eq!(own[0].1, shared[0].1);
    assert_matches!(&own[0].1, BoardEvent::ListCreated { list } if list.name == "Todo" && list.position == Position::from_units(1000));
}

#[tokio::test]
async fn test_origin_receives_result_without_joining() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut outsider = server.connect();

    let outcome = outsider
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: "Solo".to_string(),
            position: None,
        })
        .await;

    assert_eq!(outcome, Outcome::Published { recipients: 1 });
    assert_eq!(outsider.events().len(), 1);
    assert_eq!(server.broadcaster.registry().subscriber_count(&board_id), 0);
}

#[tokio::test]
async fn test_failed_mutation_is_not_broadcast() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;

    let outcome = alice
        .send(ClientMessage::with_ref(
            "ref-missing",
            Intent::UpdateList {
                board_id: board_id.clone(),
                list_id: ListId::new("ghost"),
                updates: ListUpdates {
                    name: Some("renamed".to_string()),
                    position: None,
                },
            },
        ))
        .await;

    assert_matches!(outcome, Outcome::Rejected(ServiceError::NotFound { .. }));
    assert_matches!(
        alice.drain().as_slice(),
        [ServerMessage::Error { correlation: Some(token), error }]
            if token == "ref-missing" && error.kind == ErrorKind::NotFound
    );
    assert!(bob.drain().is_empty());
}

#[tokio::test]
async fn test_validation_and_outage_errors_stay_with_origin() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;

    let blank = alice
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: "   ".to_string(),
            position: None,
        })
        .await;
    assert_matches!(blank, Outcome::Rejected(ServiceError::Validation { .. }));

    server.store.set_unavailable(true);
    let down = alice
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: "Todo".to_string(),
            position: None,
        })
        .await;
    assert_matches!(down, Outcome::Rejected(ServiceError::Unavailable { .. }));

    let kinds: Vec<ErrorKind> = alice
        .drain()
        .into_iter()
        .filter_map(|message| match message {
            ServerMessage::Error { error, .. } => Some(error.kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ErrorKind::Validation, ErrorKind::Unavailable]);
    assert!(bob.drain().is_empty());
}

#[tokio::test]
async fn test_private_board_rejects_join() {
    let server = TestServer::new();
    let board_id = server.private_board("Secret", &["alice"]).await;
    let mut mallory = server.connect_as(Some("mallory"));
    let mut alice = server.connect_as(Some("alice"));

    let outcome = mallory
        .send_intent(Intent::Join {
            board_id: board_id.clone(),
        })
        .await;

    assert_matches!(outcome, Outcome::Rejected(ServiceError::AccessDenied { .. }));
    assert_matches!(
        mallory.drain().as_slice(),
        [ServerMessage::Error { error, .. }] if error.kind == ErrorKind::AccessDenied
    );
    assert!(!server.broadcaster.registry().is_member(&board_id, mallory.handle.id()));

    alice.join(&board_id).await;
}

#[tokio::test]
async fn test_cross_list_move_carries_previous_list() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;

    let todo = create_list(&server, &alice, &board_id, "Todo").await;
    let done = create_list(&server, &alice, &board_id, "Done").await;
    let card = create_card(&server, &alice, &board_id, &todo.id, "Ship it").await;
    bob.drain();

    alice
        .send_intent(Intent::MoveCard {
            board_id: board_id.clone(),
            card_id: card.id.clone(),
            from_list_id: todo.id.clone(),
            to_list_id: done.id.clone(),
            position: Position::from_units(1000),
        })
        .await;

    let events = bob.events();
    assert_matches!(
        &events[..],
        [(None, BoardEvent::CardMoved { card: moved, from_list_id, .. })]
            if moved.id == card.id && moved.list_id == done.id && from_list_id == &todo.id
    );
}

#[tokio::test]
async fn test_boards_are_isolated() {
    let server = TestServer::new();
    let first = server.open_board("First").await;
    let second = server.open_board("Second").await;
    let mut alice = server.connect();
    let mut carol = server.connect();
    alice.join(&first).await;
    carol.join(&second).await;

    create_list(&server, &alice, &first, "Todo").await;

    assert!(carol.drain().is_empty());
    assert_eq!(alice.events().len(), 1);
}

#[tokio::test]
async fn test_leave_stops_delivery_and_is_idempotent() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;

    for _ in 0..2 {
        let outcome = bob
            .send_intent(Intent::Leave {
                board_id: board_id.clone(),
            })
            .await;
        assert_eq!(outcome, Outcome::Left);
    }
    bob.drain();

    create_list(&server, &alice, &board_id, "Todo").await;

    assert!(bob.drain().is_empty());
    assert_eq!(server.broadcaster.registry().subscriber_count(&board_id), 1);
}

#[tokio::test]
async fn test_dropped_connection_is_pruned_on_publish() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    let mut bob = server.connect();
    alice.join(&board_id).await;
    bob.join(&board_id).await;
    drop(bob);

    let outcome = alice
        .send_intent(Intent::CreateList {
            board_id: board_id.clone(),
            name: "Todo".to_string(),
            position: None,
        })
        .await;

    assert_eq!(outcome, Outcome::Published { recipients: 1 });
    assert_eq!(server.broadcaster.registry().subscriber_count(&board_id), 1);
}

#[tokio::test]
async fn test_deleting_list_broadcasts_delete() {
    let server = TestServer::new();
    let board_id = server.open_board("Team").await;
    let mut alice = server.connect();
    alice.join(&board_id).await;
    let todo = create_list(&server, &alice, &board_id, "Todo").await;
    create_card(&server, &alice, &board_id, &todo.id, "orphan").await;
    alice.drain();

    alice
        .send_intent(Intent::DeleteList {
            board_id: board_id.clone(),
            list_id: todo.id.clone(),
        })
        .await;

    assert_matches!(
        &alice.events()[..],
        [(None, BoardEvent::ListDeleted { list_id, .. })] if list_id == &todo.id
    );
    let snapshot = server.fetch(&board_id).await;
    assert!(snapshot.lists.is_empty());
    assert!(snapshot.cards.is_empty());

    // second delete targets a vanished list
    let again = alice
        .send_intent(Intent::DeleteCard {
            board_id: board_id.clone(),
            card_id: CardId::new("ghost"),
            list_id: todo.id.clone(),
        })
        .await;
    assert_matches!(again, Outcome::Rejected(ServiceError::NotFound { .. }));
}
