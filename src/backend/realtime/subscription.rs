/**
 * Board Connection Handler
 *
 * Implements the persistent `GET /ws` connection that carries intents from a
 * client and board events back to it.
 *
 * # Connection Model
 *
 * Each upgraded socket is split in two:
 *
 * - a writer task draining the connection's outbox (`UnboundedReceiverStream`)
 *   into the socket as JSON text frames
 * - the reader loop, which decodes `ClientMessage` frames and hands them to the
 *   broadcaster one at a time, awaiting each to completion before reading the
 *   next
 *
 * When the reader ends (close frame, socket error or client gone) the
 * connection is removed from every board channel. Mutations that already
 * committed are not rolled back.
 *
 * # Identity
 *
 * The user id is taken from the `x-user-id` header, or the `user` query
 * parameter for browser clients that cannot set headers on upgrade.
 */
use crate::backend::mutation::Actor;
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::realtime::registry::ConnectionHandle;
use crate::shared::event::{ErrorKind, ServerMessage};
use crate::shared::ids::UserId;
use crate::shared::intent::ClientMessage;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, Stream, StreamExt};
use std::collections::HashMap;
use std::fmt::Display;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-user-id";

/// Extract the user id from headers or query parameters
pub fn extract_user_id(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::from)
        .or_else(|| {
            query
                .get("user")
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(UserId::from)
        })
}

/// Handle a board connection upgrade (GET /ws)
pub async fn handle_board_socket(
    ws: WebSocketUpgrade,
    State(broadcaster): State<Broadcaster>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let user_id = extract_user_id(&headers, &query);
    tracing::info!("[Realtime] Connection upgrade requested (user: {:?})", user_id);

    ws.on_upgrade(move |socket| run_connection(socket, broadcaster, user_id))
}

async fn run_connection(socket: WebSocket, broadcaster: Broadcaster, user_id: Option<UserId>) {
    let (mut sink, mut stream) = socket.split();
    let (handle, outbox) = ConnectionHandle::channel();
    let actor = Actor::new(handle.id(), user_id);
    let connection_id = handle.id();

    tracing::info!("[Realtime] {} connected", connection_id);

    let writer = tokio::spawn(async move {
        let mut outbox = UnboundedReceiverStream::new(outbox);
        while let Some(message) = outbox.next().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[Realtime] Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                tracing::debug!("[Realtime] {} socket closed while writing", connection_id);
                break;
            }
        }
        let _ = sink.close().await;
    });

    read_frames(&mut stream, &broadcaster, &handle, &actor).await;
    drop(handle);
    if let Err(e) = writer.await {
        tracing::debug!("[Realtime] Writer task for {} ended abnormally: {}", connection_id, e);
    }

    tracing::info!("[Realtime] {} disconnected", connection_id);
}

/// Hand inbound frames to the broadcaster until the socket ends, then drop
/// every board membership of the connection
async fn read_frames<S, E>(frames: &mut S, broadcaster: &Broadcaster, handle: &ConnectionHandle, actor: &Actor)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let connection_id = handle.id();

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientMessage::from_json(text.as_str()) {
                Ok(message) => {
                    let outcome = broadcaster.handle(handle, actor, message).await;
                    tracing::debug!("[Realtime] {} intent handled: {:?}", connection_id, outcome);
                }
                Err(e) => {
                    tracing::warn!("[Realtime] Malformed intent from {}: {}", connection_id, e);
                    handle.send(ServerMessage::error(None, ErrorKind::Validation, e.to_string()));
                }
            },
            Ok(Message::Binary(_)) => {
                tracing::warn!("[Realtime] Binary frame from {} rejected", connection_id);
                handle.send(ServerMessage::error(
                    None,
                    ErrorKind::Validation,
                    "binary frames are not supported",
                ));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("[Realtime] {} socket error: {}", connection_id, e);
                break;
            }
        }
    }

    broadcaster.registry().disconnect(connection_id);
}
