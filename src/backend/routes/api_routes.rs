/**
 * API Route Handlers
 *
 * REST endpoints around the realtime core: board creation, the bulk
 * snapshot clients fetch on connect and reconnect, and channel
 * introspection.
 *
 * # Routes
 *
 * - `GET /health` - Liveness probe
 * - `POST /api/boards` - Create a board
 * - `GET /api/boards/{board_id}/snapshot` - Ordered bulk snapshot
 * - `GET /api/boards/{board_id}/channel` - Channel subscriber count
 */

use crate::backend::error::BackendError;
use crate::backend::mutation::{Actor, BoardSummary, MemoryBoardStore, QueryService};
use crate::backend::realtime::subscription::extract_user_id;
use crate::backend::realtime::ChannelRegistry;
use crate::backend::server::state::AppState;
use crate::shared::board::BoardSnapshot;
use crate::shared::ids::{BoardId, UserId};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Body of `POST /api/boards`
#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
    /// Restrict the board to these users; omitted means open
    #[serde(default)]
    pub members: Option<Vec<UserId>>,
}

/// Body of `GET /api/boards/{board_id}/channel`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub board_id: BoardId,
    pub subscribers: usize,
}

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health))
        .route("/api/boards", post(create_board))
        .route("/api/boards/{board_id}/snapshot", get(board_snapshot))
        .route("/api/boards/{board_id}/channel", get(board_channel))
}

/// Liveness probe (GET /health)
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create a board (POST /api/boards)
pub async fn create_board(
    State(store): State<Arc<MemoryBoardStore>>,
    Json(request): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<BoardSummary>), BackendError> {
    let members = request
        .members
        .map(|members| members.into_iter().collect::<HashSet<_>>());
    let board = store.create_board(&request.name, members).await?;

    tracing::info!("[Api] Board {} created", board.id);
    Ok((StatusCode::CREATED, Json(board)))
}

/// Ordered bulk snapshot of a board (GET /api/boards/{board_id}/snapshot)
pub async fn board_snapshot(
    State(queries): State<Arc<dyn QueryService>>,
    Path(board_id): Path<BoardId>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<BoardSnapshot>, BackendError> {
    let actor = Actor::new(Default::default(), extract_user_id(&headers, &query));
    let snapshot = queries.snapshot(&actor, &board_id).await?;

    tracing::debug!(
        "[Api] Snapshot of {}: {} lists, {} cards",
        board_id,
        snapshot.lists.len(),
        snapshot.cards.len()
    );
    Ok(Json(snapshot))
}

/// Channel introspection (GET /api/boards/{board_id}/channel)
pub async fn board_channel(
    State(registry): State<ChannelRegistry>,
    Path(board_id): Path<BoardId>,
) -> Json<ChannelInfo> {
    let subscribers = registry.subscriber_count(&board_id);
    Json(ChannelInfo {
        board_id,
        subscribers,
    })
}
