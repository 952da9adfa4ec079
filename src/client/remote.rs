/**
 * Snapshot HTTP Client
 *
 * Fetches the authoritative bulk board snapshot over HTTP. Sessions call it
 * on connect and again after every reconnect, replacing any stale optimistic
 * state.
 */
use crate::client::error::ClientError;
use crate::shared::board::BoardSnapshot;
use crate::shared::config::AppConfig;
use crate::shared::ids::{BoardId, UserId};
use async_trait::async_trait;
use reqwest::Client;

/// Header carrying the acting user's id
pub const USER_HEADER: &str = "x-user-id";

/// Source of bulk board snapshots
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot, ClientError>;
}

/// reqwest-backed snapshot source
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: Client,
    base_url: String,
    user_id: Option<UserId>,
}

impl SnapshotClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: None,
        }
    }

    /// Client for the server URL in the application config
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::new(config.require_server_url()?))
    }

    /// Act as the given user
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn snapshot_url(&self, board_id: &BoardId) -> String {
        format!("{}/api/boards/{}/snapshot", self.base_url, board_id)
    }
}

#[async_trait]
impl SnapshotSource for SnapshotClient {
    async fn fetch_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot, ClientError> {
        let url = self.snapshot_url(board_id);
        tracing::debug!("[Session] Fetching snapshot from {}", url);

        let mut request = self.http.get(&url);
        if let Some(user_id) = &self.user_id {
            request = request.header(USER_HEADER, user_id.as_str());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<BoardSnapshot>().await?)
    }
}
