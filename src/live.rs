//! TikTok live status checks
//!
//! [`LiveChecker`] asks a [`LiveStatusSource`] whether an account is
//! broadcasting. Lookups never fail from the caller's point of view: errors
//! are logged and reported as "not live".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{Error, Result};

/// Room status value reported while a broadcast is running
const ROOM_STATUS_LIVE: i64 = 2;

/// Anything that can tell whether an account is live
#[async_trait]
pub trait LiveStatusSource: Send + Sync {
    /// Check whether `username` is currently live
    ///
    /// # Errors
    ///
    /// Returns error if the status cannot be determined
    async fn is_live(&self, username: &str) -> Result<bool>;
}

/// Room info lookup against the TikTok web API
#[derive(Debug, Clone)]
pub struct TikTokStatusApi {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct RoomInfoResponse {
    data: Option<RoomData>,
}

#[derive(Debug, Deserialize)]
struct RoomData {
    #[serde(rename = "liveRoom")]
    live_room: Option<LiveRoom>,
}

#[derive(Debug, Deserialize)]
struct LiveRoom {
    status: i64,
}

impl TikTokStatusApi {
    /// Create a client for the given room info endpoint
    #[must_use]
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Create a client whose lookups give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, api_url))
    }
}

#[async_trait]
impl LiveStatusSource for TikTokStatusApi {
    async fn is_live(&self, username: &str) -> Result<bool> {
        let username = username.trim_start_matches('@');
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("aid", "1988"), ("sourceType", "54"), ("uniqueId", username)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::LiveStatus(format!(
                "room info for {username} returned HTTP {status}"
            )));
        }

        let body: RoomInfoResponse = response.json().await?;
        let room = body
            .data
            .ok_or_else(|| Error::LiveStatus(format!("no room data for {username}")))?;

        Ok(room
            .live_room
            .is_some_and(|room| room.status == ROOM_STATUS_LIVE))
    }
}

/// Tracks live status lookups per account
pub struct LiveChecker {
    source: Arc<dyn LiveStatusSource>,
    last_status: Mutex<HashMap<String, bool>>,
    running: AtomicBool,
}

impl LiveChecker {
    /// Create a checker over a status source
    #[must_use]
    pub fn new(source: Arc<dyn LiveStatusSource>) -> Self {
        Self {
            source,
            last_status: Mutex::new(HashMap::new()),
            running: AtomicBool::new(true),
        }
    }

    /// Check whether `username` is live, treating any failure as offline
    pub async fn is_account_online(&self, username: &str) -> bool {
        tracing::info!(username, "checking live status");

        match self.source.is_live(username).await {
            Ok(is_live) => {
                tracing::info!(username, is_live, "live status checked");
                self.last_status
                    .lock()
                    .await
                    .insert(username.to_string(), is_live);
                is_live
            }
            Err(e) => {
                tracing::error!(username, error = %e, "live status check failed");
                false
            }
        }
    }

    /// Result of the last successful check for `username`
    pub async fn last_status(&self, username: &str) -> Option<bool> {
        self.last_status.lock().await.get(username).copied()
    }

    /// Whether the checker has not been stopped
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the checker
    pub fn stop(&self) {
        tracing::info!("stopping live checker");
        self.running.store(false, Ordering::Relaxed);
    }

    /// Local time formatted as `YYYY-MM-DDTHH:MM:SS`
    #[must_use]
    pub fn current_time() -> String {
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}
