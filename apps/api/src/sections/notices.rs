use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    Failed,
    Skipped,
    /// The profile service rejected the caller's credential.
    Unauthorized,
}

/// Outcome of one background remote write.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub sync_id: Uuid,
    pub status: SyncStatus,
    pub message: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl SyncOutcome {
    pub fn synced(sync_id: Uuid) -> Self {
        Self::new(sync_id, SyncStatus::Synced, None)
    }

    pub fn failed(sync_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(sync_id, SyncStatus::Failed, Some(message.into()))
    }

    pub fn skipped(sync_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(sync_id, SyncStatus::Skipped, Some(message.into()))
    }

    pub fn unauthorized(sync_id: Uuid) -> Self {
        Self::new(
            sync_id,
            SyncStatus::Unauthorized,
            Some("credential rejected by profile service".to_string()),
        )
    }

    fn new(sync_id: Uuid, status: SyncStatus, message: Option<String>) -> Self {
        Self {
            sync_id,
            status,
            message,
            finished_at: Utc::now(),
        }
    }
}

pub const MAX_SYNC_NOTICES: usize = 10_000;

/// Latest sync outcome per user, read by clients to surface a non-blocking
/// notification. Each finished remote write overwrites the previous notice.
/// Once `capacity` users hold a notice, the oldest notice is dropped.
#[derive(Clone)]
pub struct SyncNotices {
    inner: Arc<RwLock<HashMap<String, SyncOutcome>>>,
    capacity: usize,
}

impl Default for SyncNotices {
    fn default() -> Self {
        Self::with_capacity(MAX_SYNC_NOTICES)
    }
}

impl SyncNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, user_id: &str, outcome: SyncOutcome) {
        let mut inner = self.inner.write().await;
        if inner.len() >= self.capacity && !inner.contains_key(user_id) {
            let oldest = inner
                .iter()
                .min_by_key(|(_, notice)| notice.finished_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                inner.remove(&key);
            }
        }
        inner.insert(user_id.to_string(), outcome);
    }

    pub async fn latest(&self, user_id: &str) -> Option<SyncOutcome> {
        self.inner.read().await.get(user_id).cloned()
    }
}
