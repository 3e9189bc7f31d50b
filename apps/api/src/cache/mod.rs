//! Local cache of per-user CV sections.
//!
//! `CacheStore` is the raw key → string port; `SectionCache` layers the
//! `cvSections_{userId}` key format and JSON encoding on top of it. Backends
//! are swapped at startup via `CACHE_BACKEND`.

pub mod memory;
pub mod postgres;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::cv_sections::CvSections;

pub use memory::MemoryCacheStore;
pub use postgres::PgCacheStore;
pub use redis_store::RedisCacheStore;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Whole-value key/value persistence. No partial updates, no eviction.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Backend name, for logs.
    fn backend(&self) -> &'static str;
}

/// Cache key holding a user's serialized `CvSections`.
pub fn section_key(user_id: &str) -> String {
    format!("cvSections_{user_id}")
}

/// Typed view over a `CacheStore` for `CvSections` snapshots.
#[derive(Clone)]
pub struct SectionCache {
    store: Arc<dyn CacheStore>,
}

impl SectionCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Reads the cached snapshot. A value that no longer decodes is reported
    /// as a miss.
    pub async fn read(&self, user_id: &str) -> Result<Option<CvSections>, CacheError> {
        let key = section_key(user_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(sections) => Ok(Some(sections)),
            Err(e) => {
                warn!("Discarding undecodable cache entry {key}: {e}");
                Ok(None)
            }
        }
    }

    /// Overwrites the snapshot with the full record.
    pub async fn write(&self, user_id: &str, sections: &CvSections) -> Result<(), CacheError> {
        let raw = serde_json::to_string(sections)?;
        self.store.set(&section_key(user_id), raw).await
    }
}
