use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::{CacheError, CacheStore};

/// Redis-backed cache. Entries are plain `SET` values without TTL.
#[derive(Clone)]
pub struct RedisCacheStore {
    client: redis::Client,
}

impl RedisCacheStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        debug!("Redis GET {key}: hit={}", value.is_some());
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
