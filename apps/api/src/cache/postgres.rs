use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::cache::{CacheError, CacheStore};

/// PostgreSQL-backed cache: one row per key in `cv_section_cache`.
#[derive(Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a small pool and makes sure the cache table exists.
    pub async fn connect(database_url: &str) -> Result<Self, CacheError> {
        info!("Connecting to PostgreSQL cache...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the cache table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cv_section_cache (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        info!("cv_section_cache table ready");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(
            sqlx::query_scalar("SELECT value FROM cv_section_cache WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            INSERT INTO cv_section_cache (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
