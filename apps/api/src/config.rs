use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which `CacheStore` backend holds the local CV-section snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
    Postgres,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "postgres" | "postgresql" => Ok(CacheBackend::Postgres),
            other => bail!("Unknown CACHE_BACKEND '{other}' (expected memory, redis or postgres)"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile_service_url: String,
    pub cache_backend: CacheBackend,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let cache_backend: CacheBackend = lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .parse()?;

        let redis_url = match cache_backend {
            CacheBackend::Redis => Some(require("REDIS_URL")?),
            _ => lookup("REDIS_URL"),
        };
        let database_url = match cache_backend {
            CacheBackend::Postgres => Some(require("DATABASE_URL")?),
            _ => lookup("DATABASE_URL"),
        };

        Ok(Config {
            profile_service_url: require("PROFILE_SERVICE_URL")?,
            cache_backend,
            redis_url,
            database_url,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
