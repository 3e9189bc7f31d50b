mod auth;
mod cache;
mod config;
mod cv_files;
mod errors;
mod models;
mod remote;
mod routes;
mod sections;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheStore, MemoryCacheStore, PgCacheStore, RedisCacheStore, SectionCache};
use crate::config::{CacheBackend, Config};
use crate::remote::{CvFileClient, HttpProfileClient, RemoteBase};
use crate::routes::build_router;
use crate::sections::callers::VerifiedCallers;
use crate::sections::notices::SyncNotices;
use crate::sections::reconciler::CvSectionReconciler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Sections API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_cache_store(&config).await?;
    info!("Local cache backend: {}", store.backend());

    let remote = RemoteBase::new(config.profile_service_url.clone());
    info!("Profile service at {}", config.profile_service_url);

    let reconciler = CvSectionReconciler::new(
        Arc::new(HttpProfileClient::new(remote.clone())),
        SectionCache::new(store),
        VerifiedCallers::new(),
        SyncNotices::new(),
    );

    let state = AppState {
        reconciler,
        cv_files: CvFileClient::new(remote),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the job-board frontend host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the `CacheStore` selected by `CACHE_BACKEND`.
async fn build_cache_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .clone()
                .context("REDIS_URL is required for the redis cache backend")?;
            Arc::new(RedisCacheStore::new(redis::Client::open(url)?))
        }
        CacheBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres cache backend")?;
            Arc::new(PgCacheStore::connect(url).await?)
        }
    };
    Ok(store)
}
