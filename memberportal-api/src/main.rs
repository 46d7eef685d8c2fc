//! # Member Portal API Server
//!
//! Connects to PostgreSQL and Redis, applies migrations, makes sure an admin
//! exists, then serves the portal API until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/portal \
//! REDIS_URL=redis://localhost:6379 \
//! BOOTSTRAP_ADMIN_PASSWORD=change-me \
//! cargo run -p memberportal-api
//! ```

use memberportal_api::{
    app::{build_router, AppState},
    bootstrap::ensure_bootstrap_admin,
    config::{Config, LogFormat},
};
use memberportal_shared::{
    auth::session::{RedisSessionStore, SessionManager},
    db::{self, DatabaseConfig},
    redis::{client::sanitize_url, RedisClient, RedisConfig},
    storage::{PgStorage, SharedStorage},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "Member Portal API v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = db::create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    tracing::info!(url = %sanitize_url(&config.redis.url), "Connecting to Redis");
    let redis = RedisClient::new(RedisConfig::new(config.redis.url.clone())).await?;

    let storage: SharedStorage = Arc::new(PgStorage::new(pool.clone()));
    let sessions = SessionManager::new(
        Arc::new(RedisSessionStore::new(redis)),
        config.session.ttl_seconds,
    );

    ensure_bootstrap_admin(&storage, &config.bootstrap).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(storage, sessions, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "memberportal_api=debug,memberportal_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
