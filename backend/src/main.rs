//! Cluster Backup Monitor - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cbm_backend::{
    api::{self, AppState},
    config::Config,
    db,
    error::Result,
    services::clock::SystemClock,
    store::postgres::PgStore,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Held until shutdown so pending spans are flushed
    let _otel_guard = telemetry::init_tracing(config.otel_endpoint.as_deref(), "cbm-backend")?;
    tracing::info!(config = ?config, "Starting Cluster Backup Monitor");

    if config.admin_password_hash.is_none() {
        tracing::warn!("ADMIN_PASSWORD_HASH not set, admin login is disabled");
    }

    // The pool connects on first use; an unreachable store surfaces per request
    let pool = db::create_pool(&config)?;
    let store = PgStore::new(pool);

    let addr: SocketAddr = config.bind_address.parse()?;
    let state = Arc::new(AppState::new(config, Arc::new(store), Arc::new(SystemClock)));

    let app = Router::new()
        .merge(api::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
