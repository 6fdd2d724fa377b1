//! # Meridian API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meridian API Server                              │
//! │                                                                         │
//! │  Storefront ───► HTTP /api/v1 ───► Services ───► SQLite (WAL)           │
//! │                  (axum + TraceLayer + CORS)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup: tracing, configuration, database (migrations), router, serve
//! until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use meridian_api::{build_router, ApiConfig, AppState};
use meridian_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Meridian API server...");

    let config = ApiConfig::load().context("failed to load configuration")?;
    let addr = config.bind_addr()?;
    info!(
        %addr,
        database = %config.database_path.display(),
        enforce_stock_floor = config.enforce_stock_floor,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(config.database_path.clone()).max_connections(config.max_connections))
        .await
        .context("failed to open database")?;
    info!("Database ready");

    let cors = cors_layer(config.cors_allow_any);
    let state = Arc::new(AppState::new(db, config));

    let app = build_router(Arc::clone(&state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,meridian=debug,sqlx=warn".into()),
        )
        .with_target(true)
        .init();
}

/// Same-origin only unless `cors_allow_any` is set.
fn cors_layer(allow_any: bool) -> CorsLayer {
    if allow_any {
        warn!("CORS: allowing any origin");
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
