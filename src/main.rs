mod config;
mod dto;
mod handlers;
mod models;
mod repository;
mod service;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing_subscriber::EnvFilter;

use std::{process::ExitCode, sync::Arc};

use handlers::rest;
use repository::Repository;
use service::NoteService;

#[tokio::main]
async fn main() -> ExitCode {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Load config
    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Loaded configuration: {:?}", cfg);

    // Repository creation
    let repo = match Repository::new(&cfg.pg_config()).await {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            tracing::error!("Failed to establish database connection: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Connected to database '{}' at {}:{}",
        cfg.database,
        cfg.host,
        cfg.db_port
    );

    // Service creation
    let service = Arc::new(NoteService::new(repo.clone()));

    // Router config
    let router = Router::new()
        .route("/", get(root))
        .merge(rest::router(service));

    let listener = match tokio::net::TcpListener::bind(cfg.listen_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {e}", cfg.listen_addr());
            return ExitCode::FAILURE;
        }
    };

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Server running at http://{}", addr),
        Err(e) => tracing::warn!("Server started, but its local address is unknown: {e}"),
    }

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Router and service are gone once serving stops, leaving the last handle here
    match Arc::try_unwrap(repo) {
        Ok(repo) => repo.close().await,
        Err(_) => tracing::warn!("Database connection still shared at shutdown"),
    }

    if let Err(e) = served {
        tracing::error!("HTTP server error: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

async fn root() -> Response {
    (StatusCode::OK, "Notes API is running").into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
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
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}
