//! ERP Gateway - API Server Binary
//!
//! This binary starts the HTTP API server in front of the ERP.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin erp-gateway
//!
//! # Run with environment variables
//! API_ERP_URL=https://erp.example.com API_ERP_DATABASE=prod cargo run --bin erp-gateway
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_ERP_URL`, `API_ERP_DATABASE`, `API_ERP_USERNAME`, `API_ERP_PASSWORD` - ERP session
//! * `API_ERP_MAX_IN_FLIGHT` - Concurrent ERP calls (default: 20)
//! * `API_ERP_CALL_TIMEOUT_SECS` - Per-call timeout, 0 disables it (default: 60)
//! * `API_ERP_QUEUE_TIMEOUT_SECS` - Wait for a free ERP slot, 0 waits indefinitely (default: 0)
//! * `API_PROJECT_IDS` - Comma-separated project ids for the task endpoint

use anyhow::Context;
use interface_api::{config::ApiConfig, create_router};
use infra_erp::ClientRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes logging, loads configuration, builds the ERP client
/// registry and serves until a shutdown signal arrives.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        erp_url = %config.erp_url,
        erp_database = %config.erp_database,
        "Starting ERP gateway"
    );

    let registry = Arc::new(ClientRegistry::with_xmlrpc(config.erp_config()));

    // Authenticate up front so a bad configuration shows in the logs at startup
    match registry.default_client().await {
        Ok(client) if client.is_authenticated() => {
            tracing::info!(key = %client.key(), "ERP session established")
        }
        Ok(client) => tracing::warn!(key = %client.key(), "ERP login failed, requests will retry"),
        Err(e) => tracing::warn!(error = %e, "ERP client could not be created"),
    }

    let app = create_router(Arc::clone(&registry), config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
