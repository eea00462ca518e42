//! Cepass server binary — a CloudEvents passthrough receiver.
//!
//! Starts an axum HTTP server that accepts CloudEvents over HTTP, records
//! them in a bounded in-memory history, and exposes health and
//! recent-event endpoints, with graceful shutdown on SIGTERM/SIGINT.

use cepass_history::EventHistory;
use cepass_server::config::{self, TracingConfig};
use cepass_server::{app, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Service name reported in startup logs and trace publishing.
const SERVICE_NAME: &str = "ce-event-passthrough";

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CEPASS_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        service = SERVICE_NAME,
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Platform tracing config is advisory; a broken value must not stop the
    // receiver from serving events.
    match TracingConfig::from_env() {
        Ok(Some(tracing_config)) => {
            tracing::info!(
                backend = tracing_config.backend.as_deref().unwrap_or("none"),
                debug = tracing_config.debug_enabled(),
                sample_rate = tracing_config.sample_rate.as_deref().unwrap_or("-"),
                "trace publishing configured"
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::info!("failed to parse tracing config, proceeding without: {e}");
        }
    }

    // Build application
    let state = AppState {
        history: EventHistory::new(config.history.limit),
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, history_limit = config.history.limit, "starting cepass server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("cepass server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
