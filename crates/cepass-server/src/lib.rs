//! Cepass server library logic.
//!
//! Wires the CloudEvents receiver, the dispatcher middleware for the
//! reserved service endpoints, and the shared event history into one
//! axum application.

pub mod codec;
pub mod config;
pub mod middleware;
pub mod receiver;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use cepass_history::EventHistory;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bounded buffer of recently received events.
    pub history: EventHistory,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the application router.
///
/// Every request first passes the dispatcher middleware, which serves the
/// reserved health and event-history paths itself; everything else falls
/// through to the CloudEvents receiver.
pub fn app(state: AppState) -> Router {
    Router::new()
        .fallback(receiver::receive_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::dispatch_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
