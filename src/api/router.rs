//! Router assembly.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::request_context, AppState};

/// Maximum accepted request body size in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handlers::receive_webhook))
        .route("/health", get(handlers::health_check))
        .route("/config", get(handlers::get_config))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
