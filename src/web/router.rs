//! Route definitions for web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::api;
use super::state::AppState;

/// Largest accepted request body. Enforced by the extractors, so an oversized
/// `/send` is rejected with the same JSON error shape as other failures.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the relay API router.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/send", post(api::send_message))
        .route("/log", get(api::message_log))
        .route("/stats", get(api::queue_stats))

        // Delivering client (token required)
        .route("/poll", get(api::poll_messages))
        .route("/confirm/:id", post(api::confirm_message))
}

/// Create the full app router.
pub fn create_app_router(state: AppState) -> Router {
    create_api_router()
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
