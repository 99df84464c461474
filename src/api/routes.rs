//! Route definitions.
//!
//! Maps URLs to handlers with type-safe routing.

use super::{handlers::*, server::AppState, websocket::session_stream};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Session lifecycle
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session))
        .route("/sessions/:session_id", delete(close_session))
        // Game actions
        .route("/sessions/:session_id/bet", post(place_bet))
        .route("/sessions/:session_id/cashout", post(cash_out))
        // WebSocket stream of ticks and round events
        .route("/sessions/:session_id/ws", get(session_stream))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics))
        // Attach shared state
        .with_state(state)
}
