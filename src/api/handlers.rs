//! HTTP request handlers.

use crate::api::errors::ApiError;
use crate::api::middleware::RequestId;
use crate::api::models::{
    BetRequest, BetResponse, CashOutResponse, CreateSessionResponse, HealthResponse,
    SessionResponse,
};
use crate::api::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions_open: state.registry.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.export()
}

/// Create a session and start its driver.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let (session_id, handle) = state.registry.create();
    let snapshot = handle.session.lock().await.snapshot();

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            created_at: handle.created_at,
            snapshot,
        }),
    )
}

/// Fetch the current state of a session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let handle = state
        .registry
        .get(&session_id)
        .ok_or_else(|| session_not_found(&request_id, session_id))?;

    let snapshot = handle.session.lock().await.snapshot();
    Ok(Json(SessionResponse {
        session_id,
        created_at: handle.created_at,
        snapshot,
    }))
}

/// Place a bet, starting a round.
pub async fn place_bet(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<BetRequest>,
) -> Result<Json<BetResponse>, ApiError> {
    let handle = state
        .registry
        .get(&session_id)
        .ok_or_else(|| session_not_found(&request_id, session_id))?;

    let mut session = handle.session.lock().await;
    match session.place_bet(request.amount, Instant::now()) {
        Ok(()) => {
            state.metrics.rounds_started_total.inc();
            state.metrics.wagered_total.inc_by(request.amount);
            Ok(Json(BetResponse {
                session_id,
                snapshot: session.snapshot(),
            }))
        }
        Err(err) => {
            state.metrics.bets_rejected_total.inc();
            tracing::debug!(session_id = %session_id, error = %err, "bet rejected");
            Err(ApiError::from_bet_error(request_id.0, err))
        }
    }
}

/// Cash out the running round. A no-op when there is nothing to settle.
pub async fn cash_out(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CashOutResponse>, ApiError> {
    let handle = state
        .registry
        .get(&session_id)
        .ok_or_else(|| session_not_found(&request_id, session_id))?;

    let mut session = handle.session.lock().await;
    let payout = session.cash_out();
    if let Some(amount) = payout {
        state.metrics.cashouts_total.inc();
        state.metrics.paid_out_total.inc_by(amount);
    }

    Ok(Json(CashOutResponse {
        session_id,
        cashed_out: payout.is_some(),
        payout,
        snapshot: session.snapshot(),
    }))
}

/// Close a session, settling any round in flight as a loss.
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.registry.close(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&request_id, session_id))
    }
}

fn session_not_found(request_id: &RequestId, session_id: Uuid) -> ApiError {
    ApiError::not_found(
        request_id.0.clone(),
        format!("session {} not found", session_id),
    )
}
