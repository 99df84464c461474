//! Request and response types for the HTTP API.

use crate::engine::SessionSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response to session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

/// Point-in-time view of an existing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

/// Bet placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub amount: f64,
}

/// Successful bet placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetResponse {
    pub session_id: Uuid,
    pub snapshot: SessionSnapshot,
}

/// Cash-out result.
///
/// A cash-out that finds nothing to settle (no bet, already cashed out,
/// round already crashed) is a no-op, not an error: `cashed_out` is false
/// and `payout` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOutResponse {
    pub session_id: Uuid,
    pub cashed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
    pub snapshot: SessionSnapshot,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_open: usize,
    pub uptime_secs: u64,
}
