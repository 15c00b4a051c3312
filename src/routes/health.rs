// src/routes/health.rs
//! Liveness endpoint for the irrigation telemetry service.
//!
//! Besides the static status it reports the telemetry session id, how many
//! readings the session has recorded and the outcome of the last poll cycle,
//! including any notice about a skipped cycle or missing weather data.
//! Exported to the gateway (`mod.rs`) as a subrouter, like every sibling
//! module.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::state::CycleStatus;
use crate::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    session_id: Uuid,
    readings: usize,
    /// `null` until the first cycle has run.
    last_cycle: Option<CycleStatus>,
}

/// Handle `GET /health`.
///
/// Only takes read locks on shared state; never calls upstream services.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_cycle = state.last_cycle.read().await.clone();
    let log = state.log.read().await;
    Json(HealthResponse {
        status: "ok",
        session_id: log.session_id(),
        readings: log.len(),
        last_cycle,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
