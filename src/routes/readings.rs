//! Session log endpoints: JSON listing and CSV download.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::{AppState, EnrichedReading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/readings", get(list))
        .route("/readings/export.csv", get(export_csv))
}

/// Query parameters for filtering the session log.
#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    /// Inclusive lower bound (RFC 3339).
    since: Option<DateTime<Utc>>,
    /// Inclusive upper bound (RFC 3339).
    until: Option<DateTime<Utc>>,
    /// Keep only the most recent N matches.
    limit: Option<usize>,
}

async fn list(
    Query(params): Query<ReadingsQuery>,
    State(state): State<AppState>,
) -> Json<Vec<EnrichedReading>> {
    // ---
    let log = state.log.read().await;
    let readings = apply_filters(log.snapshot(), &params);
    info!("GET /readings - returning {} of {} readings", readings.len(), log.len());
    Json(readings)
}

async fn export_csv(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let log = state.log.read().await;
    match log.export_csv() {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"telemetry_log.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("CSV export failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed").into_response()
        }
    }
}

/// Apply time bounds, then keep the most recent `limit`, preserving append order.
fn apply_filters(readings: &[EnrichedReading], params: &ReadingsQuery) -> Vec<EnrichedReading> {
    // ---
    let matching: Vec<&EnrichedReading> = readings
        .iter()
        .filter(|r| params.since.map_or(true, |since| r.reading.timestamp >= since))
        .filter(|r| params.until.map_or(true, |until| r.reading.timestamp <= until))
        .collect();

    let skip = params
        .limit
        .map_or(0, |limit| matching.len().saturating_sub(limit));
    matching.into_iter().skip(skip).cloned().collect()
}
