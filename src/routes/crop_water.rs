//! Crop water demand estimates for the irrigation scheduler.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppState, CropWaterInputs};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/crop-water", get(from_inputs))
        .route("/crop-water/session", get(from_session))
}

#[derive(Debug, Deserialize)]
struct EstimateQuery {
    temp_c: f64,
    /// kWh/m²/day
    radiation: f64,
    rh: f64,
    crop_coeff: f64,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    crop_coeff: f64,
}

#[derive(Debug, Serialize)]
struct EstimateResponse {
    inputs: CropWaterInputs,
    /// Non-finite results serialize as `null`.
    mm_per_day: f64,
}

async fn from_inputs(Query(q): Query<EstimateQuery>) -> Json<EstimateResponse> {
    // ---
    let inputs = CropWaterInputs {
        temp_c: q.temp_c,
        radiation_kwh_m2_day: q.radiation,
        rh_pct: q.rh,
        crop_coeff: q.crop_coeff,
    };
    Json(EstimateResponse {
        inputs,
        mm_per_day: inputs.estimate(),
    })
}

/// Estimate from the session's mean external temperature and humidity and
/// today's radiation from the latest forecast.
async fn from_session(Query(q): Query<SessionQuery>, State(state): State<AppState>) -> Response {
    // ---
    let radiation = state
        .latest_weather
        .read()
        .await
        .as_ref()
        .and_then(|f| f.snapshot.radiation_kwh_m2_day());
    let Some(radiation) = radiation else {
        return (StatusCode::NOT_FOUND, Json("No radiation data available yet")).into_response();
    };

    let log = state.log.read().await;
    if log.is_empty() {
        return (StatusCode::NOT_FOUND, Json("No readings recorded in this session")).into_response();
    }
    match CropWaterInputs::from_readings(log.snapshot(), radiation, q.crop_coeff) {
        Some(inputs) => {
            debug!("Session crop water inputs: {:?}", inputs);
            Json(EstimateResponse {
                inputs,
                mm_per_day: inputs.estimate(),
            })
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json("No temperature/humidity readings in this session"),
        )
            .into_response(),
    }
}
