//! Current weather summary for the dashboard header.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::WeatherStatus;
use crate::{AppState, CurrentConditions};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/weather/current", get(current))
}

#[derive(Debug, Serialize)]
struct CurrentWeatherResponse {
    latitude: f64,
    longitude: f64,
    current: CurrentConditions,
    radiation_kwh_m2_day: Option<f64>,
    fetched_at: DateTime<Utc>,
    /// True unless the last cycle obtained this forecast.
    stale: bool,
}

async fn current(State(state): State<AppState>) -> Response {
    // ---
    let confirmed = matches!(
        state.last_cycle.read().await.as_ref().and_then(|c| c.weather.as_ref()),
        Some(WeatherStatus::Ok)
    );
    let latest = state.latest_weather.read().await;
    match latest.as_ref() {
        Some(fetched) => Json(CurrentWeatherResponse {
            latitude: fetched.snapshot.latitude,
            longitude: fetched.snapshot.longitude,
            current: fetched.snapshot.current.clone(),
            radiation_kwh_m2_day: fetched.snapshot.radiation_kwh_m2_day(),
            fetched_at: fetched.fetched_at,
            stale: !confirmed,
        })
        .into_response(),
        None => (StatusCode::NOT_FOUND, Json("No forecast fetched yet")).into_response(),
    }
}
