use axum::{extract::State, routing::get, Json, Router};

use crate::{AlertEvent, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/alerts", get(latest))
}

/// Alerts raised by the most recently recorded reading.
async fn latest(State(state): State<AppState>) -> Json<Vec<AlertEvent>> {
    Json(state.latest_alerts.read().await.clone())
}
