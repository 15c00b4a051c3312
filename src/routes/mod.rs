use axum::Router;

use crate::AppState;

mod alerts;
mod crop_water;
mod health;
mod readings;
mod weather;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(alerts::router())
        .merge(weather::router())
        .merge(crop_water::router())
        .merge(health::router())
        .with_state(state)
}
