//! State shared between the polling task and the HTTP handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::alerts::AlertEvent;
use crate::models::WeatherSnapshot;
use crate::pipeline::CycleOutcome;
use crate::telemetry_log::TelemetryLog;

// ---

/// A forecast together with the time it was fetched from upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedWeather {
    pub snapshot: WeatherSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// How the weather step of a cycle went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherStatus {
    /// Forecast came from upstream or a fresh cache entry.
    Ok,
    LocationNotFound { place: String },
    Unavailable { reason: String },
}

/// Summary of the most recent poll cycle, shown to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatus {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
    /// `None` when the cycle stopped before the weather step.
    pub weather: Option<WeatherStatus>,
    /// Set whenever the cycle was skipped or degraded.
    pub notice: Option<String>,
}

/// The polling task is the only writer; handlers take read locks.
#[derive(Clone, Default)]
pub struct AppState {
    pub log: Arc<RwLock<TelemetryLog>>,
    /// Alerts from the most recently recorded cycle.
    pub latest_alerts: Arc<RwLock<Vec<AlertEvent>>>,
    /// Last forecast successfully fetched.
    pub latest_weather: Arc<RwLock<Option<FetchedWeather>>>,
    pub last_cycle: Arc<RwLock<Option<CycleStatus>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
