//! Poll-cycle driver: fetch, enrich, evaluate, record.
//!
//! One [`Pipeline`] runs on a single task and is the only writer of the
//! session log. It also owns the weather caches, so they need no locking.
//! Any failed fetch skips the cycle; the loop itself never stops.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alerts::{self, AlertEvent, Severity};
use crate::cache::{ForecastKey, TtlCache};
use crate::config::Config;
use crate::enrich;
use crate::models::{EnrichedReading, SensorReading, WeatherSnapshot};
use crate::state::{AppState, CycleStatus, FetchedWeather, WeatherStatus};
use crate::telemetry::TelemetryClient;
use crate::telemetry_log::LogFile;
use crate::weather::{WeatherClient, WeatherError};

// ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A reading was appended to the log.
    Recorded { alerts: usize },
    /// Nothing was recorded this cycle.
    Skipped { reason: String },
}

pub struct Pipeline {
    // ---
    telemetry: TelemetryClient,
    weather: WeatherClient,
    location_name: String,
    forecast_hours: u32,
    poll_interval: Duration,
    places: TtlCache<String, (f64, f64)>,
    forecasts: TtlCache<ForecastKey, FetchedWeather>,
    log_file: Option<LogFile>,
}

impl Pipeline {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        // ---
        let client = Client::builder().timeout(cfg.http_timeout).build()?;

        Ok(Self {
            telemetry: TelemetryClient::new(
                client.clone(),
                &cfg.device_api_url,
                &cfg.device_id,
                &cfg.device_variable,
                &cfg.access_token,
            ),
            weather: WeatherClient::new(client, &cfg.geocode_url, &cfg.forecast_url),
            location_name: cfg.location_name.clone(),
            forecast_hours: cfg.forecast_hours,
            poll_interval: cfg.poll_interval,
            places: TtlCache::new(cfg.weather_cache_ttl),
            forecasts: TtlCache::new(cfg.weather_cache_ttl),
            log_file: cfg.telemetry_log_path.as_ref().map(LogFile::new),
        })
    }

    /// Join a reading with the forecast and evaluate its thresholds.
    pub fn process(
        reading: SensorReading,
        snapshot: Option<&WeatherSnapshot>,
    ) -> (EnrichedReading, Vec<AlertEvent>) {
        // ---
        let enriched = enrich::join(reading, snapshot);
        let alerts = alerts::evaluate(&enriched);
        (enriched, alerts)
    }

    /// Forecast for the configured place, from cache when still fresh.
    ///
    /// A geocoding miss or a failed fetch yields no forecast; the reading is
    /// then recorded without forecast fields and the status says why.
    async fn current_weather(&mut self) -> (Option<FetchedWeather>, WeatherStatus) {
        // ---
        let now = Instant::now();

        let (lat, lon) = match self.places.get(&self.location_name, now) {
            Some(coords) => coords,
            None => match self.weather.resolve(&self.location_name).await {
                Ok(coords) => {
                    debug!("Resolved {:?} to {:?}", self.location_name, coords);
                    self.places.insert(self.location_name.clone(), coords, now);
                    coords
                }
                Err(WeatherError::NotFound(place)) => {
                    warn!(
                        "Location {:?} not found, try adding the country name (e.g. 'Paris, France'); skipping weather enrichment",
                        place
                    );
                    return (None, WeatherStatus::LocationNotFound { place });
                }
                Err(e) => {
                    warn!("Geocoding failed, skipping weather enrichment: {}", e);
                    return (None, WeatherStatus::Unavailable { reason: e.to_string() });
                }
            },
        };

        let key = ForecastKey::new(lat, lon, self.forecast_hours);
        if let Some(fetched) = self.forecasts.get(&key, now) {
            return (Some(fetched), WeatherStatus::Ok);
        }

        match self.weather.forecast(lat, lon, self.forecast_hours).await {
            Ok(snapshot) => {
                debug!("Fetched forecast with {} hourly samples", snapshot.hourly.len());
                let fetched = FetchedWeather {
                    snapshot,
                    fetched_at: Utc::now(),
                };
                self.forecasts.insert(key, fetched.clone(), now);
                (Some(fetched), WeatherStatus::Ok)
            }
            Err(e) => {
                warn!("Forecast fetch failed, skipping weather enrichment: {}", e);
                (None, WeatherStatus::Unavailable { reason: e.to_string() })
            }
        }
    }

    /// Run one poll cycle against the shared state.
    pub async fn run_cycle(&mut self, state: &AppState) -> CycleOutcome {
        // ---
        let reading = match self.telemetry.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Telemetry fetch failed, skipping cycle: {}", e);
                let outcome = CycleOutcome::Skipped {
                    reason: e.to_string(),
                };
                *state.last_cycle.write().await = Some(CycleStatus {
                    at: Utc::now(),
                    outcome: outcome.clone(),
                    weather: None,
                    notice: Some(format!("Telemetry fetch failed, cycle skipped: {}", e)),
                });
                return outcome;
            }
        };

        let (fetched, weather) = self.current_weather().await;
        let (enriched, alerts) =
            Self::process(reading, fetched.as_ref().map(|f| &f.snapshot));

        for alert in &alerts {
            match alert.severity {
                Severity::Advisory => warn!("Advisory: {}", alert.message),
                Severity::Urgent => error!("Urgent: {}", alert.message),
            }
        }

        if let Some(file) = &self.log_file {
            if let Err(e) = file.append(&enriched) {
                warn!("Failed to persist reading to {}: {:#}", file.path().display(), e);
            }
        }

        let total = {
            let mut log = state.log.write().await;
            log.append(enriched);
            log.len()
        };

        let alert_count = alerts.len();
        *state.latest_alerts.write().await = alerts;
        if fetched.is_some() {
            *state.latest_weather.write().await = fetched;
        }

        let notice = weather_notice(&weather);
        let outcome = CycleOutcome::Recorded {
            alerts: alert_count,
        };
        *state.last_cycle.write().await = Some(CycleStatus {
            at: Utc::now(),
            outcome: outcome.clone(),
            weather: Some(weather),
            notice,
        });

        info!("Recorded reading #{} with {} alert(s)", total, alert_count);
        outcome
    }

    /// Poll forever at the configured interval.
    pub async fn run(mut self, state: AppState) {
        // ---
        info!("Polling every {:?}", self.poll_interval);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = self.run_cycle(&state).await;
            debug!("Cycle outcome: {:?}", outcome);
        }
    }
}

/// Operator-facing text for a degraded weather step.
fn weather_notice(status: &WeatherStatus) -> Option<String> {
    // ---
    match status {
        WeatherStatus::Ok => None,
        WeatherStatus::LocationNotFound { place } => Some(format!(
            "Location {:?} not found, try adding the country name (e.g. 'Paris, France'); reading recorded without forecast",
            place
        )),
        WeatherStatus::Unavailable { reason } => Some(format!(
            "Weather unavailable, reading recorded without forecast: {}",
            reason
        )),
    }
}
