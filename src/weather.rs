//! Geocoding and forecast client.
//!
//! Resolves a free-text place name to coordinates and fetches current,
//! hourly and daily forecast data for a location. The client holds no
//! state besides its HTTP handle; caching is done by the caller (see
//! [`crate::cache`]).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{CurrentConditions, HourlySample, WeatherSnapshot};

// ---

const USER_AGENT: &str = concat!("irrigation-telemetry/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no location matches {0:?}")]
    NotFound(String),

    #[error("weather service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("weather service request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected weather service response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    latitude: f64,
    longitude: f64,
    current: Option<ForecastCurrent>,
    hourly: Option<ForecastHourly>,
    daily: Option<ForecastDaily>,
}

#[derive(Debug, Deserialize)]
struct ForecastCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    rain: Option<f64>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ForecastHourly {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForecastDaily {
    #[serde(default)]
    shortwave_radiation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    // ---
    client: Client,
    geocode_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(client: Client, geocode_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        // ---
        Self {
            client,
            geocode_url: geocode_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    /// Geocode `place` and return the first match as `(lat, lon)`.
    pub async fn resolve(&self, place: &str) -> Result<(f64, f64), WeatherError> {
        // ---
        tracing::debug!("Geocoding place: {:?}", place);

        let response = self
            .client
            .get(&self.geocode_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let matches: Vec<GeocodeMatch> = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(format!("geocoding response: {}", e)))?;

        let best = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(place.to_string()))?;

        let lat = parse_coordinate(&best.lat)?;
        let lon = parse_coordinate(&best.lon)?;
        Ok((lat, lon))
    }

    /// Fetch current, hourly and daily forecast data for a location.
    ///
    /// `hours` bounds the requested hourly horizon; the snapshot holds
    /// whatever range the service returns.
    pub async fn forecast(&self, lat: f64, lon: f64, hours: u32) -> Result<WeatherSnapshot, WeatherError> {
        // ---
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,is_day,precipitation,rain".to_string(),
                ),
                ("hourly", "temperature_2m,relative_humidity_2m".to_string()),
                ("daily", "shortwave_radiation_sum".to_string()),
                ("timezone", "UTC".to_string()),
                ("forecast_hours", hours.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(format!("forecast response: {}", e)))?;

        into_snapshot(payload)
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, WeatherError> {
    raw.trim()
        .parse()
        .map_err(|_| WeatherError::Decode(format!("coordinate is not numeric: {:?}", raw)))
}

fn parse_forecast_time(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

fn into_snapshot(payload: ForecastResponse) -> Result<WeatherSnapshot, WeatherError> {
    // ---
    let current = payload
        .current
        .ok_or_else(|| WeatherError::Decode("missing current conditions".into()))?;
    let daily = payload
        .daily
        .ok_or_else(|| WeatherError::Decode("missing daily aggregate".into()))?;

    let mut hourly = Vec::new();
    if let Some(series) = payload.hourly {
        for (idx, raw_time) in series.time.iter().enumerate() {
            let Some(timestamp) = parse_forecast_time(raw_time) else {
                tracing::debug!("Skipping hourly sample with bad time {:?}", raw_time);
                continue;
            };
            hourly.push(HourlySample {
                timestamp,
                temperature_c: series.temperature_2m.get(idx).copied().flatten(),
                relative_humidity: series.relative_humidity_2m.get(idx).copied().flatten(),
            });
        }
    }
    // Stable: equal timestamps keep their response order.
    hourly.sort_by_key(|s| s.timestamp);

    Ok(WeatherSnapshot {
        latitude: payload.latitude,
        longitude: payload.longitude,
        current: CurrentConditions {
            time: current.time.as_deref().and_then(parse_forecast_time),
            temperature_c: current.temperature_2m,
            relative_humidity: current.relative_humidity_2m,
            precipitation_mm: current.precipitation,
            rain_mm: current.rain,
            is_day: current.is_day.map(|flag| flag != 0),
        },
        hourly,
        daily_radiation_mj_m2: daily.shortwave_radiation_sum,
    })
}
