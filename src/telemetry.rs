//! Client for the device's cloud variable API.
//!
//! One call reads one comma-encoded reading vector and parses it into a
//! [`SensorReading`]. There is no retry and no caching here; the polling
//! loop decides what to do with a failed cycle.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Channel, SensorReading};

// ---

/// Why a telemetry fetch produced no reading.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("device API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("device API request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed telemetry payload: {0}")]
    Malformed(String),
}

/// Body of a successful variable read.
#[derive(Debug, Deserialize)]
struct VariableResponse {
    result: String,
}

/// Reads the reading vector of a single device variable.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    // ---
    client: Client,
    base_url: String,
    device_id: String,
    variable: String,
    access_token: String,
}

impl TelemetryClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        device_id: impl Into<String>,
        variable: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        // ---
        Self {
            client,
            base_url: base_url.into(),
            device_id: device_id.into(),
            variable: variable.into(),
            access_token: access_token.into(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.device_id,
            self.variable
        )
    }

    /// Fetch and parse one reading, stamped with the time the response arrived.
    pub async fn fetch(&self) -> Result<SensorReading, FetchError> {
        // ---
        let url = self.url();
        tracing::debug!("Fetching telemetry from: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let timestamp = Utc::now();

        if status != StatusCode::OK {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Telemetry raw response: {}", body);

        let parsed: VariableResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Malformed(format!("unexpected response body: {}", e)))?;

        parse_reading(&parsed.result, timestamp)
    }
}

/// Parse the device's 12-token reading vector.
///
/// An empty token is a missing field. Any other token must be a finite
/// number, otherwise the whole reading is rejected.
pub fn parse_reading(raw: &str, timestamp: DateTime<Utc>) -> Result<SensorReading, FetchError> {
    // ---
    let tokens: Vec<&str> = raw.split(',').collect();
    if tokens.len() != Channel::ALL.len() {
        return Err(FetchError::Malformed(format!(
            "expected {} tokens, got {}",
            Channel::ALL.len(),
            tokens.len()
        )));
    }

    let mut reading = SensorReading::empty(timestamp);
    for (channel, raw_token) in Channel::ALL.iter().zip(tokens) {
        let token = raw_token.trim();
        if token.is_empty() {
            reading.set_parsed(*channel, None, raw_token);
            continue;
        }
        let value: f64 = token
            .parse()
            .map_err(|_| FetchError::Malformed(format!("{} is not numeric: {:?}", channel, token)))?;
        if !value.is_finite() {
            return Err(FetchError::Malformed(format!(
                "{} is not finite: {:?}",
                channel, token
            )));
        }
        reading.set_parsed(*channel, Some(value), raw_token);
    }

    Ok(reading)
}
