//! Configuration loader for the `irrigation-telemetry` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Result};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Lower bound for the weather cache TTL, seconds.
const MIN_WEATHER_CACHE_TTL_SECS: u64 = 60;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Bearer credential for the device cloud API.
    pub access_token: String,

    /// Device cloud API base URL (`<base>/<device>/<variable>`).
    pub device_api_url: String,

    pub device_id: String,

    /// Name of the device variable holding the reading vector.
    pub device_variable: String,

    pub geocode_url: String,

    pub forecast_url: String,

    /// Place name resolved to coordinates for forecast enrichment.
    pub location_name: String,

    /// Requested hourly forecast horizon.
    pub forecast_hours: u32,

    pub poll_interval: Duration,

    pub weather_cache_ttl: Duration,

    pub http_timeout: Duration,

    /// Persisted log path; `None` disables the file copy.
    pub telemetry_log_path: Option<PathBuf>,

    pub listen_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DEVICE_ACCESS_TOKEN` – bearer token for the device cloud API
///
/// Optional:
/// - `DEVICE_API_URL` (default: `https://api.particle.io/v1/devices`)
/// - `DEVICE_ID`, `DEVICE_VARIABLE` (default: deployment device, `allDataAPI`)
/// - `GEOCODE_URL`, `FORECAST_URL` – Nominatim / Open-Meteo endpoints
/// - `LOCATION_NAME` (default: `Kandahar`)
/// - `FORECAST_HOURS` (default: 24)
/// - `POLL_INTERVAL_SECS` (default: 15)
/// - `WEATHER_CACHE_TTL_SECS` (default: 300, minimum 60)
/// - `HTTP_TIMEOUT_SECS` (default: 10)
/// - `TELEMETRY_LOG_PATH` (default: `data/telemetry_log.csv`, empty disables)
/// - `LISTEN_PORT` (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let access_token = require_env!("DEVICE_ACCESS_TOKEN");
    let device_api_url = env_or!("DEVICE_API_URL", "https://api.particle.io/v1/devices");
    let device_id = env_or!("DEVICE_ID", "420027000d47373336373936");
    let device_variable = env_or!("DEVICE_VARIABLE", "allDataAPI");
    let geocode_url = env_or!("GEOCODE_URL", "https://nominatim.openstreetmap.org/search");
    let forecast_url = env_or!("FORECAST_URL", "https://api.open-meteo.com/v1/forecast");
    let location_name = env_or!("LOCATION_NAME", "Kandahar");
    let forecast_hours = parse_env!("FORECAST_HOURS", u32, 24);
    let poll_interval_secs = parse_env!("POLL_INTERVAL_SECS", u64, 15);
    let weather_cache_ttl_secs = parse_env!("WEATHER_CACHE_TTL_SECS", u64, 300);
    let http_timeout_secs = parse_env!("HTTP_TIMEOUT_SECS", u64, 10);
    let telemetry_log_path = env_or!("TELEMETRY_LOG_PATH", "data/telemetry_log.csv");
    let listen_port = parse_env!("LISTEN_PORT", u16, 8080);

    if poll_interval_secs == 0 {
        bail!("POLL_INTERVAL_SECS must be greater than zero");
    }
    if weather_cache_ttl_secs < MIN_WEATHER_CACHE_TTL_SECS {
        bail!(
            "WEATHER_CACHE_TTL_SECS must be at least {}",
            MIN_WEATHER_CACHE_TTL_SECS
        );
    }

    Ok(Config {
        access_token,
        device_api_url,
        device_id,
        device_variable,
        geocode_url,
        forecast_url,
        location_name,
        forecast_hours,
        poll_interval: Duration::from_secs(poll_interval_secs),
        weather_cache_ttl: Duration::from_secs(weather_cache_ttl_secs),
        http_timeout: Duration::from_secs(http_timeout_secs),
        telemetry_log_path: (!telemetry_log_path.trim().is_empty())
            .then(|| PathBuf::from(telemetry_log_path)),
        listen_port,
    })
}

/// Show only the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the access token while showing all other configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        let log_path = self
            .telemetry_log_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(disabled)".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  DEVICE_ACCESS_TOKEN    : {}", mask_secret(&self.access_token));
        tracing::info!("  DEVICE_API_URL         : {}", self.device_api_url);
        tracing::info!("  DEVICE_ID              : {}", self.device_id);
        tracing::info!("  DEVICE_VARIABLE        : {}", self.device_variable);
        tracing::info!("  GEOCODE_URL            : {}", self.geocode_url);
        tracing::info!("  FORECAST_URL           : {}", self.forecast_url);
        tracing::info!("  LOCATION_NAME          : {}", self.location_name);
        tracing::info!("  FORECAST_HOURS         : {}", self.forecast_hours);
        tracing::info!("  POLL_INTERVAL_SECS     : {}", self.poll_interval.as_secs());
        tracing::info!("  WEATHER_CACHE_TTL_SECS : {}", self.weather_cache_ttl.as_secs());
        tracing::info!("  HTTP_TIMEOUT_SECS      : {}", self.http_timeout.as_secs());
        tracing::info!("  TELEMETRY_LOG_PATH     : {}", log_path);
        tracing::info!("  LISTEN_PORT            : {}", self.listen_port);
    }
}
