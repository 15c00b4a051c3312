//! Application entry point for the `irrigation-telemetry` service.
//!
//! This binary orchestrates the full startup sequence for the irrigation
//! telemetry pipeline, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Creating the session telemetry log and shared state
//! - Spawning the polling task (fetch → enrich → evaluate → record)
//! - Mounting the read-only API via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DEVICE_ACCESS_TOKEN` (**required**) – bearer token for the device API
//! - `POLL_INTERVAL_SECS` (optional) – poll cadence (default: 15)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config` for the complete list.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP) by
//! delegating configuration parsing to `config`, the polling loop to
//! `pipeline`, and route registration to `routes`.
use std::{env, net::SocketAddr};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod alerts;
mod cache;
mod config;
mod crop_water;
mod enrich;
mod models;
mod pipeline;
mod routes;
mod state;
mod telemetry;
mod telemetry_log;
mod weather;

#[cfg(test)]
mod test_support;

pub use config::Config;

// Re-exported for routes/*.rs, which only know their parent module (main.rs)
// and not the individual component modules.
pub use alerts::AlertEvent;
pub use crop_water::CropWaterInputs;
pub use models::{CurrentConditions, EnrichedReading};
pub use pipeline::Pipeline;
pub use state::AppState;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let state = AppState::new();
    let pipeline = Pipeline::from_config(&cfg)?;
    tokio::spawn(pipeline.run(state.clone()));

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global subscriber. Call once, before the first log line.
///
/// `RUST_LOG` wins over `AXUM_LOG_LEVEL`; either way the HTTP client crates
/// stay at `info` so per-poll connection chatter does not drown out the
/// cycle log. `FORCE_COLOR` overrides TTY detection and `AXUM_SPAN_EVENTS`
/// (`full` or `enter_exit`) widens span events beyond CLOSE.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = env::var("AXUM_LOG_LEVEL")
            .ok()
            .filter(|l| matches!(l.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
            .unwrap_or_else(|| "debug".to_string());
        EnvFilter::new(format!("{level},hyper=info,hyper_util=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
