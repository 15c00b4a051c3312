//! Helpers shared by unit tests that need a local HTTP upstream.

use std::time::Duration;

use axum::Router;

use crate::config::Config;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{}", addr)
}

/// Configuration pointing every upstream at a mock server on `base`.
///
/// Expects the device at `/devices/dev-1/allDataAPI`, the geocoder at
/// `/search` and the forecast at `/forecast`.
pub fn config(base: &str, location: &str) -> Config {
    // ---
    Config {
        access_token: "secret-token".into(),
        device_api_url: format!("{}/devices", base),
        device_id: "dev-1".into(),
        device_variable: "allDataAPI".into(),
        geocode_url: format!("{}/search", base),
        forecast_url: format!("{}/forecast", base),
        location_name: location.into(),
        forecast_hours: 24,
        poll_interval: Duration::from_secs(15),
        weather_cache_ttl: Duration::from_secs(300),
        http_timeout: Duration::from_secs(5),
        telemetry_log_path: None,
        listen_port: 0,
    }
}
