//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, status
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_rate_limited_total` (counter): requests denied admission
//! - `gateway_backend_attempts_total` (counter): model attempts by model, outcome
//! - `gateway_tracked_clients` (gauge): identities holding a rate-limit window
//! - `gateway_clients_evicted_total` (counter): windows dropped by sweep or cap
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Label used for requests that matched no route.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Middleware counting every response by route and status, rejections included.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_owned());

    let response = next.run(request).await;
    record_request(endpoint, response.status().as_u16(), start);
    response
}

pub fn record_request(endpoint: String, status: u16, start: Instant) {
    histogram!("gateway_request_duration_seconds", "endpoint" => endpoint.clone())
        .record(start.elapsed().as_secs_f64());
    counter!("gateway_requests_total", "endpoint" => endpoint, "status" => status.to_string()).increment(1);
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_backend_attempt(model: &str, outcome: &'static str) {
    counter!("gateway_backend_attempts_total", "model" => model.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gateway_tracked_clients").set(count as f64);
}

pub fn record_clients_evicted(count: usize) {
    counter!("gateway_clients_evicted_total").increment(count as u64);
}
