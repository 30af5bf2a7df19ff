//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cascade_requests_total` (counter): requests by method, status
//! - `cascade_request_duration_seconds` (histogram): latency distribution
//! - `cascade_artifacts_dispatched_total` (counter): dispatches by artifact kind
//! - `cascade_render_errors_total` (counter): templates replaced by an error fragment
//! - `cascade_stops_total` (counter): cascades cut short by a stop signal
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exporter only when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "cascade_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cascade_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record an artifact handed to its handler.
pub fn record_dispatch(kind: &'static str) {
    metrics::counter!("cascade_artifacts_dispatched_total", "kind" => kind).increment(1);
}

/// Record a template that failed to render.
pub fn record_render_error() {
    metrics::counter!("cascade_render_errors_total").increment(1);
}

/// Record a cascade stopped by a layer.
pub fn record_stop() {
    metrics::counter!("cascade_stops_total").increment(1);
}
