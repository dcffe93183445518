//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by method, status, rule
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_static_requests_total` (counter): requests served from the assets root
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter it is a no-op
//! - The Prometheus exporter is opt-in (`observability.metrics_enabled`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a proxied request.
pub fn record_request(method: &str, status: u16, rule: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let rule = rule.to_string();

    metrics::counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "rule" => rule.clone()
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status,
        "rule" => rule
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request answered from the served-assets root.
pub fn record_static(status: u16) {
    metrics::counter!("gateway_static_requests_total", "status" => status.to_string()).increment(1);
}
