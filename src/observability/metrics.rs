//! Metrics collection and exposition.
//!
//! # Metrics
//! - `views_operations_total` (counter): counter reads/increments by op, backend, outcome
//! - `views_backend_fallback_total` (counter): KV failures served from the file backend
//! - `views_degraded_mode` (gauge): 1 while production runs on the memory backend
//! - `views_kv_reconnects_total` (counter): reconnect attempts by outcome
//! - `views_retry_attempts_total` (counter): upstream retries scheduled
//! - `views_http_requests_total` (counter): requests by method, status
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_operation(op: &'static str, backend: &'static str, outcome: &'static str) {
    counter!(
        "views_operations_total",
        "op" => op,
        "backend" => backend,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fallback(op: &'static str) {
    counter!("views_backend_fallback_total", "op" => op).increment(1);
}

pub fn set_degraded(degraded: bool) {
    gauge!("views_degraded_mode").set(if degraded { 1.0 } else { 0.0 });
}

pub fn record_reconnect(outcome: &'static str) {
    counter!("views_kv_reconnects_total", "outcome" => outcome).increment(1);
}

pub fn record_retry() {
    counter!("views_retry_attempts_total").increment(1);
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "views_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
