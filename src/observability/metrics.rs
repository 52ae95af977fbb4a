//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_exchanges_total` (counter): exchanges by method, status
//! - `gatekeeper_exchange_duration_seconds` (histogram): end-to-end latency
//! - `gatekeeper_proxy_errors_total` (counter): engine errors by kind
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Labels stay low-cardinality (no paths, no session IDs)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished exchange.
pub fn record_exchange(method: &str, status: u16, start: Instant) {
    counter!(
        "gatekeeper_exchanges_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gatekeeper_exchange_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record an error reported by the forwarding engine.
pub fn record_proxy_error(kind: &'static str) {
    counter!("gatekeeper_proxy_errors_total", "kind" => kind).increment(1);
}
