//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (requests, latency, loaded routes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `factrice_dispatch_total` (counter): handled requests by route, status
//! - `factrice_dispatch_duration_seconds` (histogram): end-to-end latency by route
//! - `factrice_routes_loaded` (gauge): routes in the registry
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording is a no-op until an exporter is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_dispatch(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "factrice_dispatch_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("factrice_dispatch_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_routes_loaded(count: usize) {
    metrics::gauge!("factrice_routes_loaded").set(count as f64);
}
