//! Metrics collection and exposition.
//!
//! # Metrics
//! - `jsontable_requests_total` (counter): requests by method, status
//! - `jsontable_request_duration_seconds` (histogram): dispatch latency
//! - `jsontable_persist_total` (counter): storage writes by outcome
//! - `jsontable_persist_duration_seconds` (histogram): storage write latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "jsontable_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("jsontable_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_persist(success: bool, start: Instant) {
    let outcome = if success { "ok" } else { "error" };
    ::metrics::counter!("jsontable_persist_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("jsontable_persist_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
