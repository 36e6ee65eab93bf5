//! Metrics collection and exposition.
//!
//! # Metrics
//! - `page_materializations_total` (counter): by outcome (`built`, `memoized`)
//! - `page_load_failures_total` (counter)
//! - `page_load_duration_seconds` (histogram): loader latency seen by the policy
//! - `page_compilations_total` (counter): by result (`ok`, `error`)
//! - `page_compile_duration_seconds` (histogram)
//! - `page_requests_total` (counter): by status

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_materialization(outcome: &'static str) {
    counter!("page_materializations_total", "outcome" => outcome).increment(1);
}

pub fn record_load_failure() {
    counter!("page_load_failures_total").increment(1);
}

pub fn record_load_duration(start: Instant) {
    histogram!("page_load_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_compilation(ok: bool, start: Instant) {
    let result = if ok { "ok" } else { "error" };
    counter!("page_compilations_total", "result" => result).increment(1);
    histogram!("page_compile_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_request(status: u16) {
    counter!("page_requests_total", "status" => status.to_string()).increment(1);
}
