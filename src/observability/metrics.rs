//! Metrics collection and exposition.
//!
//! # Metrics
//! - `curavault_submissions_total` (counter): submissions by outcome
//! - `curavault_confirmation_seconds` (histogram): submit-to-commit latency
//! - `curavault_queries_total` (counter): read-only queries by kind, outcome
//! - `curavault_uploads_total` / `curavault_upload_bytes_total` (counters)
//! - `curavault_provider_present` (gauge): 1 when a wallet provider is injected

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the final outcome of a submission:
/// `confirmed`, `rejected`, `aborted` or `timeout`.
pub fn record_submission(outcome: &'static str) {
    counter!("curavault_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_confirmation_latency(elapsed: Duration) {
    histogram!("curavault_confirmation_seconds").record(elapsed.as_secs_f64());
}

pub fn record_query(kind: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("curavault_queries_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_upload(bytes: usize) {
    counter!("curavault_uploads_total").increment(1);
    counter!("curavault_upload_bytes_total").increment(bytes as u64);
}

pub fn record_provider_present(present: bool) {
    gauge!("curavault_provider_present").set(if present { 1.0 } else { 0.0 });
}
