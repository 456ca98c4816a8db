//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fastdl_requests_total` (counter): responses by status code
//! - `fastdl_request_duration_seconds` (histogram): latency distribution
//! - `fastdl_cache_lookups_total` (counter): cache hits and misses
//! - `fastdl_rate_limited_total` (counter): requests rejected with 429
//! - `fastdl_blocked_total` (counter): requests rejected by the IP block list
//! - `fastdl_cache_bytes` (gauge): bytes held by the file cache
//! - `fastdl_precached_paths` (gauge): entries in the precached set

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("fastdl_requests_total", "status" => status.to_string()).increment(1);
    histogram!("fastdl_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("fastdl_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_rate_limited() {
    counter!("fastdl_rate_limited_total").increment(1);
}

pub fn record_blocked() {
    counter!("fastdl_blocked_total").increment(1);
}

pub fn record_cache_size(bytes: u64) {
    gauge!("fastdl_cache_bytes").set(bytes as f64);
}

pub fn record_precached_paths(count: usize) {
    gauge!("fastdl_precached_paths").set(count as f64);
}
