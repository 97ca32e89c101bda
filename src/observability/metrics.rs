//! Metrics collection and exposition.
//!
//! # Metrics
//! - `graphql_proxy_requests_total` (counter): requests by route, status
//! - `graphql_proxy_cache_lookups_total` (counter): lookups by result
//! - `graphql_proxy_cache_store_failures_total` (counter)
//! - `graphql_proxy_upstream_errors_total` (counter)
//! - `graphql_proxy_upstream_duration_seconds` (histogram)
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    Error,
}

impl CacheLookup {
    fn as_str(self) -> &'static str {
        match self {
            CacheLookup::Hit => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Error => "error",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16) {
    counter!(
        "graphql_proxy_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_cache_lookup(result: CacheLookup) {
    counter!("graphql_proxy_cache_lookups_total", "result" => result.as_str()).increment(1);
}

pub fn record_cache_store_failure() {
    counter!("graphql_proxy_cache_store_failures_total").increment(1);
}

pub fn record_upstream(start: Instant, ok: bool) {
    histogram!("graphql_proxy_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
    if !ok {
        counter!("graphql_proxy_upstream_errors_total").increment(1);
    }
}
