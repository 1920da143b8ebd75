//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pushcache_transport_connections_total` (counter): transports opened, by scheme
//! - `pushcache_push_channel_reopens_total` (counter): pull channel reconnects
//! - `pushcache_push_promises_total` (counter): push promises received
//! - `pushcache_push_cache_puts_total` (counter): cache submissions, by outcome
//! - `pushcache_configurations_in_flight` (gauge): descriptors being ingested

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transport_opened(scheme: &'static str) {
    counter!("pushcache_transport_connections_total", "scheme" => scheme).increment(1);
}

pub fn record_channel_reopen() {
    counter!("pushcache_push_channel_reopens_total").increment(1);
}

pub fn record_push_promise() {
    counter!("pushcache_push_promises_total").increment(1);
}

pub fn record_cache_put(outcome: &'static str) {
    counter!("pushcache_push_cache_puts_total", "outcome" => outcome).increment(1);
}

pub fn record_in_flight(count: usize) {
    gauge!("pushcache_configurations_in_flight").set(count as f64);
}
