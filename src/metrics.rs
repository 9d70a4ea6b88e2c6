//! Prometheus metrics for HTTP request tracking.
//!
//! Without an installed recorder every call here is a no-op, so handlers and
//! middleware record unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::{Result, ServiceError};

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_DURATION: &str = "http_request_duration_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");

    debug!("Metrics initialized");
}

/// Resolve the scrape listener address. The listener shares the HTTP
/// server's host, so a loopback-only service keeps its metrics private.
pub async fn scrape_address(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| ServiceError::InvalidConfig(format!("cannot resolve metrics host {host:?}")))
}

/// Install the Prometheus recorder and its scrape listener on `host:port`.
///
/// Must be called from within a tokio runtime.
pub async fn install_prometheus(host: &str, port: u16) -> Result<()> {
    let addr = scrape_address(host, port).await?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

/// Record one served request.
pub fn record_http_request(method: &str, route: &str, status: u16, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = status.to_string();
    counter!(
        METRIC_HTTP_REQUESTS,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status
    )
    .record(latency_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scrape_address_follows_http_host() {
        let loopback = scrape_address("127.0.0.1", 9100).await.unwrap();
        assert_eq!(loopback, SocketAddr::from(([127, 0, 0, 1], 9100)));

        let wildcard = scrape_address("0.0.0.0", 9100).await.unwrap();
        assert!(wildcard.ip().is_unspecified());
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        init_metrics();
        record_http_request("GET", "/health", 200, Instant::now());
    }
}
