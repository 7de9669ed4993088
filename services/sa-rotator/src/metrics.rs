//! Prometheus metrics exposition
//!
//! The pool crates emit through the `metrics` facade:
//!
//! - `sa_pool_rotations_total` (counter): label `kind` (roll, stale, replace)
//! - `sa_pool_blacklisted_total` (counter)
//! - `sa_pool_preload_failures_total` (counter)
//! - `sa_pool_preloaded` (gauge)
//!
//! The service adds its own request accounting for the operator API:
//!
//! - `sa_rotator_requests_total` (counter): labels `route`, `status`
//! - `sa_rotator_request_duration_seconds` (histogram): label `route`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("sa_rotator_request_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = builder()?.install_recorder()?;
    Ok(handle)
}

/// Record a completed operator API request.
pub fn record_request(route: &str, status: u16, duration_secs: f64) {
    metrics::counter!("sa_rotator_requests_total", "route" => route.to_string(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!("sa_rotator_request_duration_seconds", "route" => route.to_string())
        .record(duration_secs);
}

#[cfg(test)]
pub(crate) fn isolated_recorder() -> (
    metrics_exporter_prometheus::PrometheusRecorder,
    PrometheusHandle,
) {
    let recorder = builder()
        .expect("failed to set histogram buckets")
        .build_recorder();
    let handle = recorder.handle();
    (recorder, handle)
}
