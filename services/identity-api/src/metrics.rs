//! Prometheus metrics exposition
//!
//! Registers and exposes the service counters:
//!
//! - `auth_sign_ins_total` (counter): labels `channel`, `outcome`
//! - `auth_token_refreshes_total` (counter): label `outcome`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// The handle's `render()` method produces the Prometheus text exposition
/// format suitable for serving on a `/metrics` endpoint.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a sign-in attempt with channel and outcome labels.
///
/// `outcome` is `created`, `linked`, or an error kind label.
pub fn record_sign_in(channel: &str, outcome: &str) {
    metrics::counter!(
        "auth_sign_ins_total",
        "channel" => channel.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a token refresh with an outcome label.
pub fn record_refresh(outcome: &str) {
    metrics::counter!("auth_token_refreshes_total", "outcome" => outcome.to_string()).increment(1);
}
