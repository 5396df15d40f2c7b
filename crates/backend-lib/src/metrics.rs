// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys, plus the Prometheus exporter.
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing::warn;

/// Requests per operation, labelled by `operation` and `status`
pub const REQUESTS: &str = "auth.requests";
/// Request latency in seconds, labelled like [`REQUESTS`]
pub const REQUEST_DURATION: &str = "auth.request.duration_seconds";
pub const CREDENTIALS_CREATED: &str = "auth.credentials.created";
pub const TOKENS_ISSUED: &str = "auth.tokens.issued";
pub const TOKENS_REVOKED: &str = "auth.tokens.revoked";
/// A revoked refresh token was presented again
pub const REFRESH_REUSE: &str = "auth.refresh.reuse_detected";
pub const NOTIFICATION_FAILURES: &str = "auth.notifications.failed";

/// Operation label values
pub const OP_SIGN_UP: &str = "sign_up";
pub const OP_SIGN_IN: &str = "sign_in";
pub const OP_REFRESH: &str = "refresh_tokens";
pub const OP_VERIFY: &str = "verify_access_token";
pub const OP_LOGOUT: &str = "logout";

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Record one finished request
pub fn observe_request(operation: &'static str, status: u16, elapsed: Duration) {
    let status = status.to_string();
    metrics::counter!(REQUESTS, "operation" => operation, "status" => status.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, "operation" => operation, "status" => status)
        .record(elapsed.as_secs_f64());
}

/// Install the Prometheus recorder as the global recorder.
///
/// Idempotent: later calls return the handle of the first install.
pub fn install_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                warn!("another metrics recorder is already installed; /metrics stays empty");
            }
            handle
        })
        .clone()
}

/// Router serving the Prometheus text format on `/metrics`
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Serve `/metrics` on `listener` until `shutdown` resolves
pub async fn serve_metrics<F>(
    handle: PrometheusHandle,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let upkeep = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
            loop {
                ticker.tick().await;
                handle.run_upkeep();
            }
        })
    };
    let result = axum::serve(listener, metrics_router(handle))
        .with_graceful_shutdown(shutdown)
        .await;
    upkeep.abort();
    result
}
