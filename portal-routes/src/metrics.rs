use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use error_stack::{Report, ResultExt};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::LazyLock;
use tokio::time::Instant;
use tracing::error;

const APPLICATIONS_SUBMITTED_METRIC_NAME: &str = "applications_submitted";
const STATUS_CHANGES_METRIC_NAME: &str = "application_status_changes";
const BATCH_ITEMS_METRIC_NAME: &str = "batch_items_processed";
const INTENTS_MATCHED_METRIC_NAME: &str = "intents_matched";
const APPLICATIONS_CLEARED_METRIC_NAME: &str = "applications_cleared";

const REQUEST_DURATION_METRIC_NAME: &str = "http_requests_duration_seconds";
const REQUEST_SIZE_METRIC_NAME: &str = "http_request_size";
const REQUESTS_TOTAL_METRIC_NAME: &str = "http_requests_total";

#[derive(Debug, thiserror::Error)]
#[error("failed to install the prometheus recorder")]
pub struct MetricsError;

/// The process-wide recorder. Installed on first use, so building the routes
/// more than once shares a single recorder.
static RECORDER: LazyLock<Option<PrometheusHandle>> = LazyLock::new(|| match install_recorder() {
    Ok(handle) => Some(handle),
    Err(e) => {
        error!("metrics will not be recorded: {e:?}");
        None
    }
});

pub fn recorder() -> Option<PrometheusHandle> {
    RECORDER.clone()
}

fn install_recorder() -> Result<PrometheusHandle, Report<MetricsError>> {
    const EXPONENTIAL_SECONDS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

    const REQ_RES_BUCKETS: &[f64] = &[128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0, 16384.0];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_METRIC_NAME.to_string()),
            EXPONENTIAL_SECONDS,
        )
        .change_context(MetricsError)?
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_SIZE_METRIC_NAME.to_string()),
            REQ_RES_BUCKETS,
        )
        .change_context(MetricsError)?
        .install_recorder()
        .change_context(MetricsError)
}

pub async fn track_http(req: Request, next: Next) -> impl IntoResponse {
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    if path.ends_with("metrics") {
        return next.run(req).await;
    }

    let method = req.method().clone();

    let req_size = req
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok());

    if let Some(req_size) = req_size {
        metrics::histogram!(REQUEST_SIZE_METRIC_NAME).record(req_size as f64);
    }

    let start = Instant::now();
    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!(REQUESTS_TOTAL_METRIC_NAME, &labels).increment(1);

    let histogram = metrics::histogram!(REQUEST_DURATION_METRIC_NAME, &labels);
    histogram.record(latency);
    response
}

#[inline]
pub fn increment_applications_submitted() {
    metrics::counter!(APPLICATIONS_SUBMITTED_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_status_changes() {
    metrics::counter!(STATUS_CHANGES_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_intents_matched() {
    metrics::counter!(INTENTS_MATCHED_METRIC_NAME).increment(1);
}

#[inline]
#[cfg(not(target_pointer_width = "64"))]
pub fn increment_batch_items_by(amt: usize, outcome: &'static str) {
    match TryInto::<u64>::try_into(amt) {
        Ok(amt) => {
            metrics::counter!(BATCH_ITEMS_METRIC_NAME, "outcome" => outcome).increment(amt);
        }
        Err(e) => {
            error!("could not increment batch items metric: {e}");
        }
    }
}

#[inline]
#[cfg(target_pointer_width = "64")]
pub fn increment_batch_items_by(amt: usize, outcome: &'static str) {
    metrics::counter!(BATCH_ITEMS_METRIC_NAME, "outcome" => outcome).increment(amt as u64);
}

#[inline]
#[cfg(not(target_pointer_width = "64"))]
pub fn increment_applications_cleared_by(amt: usize) {
    match TryInto::<u64>::try_into(amt) {
        Ok(amt) => {
            metrics::counter!(APPLICATIONS_CLEARED_METRIC_NAME).increment(amt);
        }
        Err(e) => {
            error!("could not increment applications cleared metric: {e}");
        }
    }
}

#[inline]
#[cfg(target_pointer_width = "64")]
pub fn increment_applications_cleared_by(amt: usize) {
    metrics::counter!(APPLICATIONS_CLEARED_METRIC_NAME).increment(amt as u64);
}
