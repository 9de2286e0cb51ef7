//! Dispatch metrics.
//!
//! # Metrics
//! - `ajax_dispatch_total` (counter): dispatches by method and outcome;
//!   non-standard methods share the `OTHER` label
//! - `ajax_dispatch_duration_seconds` (histogram): send to completion
//! - `ajax_transport_unavailable_total` (counter): every factory failed
//!
//! Recording is a no-op until the host installs a `metrics` recorder.

use std::time::Instant;

/// Outcome label values.
pub const OUTCOME_SUCCESS: &str = "success";
pub const OUTCOME_HTTP_ERROR: &str = "http_error";
pub const OUTCOME_FAILED: &str = "failed";

/// Label for methods outside the standard set.
pub const METHOD_OTHER: &str = "OTHER";

/// Bound the `method` label to the standard methods.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => METHOD_OTHER,
    }
}

/// Record a finished dispatch.
pub fn record_dispatch(method: &str, outcome: &'static str, start: Instant) {
    let method = method_label(method);
    metrics::counter!(
        "ajax_dispatch_total",
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "ajax_dispatch_duration_seconds",
        "method" => method
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record that no transport could be acquired.
pub fn record_transport_unavailable() {
    metrics::counter!("ajax_transport_unavailable_total").increment(1);
}
