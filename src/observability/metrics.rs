//! Metrics collection.
//!
//! # Metrics
//! - `ledger_submissions_total` (counter): submissions by network, outcome
//! - `ledger_receipt_polls_total` (counter): receipt polls by network
//! - `ledger_confirmation_seconds` (histogram): broadcast-to-receipt latency
//! - `ledger_retries_total` (counter): retry waits scheduled

use std::time::Duration;

/// Record the terminal outcome of one submission.
pub fn record_submission(network: &str, outcome: &'static str) {
    metrics::counter!(
        "ledger_submissions_total",
        "network" => network.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one receipt poll.
pub fn record_poll(network: &str) {
    metrics::counter!("ledger_receipt_polls_total", "network" => network.to_string()).increment(1);
}

/// Record time from broadcast to receipt.
pub fn record_confirmation_latency(network: &str, elapsed: Duration) {
    metrics::histogram!("ledger_confirmation_seconds", "network" => network.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a scheduled retry.
pub fn record_retry() {
    metrics::counter!("ledger_retries_total").increment(1);
}
