//! Call metrics.
//!
//! # Metrics
//! - `ledger_bridge_calls_total` (counter): boundary calls by operation, outcome
//! - `ledger_bridge_call_duration_seconds` (histogram): call latency by operation
//! - `ledger_bridge_gateway_errors_total` (counter): failures by error kind
//!
//! Updates go to whichever `metrics` recorder the host process installed.
//! Without one they are no-ops.

use std::time::Instant;

use crate::error::BridgeError;

/// Which boundary operation a call was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Read,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Write => "write",
            Operation::Read => "read",
        }
    }
}

/// Record the outcome and latency of one boundary call.
pub fn record_call<T>(operation: Operation, result: &Result<T, BridgeError>, start: Instant) {
    let outcome = match result {
        Ok(_) => "success",
        Err(_) => "failure",
    };

    metrics::counter!(
        "ledger_bridge_calls_total",
        "operation" => operation.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "ledger_bridge_call_duration_seconds",
        "operation" => operation.as_str()
    )
    .record(start.elapsed().as_secs_f64());

    if let Err(e) = result {
        metrics::counter!("ledger_bridge_gateway_errors_total", "kind" => e.kind()).increment(1);
    }
}
