//! Execution Event Sink
//!
//! Every executed step is mirrored here before it reaches the log files.
//! Messages pass through the PHI guard's redaction first; raw step text
//! never hits disk. Internal stack detail stays out of these events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use scanforge_core::{ExecutionLogEntry, StepOutcome};
use scanforge_guard::redact;

#[derive(Debug, Serialize)]
pub struct ExecutionEvent {
    pub run_id: Uuid,
    pub step: u32,
    pub outcome: StepOutcome,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Record one step outcome, redacted.
pub fn log_step(run_id: Uuid, entry: &ExecutionLogEntry) {
    let event = ExecutionEvent {
        run_id,
        step: entry.step,
        outcome: entry.outcome,
        message: redact(&entry.message),
        timestamp: entry.timestamp,
    };
    info!(target: "execution_events", event = ?event, "execution step");
}
