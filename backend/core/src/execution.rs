use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    Failed,
    Skipped,
}

/// One line of the execution log, appended as each step resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub step: u32,
    pub outcome: StepOutcome,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionLogEntry {
    pub fn new(step: u32, outcome: StepOutcome, message: impl Into<String>) -> Self {
        Self {
            step,
            outcome,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered record of one plan execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub entries: Vec<ExecutionLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    /// Base64-encoded PNG reference, when capture was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// Lifecycle of one execution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    PartiallyCompleted,
    Failed,
}

impl RunState {
    /// Derive the terminal state from the log: all ok is `Completed`,
    /// a mix of ok and failed/skipped is `PartiallyCompleted`, and no
    /// ok at all is `Failed`.
    pub fn from_log(log: &ExecutionLog) -> Self {
        let ok = log
            .entries
            .iter()
            .filter(|e| e.outcome == StepOutcome::Ok)
            .count();
        let not_ok = log.entries.len() - ok;
        match (ok, not_ok) {
            (0, _) => RunState::Failed,
            (_, 0) => RunState::Completed,
            _ => RunState::PartiallyCompleted,
        }
    }
}

/// Terminal state plus the log that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub state: RunState,
    pub log: ExecutionLog,
}
