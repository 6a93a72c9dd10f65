use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionLog, RunState};
use crate::plan::ActionPlan;
use crate::types::UISchema;

/// Overall outcome of one orchestrated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Partial,
    Error,
}

impl From<RunState> for ResponseStatus {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Completed => ResponseStatus::Success,
            RunState::PartiallyCompleted => ResponseStatus::Partial,
            // Pending/Running never escape the executor; a non-terminal
            // state reaching the response layer is itself a failure.
            RunState::Failed | RunState::Pending | RunState::Running => ResponseStatus::Error,
        }
    }
}

/// Top-level response for one analyze-and-execute request.
///
/// Whatever stages actually ran are included even when the overall status
/// is an error; absence of a field does not imply the stage never ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<UISchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<ActionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionLog>,
    pub message: String,
}

impl AnalyzeResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            ui_schema: None,
            plan: None,
            execution: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_mapping() {
        assert_eq!(
            ResponseStatus::from(RunState::Completed),
            ResponseStatus::Success
        );
        assert_eq!(
            ResponseStatus::from(RunState::PartiallyCompleted),
            ResponseStatus::Partial
        );
        assert_eq!(ResponseStatus::from(RunState::Failed), ResponseStatus::Error);
    }

    #[test]
    fn test_error_response_has_no_stages() {
        let resp = AnalyzeResponse::error("extraction failed");
        assert_eq!(resp.status, ResponseStatus::Error);
        assert!(resp.ui_schema.is_none());
        assert!(resp.plan.is_none());
        assert!(resp.execution.is_none());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ResponseStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
