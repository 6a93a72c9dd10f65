use scanforge_resilience::ResilienceError;
use thiserror::Error;

/// Why a planning request failed.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The capability returned something that is not a structurally valid
    /// plan; it is never handed to the executor.
    #[error("malformed plan: {0}")]
    MalformedPlan(String),

    /// Admission-control refusal, passed through unchanged.
    #[error(transparent)]
    Admission(ResilienceError),

    /// The planning capability itself failed or timed out.
    #[error("planning capability failed: {0}")]
    Upstream(String),
}

impl From<ResilienceError> for PlanningError {
    fn from(err: ResilienceError) -> Self {
        if err.is_admission_refusal() {
            PlanningError::Admission(err)
        } else {
            PlanningError::Upstream(err.to_string())
        }
    }
}
