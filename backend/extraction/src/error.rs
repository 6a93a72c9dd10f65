use scanforge_resilience::ResilienceError;
use thiserror::Error;

/// Why an extraction request failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The upload was rejected before any upstream call was made.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The vision capability answered, but not with anything structurally
    /// usable. Logged and surfaced, never retried automatically.
    #[error("upstream returned an invalid schema: {0}")]
    InvalidSchema(String),

    /// Admission-control refusal (open circuit or exhausted rate budget),
    /// passed through unchanged so the caller can decide to retry later.
    #[error(transparent)]
    Admission(ResilienceError),

    /// The vision capability itself failed or timed out.
    #[error("vision capability failed: {0}")]
    Upstream(String),
}

impl From<ResilienceError> for ExtractionError {
    fn from(err: ResilienceError) -> Self {
        if err.is_admission_refusal() {
            ExtractionError::Admission(err)
        } else {
            ExtractionError::Upstream(err.to_string())
        }
    }
}
