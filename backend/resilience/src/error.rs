use thiserror::Error;

/// Why a wrapped call was refused or failed.
///
/// `CircuitOpen` and `RateLimited` are admission-control refusals: the
/// operation was never invoked and the caller may retry later. `Timeout`
/// and `Upstream` mean the operation ran and failed; both count against
/// the dependency's circuit.
#[derive(Debug, Error)]
pub enum ResilienceError {
    #[error("circuit open for dependency '{dependency}', retry in {retry_after_ms}ms")]
    CircuitOpen {
        dependency: String,
        retry_after_ms: u64,
    },

    #[error("rate limit exceeded for client '{key}', retry in {retry_after_ms}ms")]
    RateLimited { key: String, retry_after_ms: u64 },

    #[error("call to '{dependency}' timed out after {after_ms}ms")]
    Timeout { dependency: String, after_ms: u64 },

    #[error("call to '{dependency}' failed: {source}")]
    Upstream {
        dependency: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ResilienceError {
    /// Admission-control refusals never invoked the operation and are
    /// retriable later, never a bug signal.
    pub fn is_admission_refusal(&self) -> bool {
        matches!(
            self,
            ResilienceError::CircuitOpen { .. } | ResilienceError::RateLimited { .. }
        )
    }
}
