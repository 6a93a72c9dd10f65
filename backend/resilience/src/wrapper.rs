use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

use crate::circuit::{CircuitBreaker, CircuitConfig, CircuitState};
use crate::error::ResilienceError;
use crate::rate::{RateConfig, RateLimiter};

/// Decorator applying rate limiting, circuit breaking, and a call deadline
/// to any external operation.
///
/// One wrapper instance is created at process start and shared by every
/// caller; breaker and bucket state live behind it and are never touched
/// directly by upper layers.
#[derive(Clone)]
pub struct ResilienceWrapper {
    circuit: CircuitBreaker,
    rate: RateLimiter,
    call_timeout: Duration,
}

impl ResilienceWrapper {
    pub fn new(circuit: CircuitConfig, rate: RateConfig, call_timeout: Duration) -> Self {
        Self {
            circuit: CircuitBreaker::new(circuit),
            rate: RateLimiter::new(rate),
            call_timeout,
        }
    }

    /// Run `operation` against `dependency` on behalf of `client_key`.
    ///
    /// Rejects before invoking the operation when the client is out of
    /// tokens or the dependency's circuit is open. Otherwise the operation
    /// runs under the configured deadline; a timeout is recorded against
    /// the circuit exactly like an upstream failure.
    ///
    /// Only the dependency key, outcome, and latency are ever logged here;
    /// payload redaction is the caller's concern before anything else is
    /// written.
    pub async fn call<T, F>(
        &self,
        dependency: &str,
        client_key: &str,
        operation: F,
    ) -> Result<T, ResilienceError>
    where
        F: Future<Output = Result<T>>,
    {
        self.rate.try_acquire(client_key).await?;
        let admission = self.circuit.admit(dependency).await?;

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.call_timeout, operation).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(value)) => {
                self.circuit.record_outcome(dependency, admission, true).await;
                info!(dependency, outcome = "ok", latency_ms, "upstream call");
                Ok(value)
            }
            Ok(Err(source)) => {
                self.circuit
                    .record_outcome(dependency, admission, false)
                    .await;
                warn!(dependency, outcome = "failed", latency_ms, "upstream call");
                Err(ResilienceError::Upstream {
                    dependency: dependency.to_string(),
                    source,
                })
            }
            Err(_) => {
                self.circuit
                    .record_outcome(dependency, admission, false)
                    .await;
                warn!(dependency, outcome = "timeout", latency_ms, "upstream call");
                Err(ResilienceError::Timeout {
                    dependency: dependency.to_string(),
                    after_ms: self.call_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Circuit state for one dependency, for health reporting.
    pub async fn circuit_state(&self, dependency: &str) -> CircuitState {
        self.circuit.state(dependency).await
    }

    /// Periodic maintenance: evict rate buckets idle past their horizon.
    pub async fn prune(&self) {
        let evicted = self.rate.prune_idle().await;
        if evicted > 0 {
            info!(evicted, "pruned idle rate buckets");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn wrapper(threshold: u32, cool_down_ms: u64, timeout_ms: u64) -> ResilienceWrapper {
        ResilienceWrapper::new(
            CircuitConfig {
                failure_threshold: threshold,
                rolling_window: Duration::from_secs(10),
                cool_down: Duration::from_millis(cool_down_ms),
            },
            RateConfig {
                max_requests: 100,
                window: Duration::from_secs(1),
                idle_eviction: Duration::from_secs(60),
            },
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_open_circuit_skips_operation() {
        let wrapper = wrapper(2, 5_000, 1_000);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let result: Result<(), _> = wrapper
                .call("vision", "client", async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("boom")
                })
                .await;
            assert!(matches!(result, Err(ResilienceError::Upstream { .. })));
        }

        let calls2 = Arc::clone(&calls);
        let result: Result<(), _> = wrapper
            .call("vision", "client", async move {
                calls2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let wrapper = wrapper(1, 5_000, 10);
        let result: Result<(), _> = wrapper
            .call("vision", "client", async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ResilienceError::Timeout { .. })));
        assert_eq!(wrapper.circuit_state("vision").await, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_recovery_through_probe() {
        let wrapper = wrapper(1, 30, 1_000);
        let result: Result<(), _> = wrapper
            .call("vision", "client", async { anyhow::bail!("boom") })
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(40)).await;
        let result: Result<&str, _> = wrapper
            .call("vision", "client", async { Ok("recovered") })
            .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(wrapper.circuit_state("vision").await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_rate_refusal_before_circuit() {
        let wrapper = ResilienceWrapper::new(
            CircuitConfig::default(),
            RateConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
                idle_eviction: Duration::from_secs(60),
            },
            Duration::from_secs(1),
        );
        let ok: Result<(), _> = wrapper.call("vision", "client", async { Ok(()) }).await;
        assert!(ok.is_ok());
        let limited: Result<(), _> = wrapper.call("vision", "client", async { Ok(()) }).await;
        assert!(matches!(limited, Err(ResilienceError::RateLimited { .. })));
    }
}
