use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ResilienceError;

/// Per-dependency circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are rejected until the cool-down elapses.
    Open,
    /// One probing call is allowed through.
    HalfOpen,
}

/// Thresholds governing one breaker instance. Injected per instance so
/// tests construct fresh state.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Consecutive failures within the rolling window before opening.
    pub failure_threshold: u32,
    /// Window over which failures accumulate.
    pub rolling_window: Duration,
    /// How long an open circuit rejects before allowing a probe.
    pub cool_down: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            rolling_window: Duration::from_secs(60),
            cool_down: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerEntry {
    state: CircuitState,
    failures: u32,
    window_start: Instant,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl BreakerEntry {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            window_start: Instant::now(),
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Ticket handed back by `admit`; carried through to `record_outcome` so a
/// half-open probe resolves the trial state it was admitted under.
#[derive(Debug, Clone, Copy)]
pub struct Admission {
    pub probe: bool,
}

/// Registry of circuit breakers, one entry per upstream dependency key.
/// Entries are created at first use and live for the process lifetime;
/// updates for one key are serialized under the map's write guard.
#[derive(Clone)]
pub struct CircuitBreaker {
    entries: Arc<RwLock<HashMap<String, BreakerEntry>>>,
    config: CircuitConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Decide whether a call to `dependency` may proceed.
    ///
    /// Open circuits transition to half-open lazily here once the
    /// cool-down has elapsed, admitting exactly one probe; concurrent
    /// callers keep getting `CircuitOpen` until the probe resolves.
    pub async fn admit(&self, dependency: &str) -> Result<Admission, ResilienceError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(dependency.to_string())
            .or_insert_with(BreakerEntry::new);

        match entry.state {
            CircuitState::Closed => Ok(Admission { probe: false }),
            CircuitState::Open => {
                let elapsed = entry
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.config.cool_down {
                    entry.state = CircuitState::HalfOpen;
                    entry.probe_in_flight = true;
                    info!(dependency, "circuit half-open, admitting probe");
                    Ok(Admission { probe: true })
                } else {
                    let retry_after_ms =
                        (self.config.cool_down - elapsed).as_millis() as u64;
                    Err(ResilienceError::CircuitOpen {
                        dependency: dependency.to_string(),
                        retry_after_ms,
                    })
                }
            }
            CircuitState::HalfOpen => {
                if entry.probe_in_flight {
                    Err(ResilienceError::CircuitOpen {
                        dependency: dependency.to_string(),
                        retry_after_ms: self.config.cool_down.as_millis() as u64,
                    })
                } else {
                    entry.probe_in_flight = true;
                    Ok(Admission { probe: true })
                }
            }
        }
    }

    /// Record the outcome of an admitted call.
    pub async fn record_outcome(&self, dependency: &str, admission: Admission, ok: bool) {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(dependency.to_string())
            .or_insert_with(BreakerEntry::new);

        if ok {
            if admission.probe {
                info!(dependency, "probe succeeded, circuit closed");
            }
            entry.state = CircuitState::Closed;
            entry.failures = 0;
            entry.probe_in_flight = false;
            entry.opened_at = None;
            return;
        }

        if admission.probe {
            warn!(dependency, "probe failed, circuit re-opened");
            entry.state = CircuitState::Open;
            entry.opened_at = Some(Instant::now());
            entry.probe_in_flight = false;
            return;
        }

        let now = Instant::now();
        if now.duration_since(entry.window_start) > self.config.rolling_window {
            entry.failures = 0;
            entry.window_start = now;
        }
        entry.failures += 1;
        if entry.failures >= self.config.failure_threshold {
            warn!(
                dependency,
                failures = entry.failures,
                "failure threshold reached, circuit opened"
            );
            entry.state = CircuitState::Open;
            entry.opened_at = Some(now);
        }
    }

    /// Current state for one dependency, for health reporting.
    pub async fn state(&self, dependency: &str) -> CircuitState {
        self.entries
            .read()
            .await
            .get(dependency)
            .map(|e| e.state)
            .unwrap_or(CircuitState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> CircuitConfig {
        CircuitConfig {
            failure_threshold: 3,
            rolling_window: Duration::from_secs(10),
            cool_down: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            let admission = breaker.admit("vision").await.unwrap();
            breaker.record_outcome("vision", admission, false).await;
        }
        assert_eq!(breaker.state("vision").await, CircuitState::Open);
        assert!(matches!(
            breaker.admit("vision").await,
            Err(ResilienceError::CircuitOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..2 {
            let admission = breaker.admit("vision").await.unwrap();
            breaker.record_outcome("vision", admission, false).await;
        }
        let admission = breaker.admit("vision").await.unwrap();
        breaker.record_outcome("vision", admission, true).await;
        for _ in 0..2 {
            let admission = breaker.admit("vision").await.unwrap();
            breaker.record_outcome("vision", admission, false).await;
        }
        // 2 + 2 failures with a success in between never reaches 3 in a row
        assert_eq!(breaker.state("vision").await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_exactly_one_probe_after_cool_down() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            let admission = breaker.admit("planner").await.unwrap();
            breaker.record_outcome("planner", admission, false).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;

        let first = breaker.admit("planner").await;
        let second = breaker.admit("planner").await;
        let admission = first.expect("first caller after cool-down is the probe");
        assert!(admission.probe);
        assert!(matches!(
            second,
            Err(ResilienceError::CircuitOpen { .. })
        ));

        breaker.record_outcome("planner", admission, true).await;
        assert_eq!(breaker.state("planner").await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_failed_probe_reopens() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            let admission = breaker.admit("vision").await.unwrap();
            breaker.record_outcome("vision", admission, false).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        let admission = breaker.admit("vision").await.unwrap();
        breaker.record_outcome("vision", admission, false).await;
        assert_eq!(breaker.state("vision").await, CircuitState::Open);
        assert!(breaker.admit("vision").await.is_err());
    }

    #[tokio::test]
    async fn test_independent_dependency_keys() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            let admission = breaker.admit("vision").await.unwrap();
            breaker.record_outcome("vision", admission, false).await;
        }
        assert_eq!(breaker.state("vision").await, CircuitState::Open);
        assert!(breaker.admit("planner").await.is_ok());
    }
}
