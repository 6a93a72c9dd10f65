use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::Result;
use base64::Engine;
use futures::FutureExt;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use scanforge_browser::{PageSession, SessionFactory};
use scanforge_core::{
    ActionKind, ActionPlan, ActionStep, ExecutionLog, ExecutionLogEntry, ExecutionReport,
    RunState, StepOutcome,
};

/// Tunables for one executor instance.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Deadline applied to every individual step.
    pub step_timeout: Duration,
    /// Attach a screenshot reference to the log after the walk.
    pub capture_screenshot: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(15),
            capture_screenshot: false,
        }
    }
}

/// The browser session could not be acquired; no step was attempted.
#[derive(Debug, Error)]
#[error("browser session unavailable: {0}")]
pub struct SessionUnavailable(pub anyhow::Error);

/// Walks a validated plan step by step against one exclusively-owned
/// browser session.
///
/// Failure policy: a failed `read` does not block the remaining readable
/// fields, but a failed state-changing step (`navigate`, `click`, `fill`,
/// `select`, and `wait` on deadline overrun) invalidates every later
/// step's target assumptions, so the remainder is marked skipped.
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Run one plan. The session is acquired on entry to `Running` and
    /// released on every exit path, including a panicking step.
    pub async fn execute(
        &self,
        run_id: Uuid,
        plan: &ActionPlan,
        sessions: &dyn SessionFactory,
    ) -> Result<ExecutionReport, SessionUnavailable> {
        let session = sessions.acquire().await.map_err(SessionUnavailable)?;

        info!(%run_id, task = %plan.task, steps = plan.steps.len(), "execution started");

        let walked = AssertUnwindSafe(self.walk(run_id, plan, session.as_ref()))
            .catch_unwind()
            .await;
        let mut log = match walked {
            Ok(log) => log,
            Err(_) => {
                error!(%run_id, "executor fault: a step panicked");
                let entry =
                    ExecutionLogEntry::new(0, StepOutcome::Failed, "executor fault: step panicked");
                logging::log_step(run_id, &entry);
                ExecutionLog {
                    entries: vec![entry],
                    final_url: None,
                    screenshot: None,
                }
            }
        };

        match session.current_url().await {
            Ok(url) if !url.is_empty() => log.final_url = Some(url),
            _ => {}
        }
        if self.config.capture_screenshot {
            match session.screenshot().await {
                Ok(png) => {
                    log.screenshot =
                        Some(base64::engine::general_purpose::STANDARD.encode(png));
                }
                Err(e) => warn!(%run_id, error = %e, "screenshot capture failed"),
            }
        }

        if let Err(e) = session.close().await {
            warn!(%run_id, error = %e, "session close failed");
        }

        let state = RunState::from_log(&log);
        info!(%run_id, state = ?state, "execution finished");
        Ok(ExecutionReport { state, log })
    }

    async fn walk(
        &self,
        run_id: Uuid,
        plan: &ActionPlan,
        session: &dyn PageSession,
    ) -> ExecutionLog {
        let mut log = ExecutionLog::default();
        let mut skip_rest = false;

        for step in &plan.steps {
            if skip_rest {
                let entry = ExecutionLogEntry::new(
                    step.step,
                    StepOutcome::Skipped,
                    "skipped after earlier failure",
                );
                logging::log_step(run_id, &entry);
                log.entries.push(entry);
                continue;
            }

            let outcome = tokio::time::timeout(self.config.step_timeout, perform(step, session))
                .await;
            let entry = match outcome {
                Ok(Ok(message)) => ExecutionLogEntry::new(step.step, StepOutcome::Ok, message),
                Ok(Err(e)) => {
                    if step.action.is_state_changing() {
                        skip_rest = true;
                    }
                    ExecutionLogEntry::new(
                        step.step,
                        StepOutcome::Failed,
                        format!("{} '{}' failed: {e}", step.action, step.target),
                    )
                }
                Err(_) => {
                    if step.action.is_state_changing() {
                        skip_rest = true;
                    }
                    ExecutionLogEntry::new(
                        step.step,
                        StepOutcome::Failed,
                        format!(
                            "{} '{}' timed out after {}ms",
                            step.action,
                            step.target,
                            self.config.step_timeout.as_millis()
                        ),
                    )
                }
            };
            logging::log_step(run_id, &entry);
            log.entries.push(entry);
        }

        log
    }
}

async fn perform(step: &ActionStep, session: &dyn PageSession) -> Result<String> {
    match step.action {
        ActionKind::Navigate => {
            session.navigate(&step.target).await?;
            Ok(format!("navigated to {}", step.target))
        }
        ActionKind::Click => {
            session.click(&step.target).await?;
            Ok(format!("clicked '{}'", step.target))
        }
        ActionKind::Fill => {
            let value = step.value.as_deref().unwrap_or_default();
            session.fill(&step.target, value).await?;
            Ok(format!("filled '{}'", step.target))
        }
        ActionKind::Select => {
            let value = step.value.as_deref().unwrap_or_default();
            session.select(&step.target, value).await?;
            Ok(format!("selected '{}' in '{}'", value, step.target))
        }
        ActionKind::Read => {
            let text = session.read_text(&step.target).await?;
            Ok(format!("read '{}': {}", step.target, text))
        }
        ActionKind::Wait => {
            let ms = step
                .value
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000);
            session.wait_ms(ms).await?;
            Ok(format!("waited {ms}ms"))
        }
    }
}
