use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use scanforge_browser::SessionFactory;
use scanforge_core::{
    AnalyzeResponse, Extraction, ExtractionHint, ResponseStatus, RunState, UISchema,
};
use scanforge_executor::Executor;
use scanforge_extraction::ExtractionGateway;
use scanforge_planner::Planner;

/// Owns the end-to-end request lifecycle and is the sole writer of the
/// final response.
///
/// The pipeline is an explicit linear composition: extraction, then
/// planning, then execution, short-circuiting on the first unrecoverable
/// error. Whatever stages completed are always visible in the response,
/// even when a later stage failed.
pub struct Orchestrator {
    extraction: Arc<ExtractionGateway>,
    planner: Arc<Planner>,
    executor: Arc<Executor>,
    sessions: Arc<dyn SessionFactory>,
}

impl Orchestrator {
    pub fn new(
        extraction: Arc<ExtractionGateway>,
        planner: Arc<Planner>,
        executor: Arc<Executor>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            extraction,
            planner,
            executor,
            sessions,
        }
    }

    pub async fn run(
        &self,
        image: &[u8],
        intent: &str,
        _context: Option<serde_json::Value>,
        client_key: &str,
    ) -> AnalyzeResponse {
        let run_id = Uuid::new_v4();
        // The intent is untrusted free text; only its length is logged.
        info!(%run_id, intent_len = intent.len(), image_len = image.len(), "analyze request started");

        // Stage 1: extraction. Admission refusals and input rejections
        // resolve here; nothing further runs.
        let extracted = match self
            .extraction
            .extract(image, ExtractionHint::Form, client_key)
            .await
        {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(%run_id, error = %e, "extraction stage failed");
                return AnalyzeResponse::error(e.to_string());
            }
        };

        let schema: UISchema = match extracted.value {
            Extraction::UiSchema(schema) => schema,
            Extraction::Prescription(_) => {
                // A prescription read has nothing to plan against; report
                // the successful extraction and stop.
                return AnalyzeResponse {
                    status: ResponseStatus::Success,
                    ui_schema: None,
                    plan: None,
                    execution: None,
                    message: "prescription extracted; no executable form detected".into(),
                };
            }
        };

        if is_extract_only(intent) {
            info!(%run_id, "extraction-only intent, stopping after extraction");
            return AnalyzeResponse {
                status: ResponseStatus::Success,
                ui_schema: Some(schema),
                plan: None,
                execution: None,
                message: if extracted.cached {
                    "extraction complete (cached)".into()
                } else {
                    "extraction complete".into()
                },
            };
        }

        // Stage 2: planning. On failure the schema stays visible so the
        // caller sees the partial progress.
        let plan = match self.planner.plan(&schema, intent, client_key).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(%run_id, error = %e, "planning stage failed");
                return AnalyzeResponse {
                    status: ResponseStatus::Error,
                    ui_schema: Some(schema),
                    plan: None,
                    execution: None,
                    message: e.to_string(),
                };
            }
        };

        // Stage 3: execution. The session is acquired and released inside
        // the executor, so cancelling this future cannot leak it.
        let report = match self
            .executor
            .execute(run_id, &plan, self.sessions.as_ref())
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!(%run_id, error = %e, "execution stage failed to start");
                return AnalyzeResponse {
                    status: ResponseStatus::Error,
                    ui_schema: Some(schema),
                    plan: Some(plan),
                    execution: None,
                    message: e.to_string(),
                };
            }
        };

        let status = ResponseStatus::from(report.state);
        let message = match report.state {
            RunState::Completed => "plan executed successfully".to_string(),
            RunState::PartiallyCompleted => "plan partially executed; see execution log".to_string(),
            _ => "plan execution failed; see execution log".to_string(),
        };
        info!(%run_id, status = ?status, "analyze request finished");

        AnalyzeResponse {
            status,
            ui_schema: Some(schema),
            plan: Some(plan),
            execution: Some(report.log),
            message,
        }
    }
}

/// Intents like "extract" or "extract the fields" want the structured
/// read only; no plan or browser session is spent on them.
fn is_extract_only(intent: &str) -> bool {
    let intent = intent.trim().to_lowercase();
    intent == "extract" || intent.starts_with("extract ")
}
