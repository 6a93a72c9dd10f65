use std::sync::Arc;

use scanforge_core::{ActionPlan, PlanCapabilityRequest, PlanProvider, UISchema};
use scanforge_resilience::ResilienceWrapper;
use tracing::info;

use crate::error::PlanningError;

/// Tunables for the planning stage.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Turns {UI schema, free-text intent} into a validated `ActionPlan`.
///
/// The capability is called through the resilience wrapper under the
/// `planner` dependency key; whatever comes back is validated against the
/// plan invariants before anything downstream can see it.
pub struct Planner {
    provider: Arc<dyn PlanProvider>,
    wrapper: Arc<ResilienceWrapper>,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        provider: Arc<dyn PlanProvider>,
        wrapper: Arc<ResilienceWrapper>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            provider,
            wrapper,
            config,
        }
    }

    pub async fn plan(
        &self,
        schema: &UISchema,
        intent: &str,
        client_key: &str,
    ) -> Result<ActionPlan, PlanningError> {
        let schema_json = serde_json::to_string(schema)
            .map_err(|e| PlanningError::Upstream(format!("schema not serializable: {e}")))?;

        let request = PlanCapabilityRequest {
            schema_json,
            intent: intent.to_string(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let provider = Arc::clone(&self.provider);
        let response = self
            .wrapper
            .call("planner", client_key, async move {
                provider.plan(&request).await
            })
            .await?;

        info!(
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "planning capability responded"
        );

        let body = strip_code_fences(&response.content);
        let plan: ActionPlan = serde_json::from_str(body)
            .map_err(|e| PlanningError::MalformedPlan(format!("not a valid plan: {e}")))?;
        plan.validate()
            .map_err(|violation| PlanningError::MalformedPlan(violation.to_string()))?;

        info!(steps = plan.steps.len(), "plan validated");
        Ok(plan)
    }
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scanforge_core::ActionKind;
    use scanforge_resilience::{CircuitConfig, RateConfig};

    use super::*;
    use crate::providers::mock::MockPlanner;

    fn wrapper() -> Arc<ResilienceWrapper> {
        Arc::new(ResilienceWrapper::new(
            CircuitConfig::default(),
            RateConfig::default(),
            Duration::from_secs(1),
        ))
    }

    fn schema() -> UISchema {
        UISchema {
            page_type: "refill_form".into(),
            url_hint: Some("https://pharmacy.example.com/refill".into()),
            elements: vec![],
        }
    }

    fn planner_with(response: &str) -> Planner {
        Planner::new(
            Arc::new(MockPlanner::new("mock").with_response(response)),
            wrapper(),
            PlannerConfig::default(),
        )
    }

    const VALID_PLAN: &str = r#"{
        "task": "refill prescription",
        "steps": [
            {"step": 1, "action": "navigate", "target": "https://pharmacy.example.com/refill", "description": "open the refill page"},
            {"step": 2, "action": "fill", "target": "rx_number", "value": "12345", "description": "enter the rx number"},
            {"step": 3, "action": "click", "target": "submit", "description": "submit"}
        ]
    }"#;

    #[tokio::test]
    async fn test_valid_plan_accepted() {
        let plan = planner_with(VALID_PLAN)
            .plan(&schema(), "refill my prescription", "client")
            .await
            .unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[0].action, ActionKind::Navigate);
    }

    #[tokio::test]
    async fn test_fenced_plan_accepted() {
        let fenced = format!("```json\n{VALID_PLAN}\n```");
        let plan = planner_with(&fenced)
            .plan(&schema(), "refill", "client")
            .await
            .unwrap();
        assert_eq!(plan.steps.len(), 3);
    }

    #[tokio::test]
    async fn test_bad_ordinals_rejected() {
        let raw = r#"{
            "task": "broken",
            "steps": [
                {"step": 1, "action": "navigate", "target": "url"},
                {"step": 3, "action": "click", "target": "submit"}
            ]
        }"#;
        let result = planner_with(raw).plan(&schema(), "go", "client").await;
        assert!(matches!(result, Err(PlanningError::MalformedPlan(_))));
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let raw = r#"{
            "task": "broken",
            "steps": [{"step": 1, "action": "teleport", "target": "nowhere"}]
        }"#;
        let result = planner_with(raw).plan(&schema(), "go", "client").await;
        assert!(matches!(result, Err(PlanningError::MalformedPlan(_))));
    }

    #[tokio::test]
    async fn test_empty_plan_rejected() {
        let raw = r#"{"task": "nothing", "steps": []}"#;
        let result = planner_with(raw).plan(&schema(), "go", "client").await;
        assert!(matches!(result, Err(PlanningError::MalformedPlan(_))));
    }

    #[tokio::test]
    async fn test_prose_response_rejected() {
        let result = planner_with("Sure! First you should navigate to the page...")
            .plan(&schema(), "go", "client")
            .await;
        assert!(matches!(result, Err(PlanningError::MalformedPlan(_))));
    }
}
