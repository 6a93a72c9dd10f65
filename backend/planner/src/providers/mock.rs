use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use scanforge_core::{CapabilityResponse, PlanCapabilityRequest, PlanProvider};

/// A mock planning provider that returns canned responses.
pub struct MockPlanner {
    name: String,
    fixed_response: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockPlanner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanProvider for MockPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, request: &PlanCapabilityRequest) -> Result<CapabilityResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock planner failure");
        }
        Ok(CapabilityResponse {
            content: self.fixed_response.clone().unwrap_or_else(|| {
                r#"{"task":"noop","steps":[{"step":1,"action":"wait","target":"page","value":"100"}]}"#
                    .to_string()
            }),
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
