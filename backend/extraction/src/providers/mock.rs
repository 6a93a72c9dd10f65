use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use scanforge_core::{CapabilityResponse, VisionProvider, VisionRequest};

/// A mock vision provider that returns canned responses and counts calls,
/// so tests can assert cache hits never reach the capability.
pub struct MockVision {
    name: String,
    fixed_response: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockVision {
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

    /// How many times the capability was actually invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionProvider for MockVision {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, request: &VisionRequest) -> Result<CapabilityResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock vision failure");
        }
        Ok(CapabilityResponse {
            content: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| r#"{"page_type":"form","elements":[]}"#.to_string()),
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
