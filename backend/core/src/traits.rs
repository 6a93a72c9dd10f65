use anyhow::Result;
use async_trait::async_trait;

/// Trait for vision capabilities used by the extraction gateway.
///
/// Implementations are opaque remote calls: they carry latency, can fail,
/// and are always invoked through the resilience wrapper.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama"); doubles as the
    /// observability label for call events.
    fn name(&self) -> &str;

    /// Read one image and return the raw capability text.
    async fn extract(&self, request: &VisionRequest) -> Result<CapabilityResponse>;
}

/// Trait for planning capabilities used by the planner.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Turn a UI schema plus free-text intent into raw plan text.
    async fn plan(&self, request: &PlanCapabilityRequest) -> Result<CapabilityResponse>;
}

/// Request to a vision capability.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Raw image bytes as uploaded (PNG/JPEG).
    pub image: Vec<u8>,
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Request to a planning capability. The intent is untrusted free text and
/// travels only as a capability-call argument, never as anything executable.
#[derive(Debug, Clone)]
pub struct PlanCapabilityRequest {
    pub schema_json: String,
    pub intent: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from a capability call.
#[derive(Debug, Clone)]
pub struct CapabilityResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
