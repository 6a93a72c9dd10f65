use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scanforge_core::{CapabilityResponse, VisionProvider, VisionRequest};

/// Local Ollama vision provider (`/api/generate` with an `images` list).
pub struct OllamaVision {
    client: Client,
    base_url: String,
}

impl OllamaVision {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OllamaVision {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[async_trait]
impl VisionProvider for OllamaVision {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn extract(&self, request: &VisionRequest) -> Result<CapabilityResponse> {
        let start = Instant::now();

        // Strip any provider prefix like "openai/"
        let model = request
            .model
            .split('/')
            .last()
            .unwrap_or(&request.model)
            .to_string();

        let body = GenerateRequest {
            model: model.clone(),
            prompt: request.prompt.clone(),
            images: vec![base64::engine::general_purpose::STANDARD.encode(&request.image)],
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(model = %model, "Sending vision request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = generate_response.eval_count.unwrap_or(0)
            + generate_response.prompt_eval_count.unwrap_or(0);

        Ok(CapabilityResponse {
            content: generate_response.response,
            provider: "ollama".to_string(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
