use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scanforge_core::{CapabilityResponse, PlanCapabilityRequest, PlanProvider};

use crate::prompts::{user_prompt, PLAN_SYSTEM_PROMPT};

/// Local Ollama planning provider.
pub struct OllamaPlanner {
    client: Client,
    base_url: String,
}

impl OllamaPlanner {
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

impl Default for OllamaPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[async_trait]
impl PlanProvider for OllamaPlanner {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn plan(&self, request: &PlanCapabilityRequest) -> Result<CapabilityResponse> {
        let start = Instant::now();

        // Strip any provider prefix like "openai/"
        let model = request
            .model
            .split('/')
            .last()
            .unwrap_or(&request.model)
            .to_string();

        let body = OllamaChatRequest {
            model: model.clone(),
            messages: vec![
                OllamaChatMessage {
                    role: "system".to_string(),
                    content: PLAN_SYSTEM_PROMPT.to_string(),
                },
                OllamaChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(request),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(model = %model, "Sending plan request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(CapabilityResponse {
            content: chat_response.message.content,
            provider: "ollama".to_string(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
