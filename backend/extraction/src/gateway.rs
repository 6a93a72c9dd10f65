use std::sync::Arc;
use std::time::Duration;

use scanforge_cache::{fingerprint, ResultCache};
use scanforge_core::{Extraction, ExtractionHint, VisionProvider, VisionRequest};
use scanforge_resilience::ResilienceWrapper;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::normalize::normalize;
use crate::prompts::{PRESCRIPTION_PROMPT, UI_SCHEMA_PROMPT};

/// Tunables for the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Bounded lifetime for cached extractions.
    pub cache_ttl: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.1,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Result of one extraction, tagged with whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub value: Extraction,
    pub cached: bool,
    pub fingerprint: String,
}

/// Front door to the vision capability: fingerprints the upload, consults
/// the result cache, and only then spends upstream quota through the
/// resilience wrapper under the `vision` dependency key.
pub struct ExtractionGateway {
    provider: Arc<dyn VisionProvider>,
    wrapper: Arc<ResilienceWrapper>,
    cache: Arc<ResultCache>,
    config: ExtractionConfig,
}

impl ExtractionGateway {
    pub fn new(
        provider: Arc<dyn VisionProvider>,
        wrapper: Arc<ResilienceWrapper>,
        cache: Arc<ResultCache>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            provider,
            wrapper,
            cache,
            config,
        }
    }

    pub async fn extract(
        &self,
        image: &[u8],
        hint: ExtractionHint,
        client_key: &str,
    ) -> Result<Extracted, ExtractionError> {
        // Fail fast on junk input; upstream quota is never spent on it.
        if image.is_empty() {
            return Err(ExtractionError::BadInput("empty upload".into()));
        }
        image::load_from_memory(image)
            .map_err(|e| ExtractionError::BadInput(format!("undecodable image: {e}")))?;

        let fingerprint = fingerprint(image);

        if let Some(payload) = self.cache.get(&fingerprint) {
            match serde_json::from_slice::<Extraction>(&payload) {
                Ok(value) => {
                    debug!(%fingerprint, "extraction served from cache");
                    return Ok(Extracted {
                        value,
                        cached: true,
                        fingerprint,
                    });
                }
                Err(e) => {
                    // Legacy or corrupt entry: treat as a miss and repopulate.
                    warn!(%fingerprint, error = %e, "cached payload unreadable, refetching");
                }
            }
        }

        let request = VisionRequest {
            image: image.to_vec(),
            prompt: match hint {
                ExtractionHint::Form => UI_SCHEMA_PROMPT.to_string(),
                ExtractionHint::Prescription => PRESCRIPTION_PROMPT.to_string(),
            },
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let provider = Arc::clone(&self.provider);
        let response = self
            .wrapper
            .call("vision", client_key, async move {
                provider.extract(&request).await
            })
            .await?;

        info!(
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "vision capability responded"
        );

        let value = normalize(&response.content, hint)?;

        // Failed extractions never reach the cache; successes are stored
        // encoded when they carry PHI.
        match serde_json::to_vec(&value) {
            Ok(payload) => self.cache.put(
                &fingerprint,
                &payload,
                self.config.cache_ttl,
                value.is_sensitive(),
            ),
            Err(e) => warn!(%fingerprint, error = %e, "extraction not cacheable"),
        }

        Ok(Extracted {
            value,
            cached: false,
            fingerprint,
        })
    }
}
