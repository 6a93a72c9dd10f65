use anyhow::{ensure, Result};

/// ScanForge runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Directory for rolling NDJSON logs
    pub log_dir: String,
    /// Log level when RUST_LOG is unset
    pub log_level: String,

    /// SQLite path for the result cache
    pub cache_path: String,
    /// TTL applied to cached extractions
    pub cache_ttl_secs: u64,
    /// Active sweep interval
    pub cache_sweep_secs: u64,
    /// Passphrase for the sensitive-payload codec
    pub guard_passphrase: String,

    /// OpenRouter API key
    pub openrouter_api_key: Option<String>,
    /// Ollama base URL
    pub ollama_url: Option<String>,
    /// Provider preference order
    pub provider_order: Vec<String>,
    /// Model for the vision capability
    pub vision_model: String,
    /// Model for the planning capability
    pub planner_model: String,

    /// Circuit breaker: consecutive failures before opening
    pub circuit_failure_threshold: u32,
    /// Circuit breaker: rolling failure window
    pub circuit_window_secs: u64,
    /// Circuit breaker: open-state cool-down
    pub circuit_cool_down_secs: u64,
    /// Rate limiter: requests per client per window
    pub rate_max_requests: u32,
    /// Rate limiter: refill window
    pub rate_window_secs: u64,
    /// Deadline for each upstream capability call
    pub call_timeout_secs: u64,

    /// Deadline for each executor step
    pub step_timeout_secs: u64,
    /// Attach a screenshot to execution logs
    pub capture_screenshot: bool,
    /// Run the browser headless
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
            cache_path: "scanforge-cache.db".to_string(),
            cache_ttl_secs: 3600,
            cache_sweep_secs: 300,
            guard_passphrase: "scanforge-dev-only".to_string(),
            openrouter_api_key: None,
            ollama_url: Some("http://localhost:11434".to_string()),
            provider_order: vec!["openrouter".to_string(), "ollama".to_string()],
            vision_model: "openai/gpt-4o-mini".to_string(),
            planner_model: "openai/gpt-4o-mini".to_string(),
            circuit_failure_threshold: 5,
            circuit_window_secs: 60,
            circuit_cool_down_secs: 30,
            rate_max_requests: 60,
            rate_window_secs: 60,
            call_timeout_secs: 60,
            step_timeout_secs: 15,
            capture_screenshot: false,
            headless: true,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: std::env::var("SCANFORGE_BIND").unwrap_or(defaults.bind_address),
            port: env_or("SCANFORGE_PORT", defaults.port),
            log_dir: std::env::var("SCANFORGE_LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            cache_path: std::env::var("SCANFORGE_CACHE_DB").unwrap_or(defaults.cache_path),
            cache_ttl_secs: env_or("SCANFORGE_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_sweep_secs: env_or("SCANFORGE_CACHE_SWEEP_SECS", defaults.cache_sweep_secs),
            guard_passphrase: std::env::var("SCANFORGE_GUARD_KEY")
                .unwrap_or(defaults.guard_passphrase),
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            ollama_url: std::env::var("OLLAMA_URL").ok().or(defaults.ollama_url),
            provider_order: std::env::var("SCANFORGE_PROVIDERS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.provider_order),
            vision_model: std::env::var("SCANFORGE_VISION_MODEL").unwrap_or(defaults.vision_model),
            planner_model: std::env::var("SCANFORGE_PLANNER_MODEL")
                .unwrap_or(defaults.planner_model),
            circuit_failure_threshold: env_or(
                "SCANFORGE_CIRCUIT_THRESHOLD",
                defaults.circuit_failure_threshold,
            ),
            circuit_window_secs: env_or(
                "SCANFORGE_CIRCUIT_WINDOW_SECS",
                defaults.circuit_window_secs,
            ),
            circuit_cool_down_secs: env_or(
                "SCANFORGE_CIRCUIT_COOLDOWN_SECS",
                defaults.circuit_cool_down_secs,
            ),
            rate_max_requests: env_or("SCANFORGE_RATE_MAX", defaults.rate_max_requests),
            rate_window_secs: env_or("SCANFORGE_RATE_WINDOW_SECS", defaults.rate_window_secs),
            call_timeout_secs: env_or("SCANFORGE_CALL_TIMEOUT_SECS", defaults.call_timeout_secs),
            step_timeout_secs: env_or("SCANFORGE_STEP_TIMEOUT_SECS", defaults.step_timeout_secs),
            capture_screenshot: env_or(
                "SCANFORGE_CAPTURE_SCREENSHOT",
                defaults.capture_screenshot,
            ),
            headless: env_or("SCANFORGE_HEADLESS", defaults.headless),
        }
    }

    /// Reject configurations that cannot work before any component starts.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.circuit_failure_threshold >= 1,
            "SCANFORGE_CIRCUIT_THRESHOLD must be at least 1"
        );
        ensure!(
            self.rate_max_requests >= 1,
            "SCANFORGE_RATE_MAX must be at least 1"
        );
        ensure!(
            self.cache_ttl_secs > 0,
            "SCANFORGE_CACHE_TTL_SECS must be positive"
        );
        ensure!(
            self.call_timeout_secs > 0 && self.step_timeout_secs > 0,
            "timeouts must be positive"
        );
        ensure!(
            !self.provider_order.is_empty(),
            "SCANFORGE_PROVIDERS must name at least one provider"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = Config {
            circuit_failure_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_provider_order_rejected() {
        let config = Config {
            provider_order: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
