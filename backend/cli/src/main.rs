mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use scanforge_browser::ChromeSessionFactory;
use scanforge_cache::ResultCache;
use scanforge_executor::{Executor, ExecutorConfig};
use scanforge_extraction::providers::{ollama::OllamaVision, openrouter::OpenRouterVision};
use scanforge_extraction::{providers::VisionRegistry, ExtractionConfig, ExtractionGateway};
use scanforge_gateway::{start_server, AppState};
use scanforge_guard::PayloadCodec;
use scanforge_interactions::TableChecker;
use scanforge_orchestrator::Orchestrator;
use scanforge_planner::providers::{
    ollama::OllamaPlanner, openrouter::OpenRouterPlanner, PlanRegistry,
};
use scanforge_planner::{Planner, PlannerConfig};
use scanforge_resilience::{CircuitConfig, RateConfig, ResilienceWrapper};

use config::Config;

#[derive(Parser)]
#[command(name = "scanforge")]
#[command(about = "ScanForge document-scanning orchestration core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ScanForge HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show current server status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("ScanForge is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    logging::init_logger(&config.log_dir, &config.log_level);
    config.validate()?;

    info!(
        port = config.port,
        bind = %config.bind_address,
        cache = %config.cache_path,
        "Starting ScanForge"
    );
    if config.guard_passphrase == Config::default().guard_passphrase {
        warn!("SCANFORGE_GUARD_KEY is unset; using the development passphrase");
    }

    // Shared resilience state, created once per process.
    let wrapper = Arc::new(ResilienceWrapper::new(
        CircuitConfig {
            failure_threshold: config.circuit_failure_threshold,
            rolling_window: Duration::from_secs(config.circuit_window_secs),
            cool_down: Duration::from_secs(config.circuit_cool_down_secs),
        },
        RateConfig {
            max_requests: config.rate_max_requests,
            window: Duration::from_secs(config.rate_window_secs),
            idle_eviction: Duration::from_secs(600),
        },
        Duration::from_secs(config.call_timeout_secs),
    ));
    let pruner = Arc::clone(&wrapper);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            pruner.prune().await;
        }
    });

    // Result cache with the sensitive-payload codec.
    let codec = PayloadCodec::from_passphrase(&config.guard_passphrase);
    let cache = Arc::new(ResultCache::open(&config.cache_path, codec));
    let _sweeper = cache.spawn_sweeper(Duration::from_secs(config.cache_sweep_secs));

    // Capability providers.
    let mut vision_registry = VisionRegistry::new();
    let mut plan_registry = PlanRegistry::new();
    if let Some(api_key) = &config.openrouter_api_key {
        vision_registry.register("openrouter", Arc::new(OpenRouterVision::new(api_key)));
        plan_registry.register("openrouter", Arc::new(OpenRouterPlanner::new(api_key)));
        info!("Registered OpenRouter providers");
    }
    if let Some(url) = &config.ollama_url {
        vision_registry.register("ollama", Arc::new(OllamaVision::new().with_base_url(url)));
        plan_registry.register("ollama", Arc::new(OllamaPlanner::new().with_base_url(url)));
        info!(url = %url, "Registered Ollama providers");
    }
    let vision_provider = vision_registry
        .first_of(&config.provider_order)
        .context("no vision provider configured; set OPENROUTER_API_KEY or OLLAMA_URL")?;
    let plan_provider = plan_registry
        .first_of(&config.provider_order)
        .context("no planning provider configured; set OPENROUTER_API_KEY or OLLAMA_URL")?;

    // Pipeline stages.
    let extraction = Arc::new(ExtractionGateway::new(
        vision_provider,
        Arc::clone(&wrapper),
        Arc::clone(&cache),
        ExtractionConfig {
            model: config.vision_model.clone(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            ..ExtractionConfig::default()
        },
    ));
    let planner = Arc::new(Planner::new(
        plan_provider,
        Arc::clone(&wrapper),
        PlannerConfig {
            model: config.planner_model.clone(),
            ..PlannerConfig::default()
        },
    ));
    let executor = Arc::new(Executor::new(ExecutorConfig {
        step_timeout: Duration::from_secs(config.step_timeout_secs),
        capture_screenshot: config.capture_screenshot,
    }));
    let sessions = Arc::new(ChromeSessionFactory::new(config.headless));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&extraction),
        planner,
        executor,
        sessions,
    ));

    let state = AppState {
        orchestrator,
        extraction,
        interactions: Arc::new(TableChecker::new()),
    };

    let addr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("invalid bind address")?;
    start_server(addr, state).await
}
