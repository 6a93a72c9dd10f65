//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use scanforge_extraction::ExtractionGateway;
use scanforge_interactions::InteractionChecker;
use scanforge_orchestrator::Orchestrator;

use crate::{analyze_api, health_api, prescription_api, quality_api};

/// Uploads above this size are refused at the body layer.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub extraction: Arc<ExtractionGateway>,
    pub interactions: Arc<dyn InteractionChecker>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze-and-execute", post(analyze_api::analyze_and_execute))
        .route(
            "/extract-prescription",
            post(prescription_api::extract_prescription),
        )
        .route(
            "/check-prescription-interactions",
            post(prescription_api::check_interactions),
        )
        .route("/check-image-quality", post(quality_api::check_image_quality))
        .route("/api/health", get(health_api::get_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the main Axum HTTP server for the gateway.
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);

    info!("Gateway HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rate-limit key for the caller: a short API-key prefix when one is
/// presented, a shared anonymous bucket otherwise.
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|token| {
            let prefix: String = token.chars().take(16).collect();
            format!("key:{prefix}")
        })
        .unwrap_or_else(|| "anonymous".to_string())
}
