//! `POST /analyze-and-execute`
//!
//! Multipart: `file` (image), `intent` (string), `context?` (JSON string).
//! The response is always a structured `AnalyzeResponse`; pipeline-stage
//! failures surface in its `status`/`message`, not as HTTP errors.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::debug;

use scanforge_core::AnalyzeResponse;

use crate::error::ApiError;
use crate::server::{client_key, AppState};

pub async fn analyze_and_execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut file: Option<Vec<u8>> = None;
    let mut intent: Option<String> = None;
    let mut context: Option<serde_json::Value> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable file part: {e}")))?;
                file = Some(bytes.to_vec());
            }
            Some("intent") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable intent part: {e}")))?;
                intent = Some(text);
            }
            Some("context") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable context part: {e}")))?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| ApiError::BadRequest(format!("context is not valid JSON: {e}")))?;
                context = Some(value);
            }
            other => {
                debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("missing file part".into()))?;
    let intent = intent.ok_or_else(|| ApiError::BadRequest("missing intent part".into()))?;
    if intent.trim().is_empty() {
        return Err(ApiError::BadRequest("intent is empty".into()));
    }

    let key = client_key(&headers);
    let response = state.orchestrator.run(&file, &intent, context, &key).await;
    Ok(Json(response))
}
