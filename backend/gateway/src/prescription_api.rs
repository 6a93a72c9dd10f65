//! Prescription endpoints: extraction and interaction checks.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use scanforge_core::{ExtractedRecord, ExtractionHint};
use scanforge_interactions::InteractionReport;

use crate::error::ApiError;
use crate::server::{client_key, AppState};

#[derive(Debug, Serialize)]
pub struct PrescriptionResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_info: Option<ExtractedRecord>,
    pub cached: bool,
}

/// `POST /extract-prescription`: multipart `file`.
pub async fn extract_prescription(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<PrescriptionResponse>, ApiError> {
    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("unreadable file part: {e}")))?;
            file = Some(bytes.to_vec());
        }
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("missing file part".into()))?;

    let key = client_key(&headers);
    let extracted = state
        .extraction
        .extract(&file, ExtractionHint::Prescription, &key)
        .await?;

    Ok(Json(PrescriptionResponse {
        status: "success".into(),
        message: "prescription extracted".into(),
        prescription_info: extracted.value.as_prescription().cloned(),
        cached: extracted.cached,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InteractionsRequest {
    pub medications: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PrescriptionDetail {
    pub medication_name: String,
}

#[derive(Debug, Serialize)]
pub struct InteractionsResponse {
    pub status: String,
    pub message: String,
    pub medications_found: usize,
    pub has_interactions: bool,
    pub interactions: InteractionReport,
    pub prescription_details: Vec<PrescriptionDetail>,
}

/// `POST /check-prescription-interactions`: JSON medication list.
pub async fn check_interactions(
    State(state): State<AppState>,
    Json(request): Json<InteractionsRequest>,
) -> Result<Json<InteractionsResponse>, ApiError> {
    let medications: Vec<String> = request
        .medications
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if medications.is_empty() {
        return Err(ApiError::BadRequest("no medications provided".into()));
    }

    let report = state.interactions.check(&medications).await.map_err(|e| {
        warn!(error = %e, "interaction checker failed");
        ApiError::Internal("interaction check failed".into())
    })?;

    let has_interactions = report.has_interactions();
    let message = if has_interactions {
        "interactions found; review before dispensing".to_string()
    } else {
        "no known interactions among the provided medications".to_string()
    };

    Ok(Json(InteractionsResponse {
        status: "success".into(),
        message,
        medications_found: medications.len(),
        has_interactions,
        interactions: report,
        prescription_details: medications
            .into_iter()
            .map(|medication_name| PrescriptionDetail { medication_name })
            .collect(),
    }))
}
