//! `POST /check-image-quality`
//!
//! Local-only assessment; never touches an upstream capability.

use axum::extract::{Multipart, State};
use axum::Json;

use scanforge_extraction::{assess_quality, QualityReport};

use crate::error::ApiError;
use crate::server::AppState;

pub async fn check_image_quality(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QualityReport>, ApiError> {
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

    Ok(Json(assess_quality(&file)))
}
