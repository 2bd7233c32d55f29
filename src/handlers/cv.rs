//! CV upload endpoint: `POST /api/cv/extract` with a multipart `file` field.

use crate::{error::AppError, state::AppState};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct CvExtractionResponse {
    pub success: bool,
    pub extracted_text: Option<String>,
    pub error_message: Option<String>,
}

/// Extraction failures are reported in the body with `success: false`. Only transport
/// problems (missing file, oversize upload) are HTTP errors.
pub async fn extract_cv(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let field = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_string();
    let bytes = read_capped(field, state.config.uploads.max_document_bytes).await?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    info!(filename = %filename, bytes = bytes.len(), "Extracting CV text");

    let documents = state.documents.clone();
    let outcome = web::block(move || documents.extract_text(&bytes, &filename))
        .await
        .map_err(|e| AppError::Internal(format!("extraction worker failed: {}", e)))?;

    let response = match outcome {
        Ok(text) => CvExtractionResponse {
            success: true,
            extracted_text: Some(text),
            error_message: None,
        },
        Err(err) => {
            warn!(error = %err, "CV extraction failed");
            let message = match err {
                AppError::DocumentError(msg) => msg,
                other => other.to_string(),
            };
            CvExtractionResponse {
                success: false,
                extracted_text: None,
                error_message: Some(message),
            }
        }
    };
    Ok(HttpResponse::Ok().json(response))
}

async fn read_capped(mut field: Field, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
