//! Upload endpoint that validates every configured multi-file field.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{
    error::{AppError, Result},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct AcceptedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: Vec<AcceptedFile>,
    pub total_size: u64,
}

pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut form = state.config.uploads.build_form();
    form.process_multipart(multipart, state.config.uploads.spool_threshold_bytes)
        .await?;

    let result = form.validate();
    if !result.is_valid {
        return Err(AppError::Rejected(result));
    }

    let mut accepted = Vec::new();
    for field in form.fields_mut() {
        let name = field.name().to_string();
        for file in field.data_mut().into_iter().flatten() {
            accepted.push(AcceptedFile {
                field: name.clone(),
                filename: file.filename().to_string(),
                content_type: file.content_type().to_string(),
                size: file.measure_size()?,
            });
        }
    }

    let total_size = accepted.iter().map(|f| f.size).sum();
    info!("POST /upload - accepted {} files ({} bytes)", accepted.len(), total_size);

    Ok(Json(UploadResponse {
        accepted,
        total_size,
    }))
}
