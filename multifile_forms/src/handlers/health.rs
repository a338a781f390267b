//! Health check handler

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::debug;

use crate::AppState;

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    debug!("GET /health");

    let fields: Vec<&str> = state
        .config
        .uploads
        .fields
        .iter()
        .map(|rules| rules.name.as_str())
        .collect();

    Json(json!({
        "status": "healthy",
        "app": state.app_name,
        "version": state.version,
        "upload_fields": fields,
    }))
}
