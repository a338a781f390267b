//! Router for the upload endpoints

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{health::handle_health, upload::handle_upload},
    AppState,
};

pub fn create_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(max_body_size)),
        )
}
