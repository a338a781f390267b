//! Multi-file upload fields for HTML forms, with count, extension and size
//! validators, plus a small axum host that exposes them over HTTP.

pub mod config;
pub mod error;
pub mod fields;
pub mod files;
pub mod forms;
pub mod handlers;
pub mod validation;

pub use crate::config::{AppConfig, FieldRules};
pub use error::{AppError, Result};
pub use fields::{FieldFlags, MultipleFileField, RawValue};
pub use files::{ExtensionUploadSet, Extensions, UploadSet, UploadedFile};
pub use forms::UploadForm;
pub use handlers::routes::create_routes;
pub use validation::{
    files_allowed, files_required, files_size, AllowList, FieldValidator, FilesAllowed,
    FilesRequired, FilesSize, ValidationFailure, ValidationResult,
};

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            app_name: "Multi-file Upload Server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size_bytes();

    Router::new()
        .merge(create_routes(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
