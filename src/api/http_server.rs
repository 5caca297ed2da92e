// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::predict::{detect_qr_handler, predict_image_handler, predict_json_handler};
use super::ui::index_handler;
use crate::config::NodeConfig;
use crate::vision::VisionModelManager;

/// Shared state for every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub vision_model_manager: Arc<RwLock<Option<Arc<VisionModelManager>>>>,
    pub config: Arc<NodeConfig>,
}

impl AppState {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            vision_model_manager: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
        }
    }

    /// State with default config and no vision manager
    pub fn new_for_test() -> Self {
        Self::new(NodeConfig::default())
    }

    pub fn with_manager(config: NodeConfig, manager: Arc<VisionModelManager>) -> Self {
        Self {
            vision_model_manager: Arc::new(RwLock::new(Some(manager))),
            config: Arc::new(config),
        }
    }

    pub async fn set_vision_model_manager(&self, manager: Arc<VisionModelManager>) {
        *self.vision_model_manager.write().await = Some(manager);
    }

    pub async fn get_vision_model_manager(&self) -> Option<Arc<VisionModelManager>> {
        self.vision_model_manager.read().await.clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Browser UI
        .route("/", get(index_handler))
        // Health check
        .route("/health", get(health_handler))
        // Models endpoint
        .route("/v1/models", get(models_handler))
        // Prediction endpoints
        .route("/predict-qr/", post(predict_json_handler))
        .route("/predict-qr", post(predict_json_handler))
        .route("/predict-json/", post(predict_json_handler))
        .route("/predict-image/", post(predict_image_handler))
        .route("/v1/detect-qr", post(detect_qr_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state
        .config
        .listen_addr()
        .map_err(|e| anyhow::anyhow!(e))?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let detector_loaded = match state.get_vision_model_manager().await {
        Some(manager) => manager.has_detector(),
        None => false,
    };

    Json(json!({
        "status": if detector_loaded { "healthy" } else { "degraded" },
        "detector_loaded": detector_loaded,
        "version": crate::version::VERSION_NUMBER,
        "build": crate::version::get_version_info(),
    }))
}

async fn models_handler(State(state): State<AppState>) -> impl IntoResponse {
    let models = match state.get_vision_model_manager().await {
        Some(manager) => manager.list_models(),
        None => Vec::new(),
    };

    Json(json!({ "models": models }))
}
