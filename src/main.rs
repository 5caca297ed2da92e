// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use qr_detection_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    vision::VisionModelManager,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting QR Detection Node...\n");
    println!("📦 BUILD VERSION: {}", qr_detection_node::version::VERSION);
    println!("   {}", qr_detection_node::version::get_version_string());
    println!("📅 Build Date: {}", qr_detection_node::version::BUILD_DATE);
    println!();

    let config = NodeConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let state = AppState::new(config.clone());

    // Load the QR detector
    println!("👁️  Loading QR detector...");
    match config.model_path.as_deref() {
        Some(path) => println!("   Model: {}", path),
        None => println!("   QR_MODEL_PATH is empty, no detector will be loaded"),
    }
    println!(
        "   Thresholds: confidence {}, IoU {}, max {} boxes",
        config.confidence_threshold, config.iou_threshold, config.max_detections
    );

    match VisionModelManager::new(config.vision_config()).await {
        Ok(manager) => {
            let manager = Arc::new(manager);
            state.set_vision_model_manager(manager.clone()).await;

            for model in manager.list_models() {
                let status = if model.available { "✓" } else { "✗" };
                println!("     {} {} ({})", status, model.name, model.model_type);
            }
            if manager.has_detector() {
                println!("✅ QR detector ready");
            } else {
                println!("⚠️  QR detector not loaded");
                println!("   /predict-qr/ and /predict-image/ will return 503");
            }
        }
        Err(e) => {
            println!("⚠️  Failed to initialize vision model manager: {}", e);
            println!("   /predict-qr/ and /predict-image/ will return 503");
        }
    }

    println!();
    println!("🌐 API listening on http://{}:{}", config.host, config.port);
    println!("   UI:     GET  /");
    println!("   JSON:   POST /predict-qr/");
    println!("   Image:  POST /predict-image/");
    println!("\nPress Ctrl+C to stop\n");

    start_server(state).await?;

    println!("👋 Goodbye!");
    Ok(())
}
