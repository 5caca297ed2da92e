// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the QR detector once per process

use std::sync::Arc;

use serde::Serialize;

use crate::vision::detection::{PostprocessParams, QrBoxDetector, QrDetectionModel};
use crate::vision::pipeline::QrPipeline;

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// Path to the exported ONNX QR detector (optional)
    pub qr_model_path: Option<String>,
    /// Thresholds applied to detector output
    pub params: PostprocessParams,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            qr_model_path: Some("./models/qr-yolov8n.onnx".to_string()),
            params: PostprocessParams::default(),
        }
    }
}

/// Information about a loaded vision model
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Holds the process-wide QR pipeline
///
/// A missing or unloadable model is not fatal: the manager is created
/// without a pipeline and prediction endpoints report 503.
pub struct VisionModelManager {
    pipeline: Option<QrPipeline>,
}

impl VisionModelManager {
    /// Create a new VisionModelManager with the given configuration
    pub async fn new(config: VisionModelConfig) -> anyhow::Result<Self> {
        let pipeline = match config.qr_model_path {
            Some(path) => {
                let params = config.params;
                let load_path = path.clone();
                let loaded = tokio::task::spawn_blocking(move || {
                    QrDetectionModel::new(&load_path).map(|m| m.with_params(params))
                })
                .await?;

                match loaded {
                    Ok(model) => {
                        tracing::info!("✅ QR detector loaded from {}", path);
                        Some(QrPipeline::new(Arc::new(model)))
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ Failed to load QR detector from {}: {}", path, e);
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Self { pipeline })
    }

    /// Build a manager around an already constructed detector
    pub fn with_detector(detector: Arc<dyn QrBoxDetector>) -> Self {
        Self {
            pipeline: Some(QrPipeline::new(detector)),
        }
    }

    /// Get the QR pipeline if a detector is loaded
    pub fn get_pipeline(&self) -> Option<QrPipeline> {
        self.pipeline.clone()
    }

    /// Check if a detector is loaded
    pub fn has_detector(&self) -> bool {
        self.pipeline.is_some()
    }

    /// List all known vision models
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        let name = self
            .pipeline
            .as_ref()
            .map(|p| p.detector_name().to_string())
            .unwrap_or_else(|| "yolov8-qr".to_string());

        vec![VisionModelInfo {
            name,
            model_type: "qr-detection".to_string(),
            available: self.pipeline.is_some(),
        }]
    }
}
