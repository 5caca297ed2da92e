// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 QR code detector running on ONNX Runtime
//!
//! Loads a detector exported with `yolo export format=onnx` and returns
//! bounding boxes in original image coordinates.

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocess::{postprocess, Detection, PostprocessParams};
use super::preprocessing::preprocess_for_detection;
use super::QrBoxDetector;

/// ONNX-backed QR code detector
///
/// CPU-only. The session is shared behind a mutex because running it
/// requires exclusive access.
#[derive(Clone)]
pub struct QrDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    params: PostprocessParams,
}

impl std::fmt::Debug for QrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrDetectionModel")
            .field("input_name", &self.input_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl QrDetectionModel {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("QR detection model not found: {}", model_path.display());
        }

        info!("Loading QR detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load QR detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detector input {}: {:?}", input_name, input.input_type);
        }

        info!("✅ QR detection model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            params: PostprocessParams::default(),
        })
    }

    /// Override the thresholds applied after inference
    pub fn with_params(mut self, params: PostprocessParams) -> Self {
        self.params = PostprocessParams {
            confidence_threshold: params.confidence_threshold.clamp(0.0, 1.0),
            iou_threshold: params.iou_threshold.clamp(0.0, 1.0),
            max_detections: params.max_detections.max(1),
        };
        self
    }

    /// Letterbox, run inference and decode boxes for one image
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (input, letterbox) = preprocess_for_detection(image);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("detector session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let detections = postprocess(output_tensor.view(), &letterbox, &self.params)?;

        debug!("Detected {} QR regions", detections.len());

        Ok(detections)
    }
}

impl QrBoxDetector for QrDetectionModel {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        QrDetectionModel::detect(self, image)
    }

    fn name(&self) -> &str {
        "yolov8-qr"
    }
}
