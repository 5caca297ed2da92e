// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction response types

use serde::{Deserialize, Serialize};

use crate::vision::{PipelineOutput, QrPrediction, NO_QR_CONTENT};

fn default_qr_content() -> String {
    NO_QR_CONTENT.to_string()
}

/// A detected QR code box and its decoded content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrBoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    /// Decoded payload or "No QR code content detected"
    #[serde(default = "default_qr_content")]
    pub qr_content: String,
}

impl From<&QrPrediction> for QrBoundingBox {
    fn from(p: &QrPrediction) -> Self {
        Self {
            x_min: p.bbox.x_min,
            y_min: p.bbox.y_min,
            x_max: p.bbox.x_max,
            y_max: p.bbox.y_max,
            qr_content: p.content_or_sentinel().to_string(),
        }
    }
}

/// Response of `/predict-qr/` and `/predict-json/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrPredictionResponse {
    pub predictions: Vec<QrBoundingBox>,
}

impl From<&PipelineOutput> for QrPredictionResponse {
    fn from(output: &PipelineOutput) -> Self {
        Self {
            predictions: output.predictions.iter().map(QrBoundingBox::from).collect(),
        }
    }
}

/// Response of `POST /v1/detect-qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectQrResponse {
    pub predictions: Vec<QrBoundingBox>,
    /// Source image width in pixels
    pub width: u32,
    /// Source image height in pixels
    pub height: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Detector used
    pub model: String,
    /// Annotated image, base64, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
}
