// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR code region detection
//!
//! Components:
//! - `preprocessing` - Letterbox resize and tensor conversion
//! - `postprocess` - Output decoding, NMS and coordinate mapping
//! - `model` - ONNX Runtime session wrapper

pub mod model;
pub mod postprocess;
pub mod preprocessing;

pub use model::QrDetectionModel;
pub use postprocess::{non_max_suppression, parse_yolo_output, Detection, PostprocessParams};
pub use preprocessing::{letterbox, preprocess_for_detection, LetterboxInfo, DETECTION_INPUT_SIZE};

use anyhow::Result;
use image::DynamicImage;

/// Anything that can propose QR code bounding boxes for an image
///
/// Boxes must be in original image coordinates, clamped to the image.
#[cfg_attr(test, mockall::automock)]
pub trait QrBoxDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;

    /// Name reported by the models endpoint
    fn name(&self) -> &str;
}
