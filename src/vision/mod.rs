// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for QR code detection and decoding
//!
//! This module provides:
//! - Region detection via a YOLOv8 model on ONNX Runtime
//! - Payload decoding within each region via `rqrr`
//! - Box annotation for the image-returning endpoint
//!
//! Everything runs on CPU.

pub mod annotate;
pub mod decoder;
pub mod detection;
pub mod image_utils;
pub mod model_manager;
pub mod pipeline;
pub mod types;

pub use annotate::{draw_bounding_boxes, BOX_COLOR, BOX_THICKNESS};
pub use decoder::{decode_qr_full, decode_qr_region, scan_qr_full};
pub use detection::{Detection, PostprocessParams, QrBoxDetector, QrDetectionModel};
pub use image_utils::{decode_base64_image, decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use pipeline::{PipelineOutput, QrPipeline};
pub use types::{BoundingBox, QrPrediction, NO_QR_CONTENT};
