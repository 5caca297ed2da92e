// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-to-decode pipeline
//!
//! detector boxes → integer boxes → per-region decode → prediction records

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use image::DynamicImage;
use tracing::{debug, info};

use super::decoder::decode_qr_region;
use super::detection::QrBoxDetector;
use super::image_utils::to_rgb;
use super::types::{BoundingBox, QrPrediction};

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One record per detector box, in detector order
    pub predictions: Vec<QrPrediction>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl PipelineOutput {
    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.predictions.iter().map(|p| p.bbox).collect()
    }

    pub fn decoded_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.content.is_some()).count()
    }
}

/// Runs a detector and decodes each proposed region
#[derive(Clone)]
pub struct QrPipeline {
    detector: Arc<dyn QrBoxDetector>,
}

impl std::fmt::Debug for QrPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrPipeline")
            .field("detector", &self.detector.name())
            .finish()
    }
}

impl QrPipeline {
    pub fn new(detector: Arc<dyn QrBoxDetector>) -> Self {
        Self { detector }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    pub fn run(&self, image: &DynamicImage) -> Result<PipelineOutput> {
        let start = Instant::now();
        let image = to_rgb(image);

        let detections = self.detector.detect(&image)?;
        debug!("Detector proposed {} regions", detections.len());

        let predictions: Vec<QrPrediction> = detections
            .iter()
            .map(|detection| {
                let bbox = BoundingBox::from(detection).clamp_to(image.width(), image.height());
                let content = decode_qr_region(&image, &bbox);
                debug!(?bbox, decoded = content.is_some(), "Processed QR region");
                QrPrediction {
                    bbox,
                    score: detection.score,
                    content,
                }
            })
            .collect();

        let output = PipelineOutput {
            predictions,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "QR pipeline complete: {} regions, {} decoded, {}ms",
            output.predictions.len(),
            output.decoded_count(),
            output.processing_time_ms
        );

        Ok(output)
    }
}
