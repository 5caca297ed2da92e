// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding: confidence filtering, NMS and coordinate mapping

use anyhow::Result;
use ndarray::{ArrayViewD, Ix3};
use serde::{Deserialize, Serialize};

use super::preprocessing::LetterboxInfo;

/// A single detector box in pixel coordinates (x_min, y_min, x_max, y_max)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    /// Detection confidence score (0.0-1.0)
    pub score: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &Detection) -> f32 {
        let ix = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let iy = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Map from letterboxed input space to the original image, clamped to its bounds
    pub fn to_original(&self, info: &LetterboxInfo) -> Detection {
        let (x0, y0) = info.map_to_original(self.x_min, self.y_min);
        let (x1, y1) = info.map_to_original(self.x_max, self.y_max);
        let w = info.original_width as f32;
        let h = info.original_height as f32;
        Detection {
            x_min: x0.clamp(0.0, w),
            y_min: y0.clamp(0.0, h),
            x_max: x1.clamp(0.0, w),
            y_max: y1.clamp(0.0, h),
            score: self.score,
            class_id: self.class_id,
        }
    }
}

/// Thresholds applied after inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostprocessParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for PostprocessParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

/// Decode a raw YOLOv8 output tensor into candidate boxes (input space)
///
/// Accepts `[1, 4 + nc, N]` (the default export) or the transposed
/// `[1, N, 4 + nc]`. Each candidate is `cx, cy, w, h` followed by class scores.
pub fn parse_yolo_output(output: ArrayViewD<f32>, confidence_threshold: f32) -> Result<Vec<Detection>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow::anyhow!("unexpected detector output rank, expected 3"))?;

    let (batch, d1, d2) = output.dim();
    if batch != 1 {
        anyhow::bail!("detector expected batch=1 but received {batch}");
    }

    // Channels-first unless the last axis is a plausible attribute row and
    // shorter than the candidate axis
    let preds = if is_transposed(d1, d2) {
        output.index_axis_move(ndarray::Axis(0), 0)
    } else {
        output.index_axis_move(ndarray::Axis(0), 0).reversed_axes()
    };

    let attrs = preds.ncols();
    if attrs < 5 {
        anyhow::bail!("detector output requires at least 5 attributes (x,y,w,h,score), got {attrs}");
    }

    let mut detections = Vec::new();
    for row in preds.rows() {
        let (class_id, score) = row
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });

        if score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        detections.push(Detection {
            x_min: cx - w / 2.0,
            y_min: cy - h / 2.0,
            x_max: cx + w / 2.0,
            y_max: cy + h / 2.0,
            score,
            class_id,
        });
    }

    Ok(detections)
}

fn is_transposed(d1: usize, d2: usize) -> bool {
    d2 >= 5 && d2 < d1
}

/// Class-aware non-maximum suppression, highest score first
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Full postprocessing: parse, NMS, map back to the original image
pub fn postprocess(
    output: ArrayViewD<f32>,
    info: &LetterboxInfo,
    params: &PostprocessParams,
) -> Result<Vec<Detection>> {
    let candidates = parse_yolo_output(output, params.confidence_threshold)?;
    let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
    Ok(kept.iter().map(|d| d.to_original(info)).collect())
}
