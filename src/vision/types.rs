// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction records produced by the QR pipeline

use serde::{Deserialize, Serialize};

use super::detection::Detection;

/// Reported when a detected region holds no decodable payload
pub const NO_QR_CONTENT: &str = "No QR code content detected";

/// Integer pixel box (x_min, y_min, x_max, y_max) in original image space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl BoundingBox {
    pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Restrict to a `width` x `height` image, keeping min <= max
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x_min = self.x_min.min(width);
        let y_min = self.y_min.min(height);
        Self {
            x_min,
            y_min,
            x_max: self.x_max.min(width).max(x_min),
            y_max: self.y_max.min(height).max(y_min),
        }
    }

    /// True if the two boxes share any area
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x_min < other.x_max
            && other.x_min < self.x_max
            && self.y_min < other.y_max
            && other.y_min < self.y_max
    }
}

impl From<&Detection> for BoundingBox {
    /// Truncates toward zero; negative coordinates saturate at 0
    fn from(d: &Detection) -> Self {
        let x_min = d.x_min.max(0.0) as u32;
        let y_min = d.y_min.max(0.0) as u32;
        Self {
            x_min,
            y_min,
            x_max: (d.x_max.max(0.0) as u32).max(x_min),
            y_max: (d.y_max.max(0.0) as u32).max(y_min),
        }
    }
}

/// One detector box paired with its decoded payload, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPrediction {
    pub bbox: BoundingBox,
    /// Detector confidence for the box
    pub score: f32,
    /// Decoded text, `None` when decoding failed
    pub content: Option<String>,
}

impl QrPrediction {
    /// Decoded text or the "not detected" sentinel
    pub fn content_or_sentinel(&self) -> &str {
        self.content.as_deref().unwrap_or(NO_QR_CONTENT)
    }
}
