// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO label files: `class cx cy w h`, coordinates normalized to [0, 1]

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::DatasetError;

/// One labelled box in normalized center format
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub class_id: u32,
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl YoloBox {
    pub fn new(class_id: u32, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Normalized (x_min, y_min, x_max, y_max)
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.w / 2.0,
            self.cy - self.h / 2.0,
            self.cx + self.w / 2.0,
            self.cy + self.h / 2.0,
        )
    }

    /// Build from normalized corners, clipped to [0, 1]
    ///
    /// Returns `None` when nothing of the box is left inside the image.
    pub fn from_corners(class_id: u32, x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Option<Self> {
        let x_min = x_min.clamp(0.0, 1.0);
        let y_min = y_min.clamp(0.0, 1.0);
        let x_max = x_max.clamp(0.0, 1.0);
        let y_max = y_max.clamp(0.0, 1.0);

        if x_max <= x_min || y_max <= y_min {
            return None;
        }

        Some(Self {
            class_id,
            cx: (x_min + x_max) / 2.0,
            cy: (y_min + y_max) / 2.0,
            w: x_max - x_min,
            h: y_max - y_min,
        })
    }
}

/// Parse the contents of a label file
///
/// Blank lines are skipped. Anything else must be a class id followed by
/// four numbers.
pub fn parse_labels(text: &str) -> Result<Vec<YoloBox>, DatasetError> {
    let mut boxes = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let invalid = |reason: String| DatasetError::InvalidLabel {
            line: idx + 1,
            reason,
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", parts.len())));
        }

        let class_id = parts[0]
            .parse::<u32>()
            .map_err(|e| invalid(format!("class id {:?}: {}", parts[0], e)))?;

        let mut coords = [0.0f32; 4];
        for (slot, part) in coords.iter_mut().zip(&parts[1..]) {
            *slot = part
                .parse::<f32>()
                .map_err(|e| invalid(format!("coordinate {:?}: {}", part, e)))?;
        }

        boxes.push(YoloBox::new(class_id, coords[0], coords[1], coords[2], coords[3]));
    }

    Ok(boxes)
}

/// Render boxes back into label file text
pub fn format_labels(boxes: &[YoloBox]) -> String {
    boxes
        .iter()
        .map(|b| format!("{} {:.6} {:.6} {:.6} {:.6}\n", b.class_id, b.cx, b.cy, b.w, b.h))
        .collect()
}

/// Read a label file; a missing file means no boxes
pub fn read_label_file(path: &Path) -> Result<Vec<YoloBox>, DatasetError> {
    match fs::read_to_string(path) {
        Ok(text) => parse_labels(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(DatasetError::io(path, e)),
    }
}
