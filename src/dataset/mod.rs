// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Training-set tooling for the QR detector
//!
//! YOLO label files and offline augmentation of image/label pairs. Training
//! itself happens outside this crate; the output directories here follow the
//! `images/` + `labels/` layout the trainer expects.

pub mod augment;
pub mod labels;

use std::path::PathBuf;

use thiserror::Error;

pub use augment::{
    augment_dataset, augment_sample, apply_transform, sample_transforms, AugmentConfig,
    AugmentSummary, Transform,
};
pub use labels::{format_labels, parse_labels, read_label_file, YoloBox};

/// Errors raised while reading or writing a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Invalid label on line {line}: {reason}")]
    InvalidLabel { line: usize, reason: String },

    #[error("Augment fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("Directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error on {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
