// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from environment variables

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::{PostprocessParams, VisionModelConfig};

/// Default upload limit for prediction endpoints (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = MAX_IMAGE_SIZE;

/// Configuration for the QR detection node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interface the HTTP server binds to
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Path to the exported ONNX QR detector
    pub model_path: Option<String>,
    /// Minimum detector score for a box to be kept
    pub confidence_threshold: f32,
    /// IoU above which overlapping boxes are suppressed
    pub iou_threshold: f32,
    /// Maximum boxes returned per image
    pub max_detections: usize,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "API_PORT").unwrap_or(defaults.port),
            // An empty QR_MODEL_PATH disables the detector
            model_path: match lookup("QR_MODEL_PATH") {
                Some(path) if path.trim().is_empty() => None,
                Some(path) => Some(path),
                None => defaults.model_path,
            },
            confidence_threshold: parse_var(&lookup, "QR_CONFIDENCE_THRESHOLD")
                .unwrap_or(defaults.confidence_threshold),
            iou_threshold: parse_var(&lookup, "QR_IOU_THRESHOLD")
                .unwrap_or(defaults.iou_threshold),
            max_detections: parse_var(&lookup, "QR_MAX_DETECTIONS")
                .unwrap_or(defaults.max_detections),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "Confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(format!(
                "IoU threshold must be within [0, 1], got {}",
                self.iou_threshold
            ));
        }
        if self.max_detections == 0 {
            return Err("Max detections must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("Upload limit must be greater than 0".to_string());
        }
        // Decoding refuses anything above MAX_IMAGE_SIZE regardless of the body limit
        if self.max_upload_bytes > MAX_IMAGE_SIZE {
            return Err(format!(
                "Upload limit must not exceed {} bytes, got {}",
                MAX_IMAGE_SIZE, self.max_upload_bytes
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Socket address for the HTTP server
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        SocketAddr::from_str(&format!("{}:{}", self.host, self.port))
            .map_err(|e| format!("Invalid listen address {}:{}: {}", self.host, self.port, e))
    }

    /// Vision model settings derived from this config
    pub fn vision_config(&self) -> VisionModelConfig {
        VisionModelConfig {
            qr_model_path: self.model_path.clone(),
            params: PostprocessParams {
                confidence_threshold: self.confidence_threshold,
                iou_threshold: self.iou_threshold,
                max_detections: self.max_detections,
            },
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for NodeConfig {
    fn default() -> Self {
        let params = PostprocessParams::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: Some("./models/qr-yolov8n.onnx".to_string()),
            confidence_threshold: params.confidence_threshold,
            iou_threshold: params.iou_threshold,
            max_detections: params.max_detections,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
