// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests against the exported ONNX detector
//!
//! The model tests are ignored by default; run them with
//! `QR_MODEL_PATH=/path/to/qr.onnx cargo test -- --ignored`.

use image::{imageops, DynamicImage, Rgb, RgbImage};
use qr_detection_node::vision::{
    BoundingBox, PostprocessParams, QrBoxDetector, QrDetectionModel, QrPipeline,
};
use std::sync::Arc;

const QR_FIXTURE: &[u8] = include_bytes!("../fixtures/qr_code.png");

fn model_path() -> String {
    std::env::var("QR_MODEL_PATH").unwrap_or_else(|_| "./models/qr-yolov8n.onnx".to_string())
}

#[test]
fn test_missing_model_file() {
    let err = QrDetectionModel::new("/nonexistent/qr-yolov8n.onnx").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
#[ignore] // Requires the exported detector
fn test_model_finds_code_in_scene() {
    let model = QrDetectionModel::new(model_path())
        .expect("Failed to load QR detector")
        .with_params(PostprocessParams::default());
    assert_eq!(model.name(), "yolov8-qr");

    let qr = image::load_from_memory(QR_FIXTURE).unwrap().to_rgb8();
    let mut canvas = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
    imageops::overlay(&mut canvas, &qr, 300, 200);
    let scene = DynamicImage::ImageRgb8(canvas);

    let output = QrPipeline::new(Arc::new(model)).run(&scene).unwrap();
    assert!(!output.predictions.is_empty());

    let code = BoundingBox::new(332, 232, 500, 400);
    for p in &output.predictions {
        assert!(p.bbox.x_max <= 800 && p.bbox.y_max <= 600);
        assert!(p.bbox.x_min <= p.bbox.x_max && p.bbox.y_min <= p.bbox.y_max);
    }
    assert!(output.predictions.iter().any(|p| p.bbox.overlaps(&code)));
}

#[test]
#[ignore] // Requires the exported detector
fn test_model_on_blank_image() {
    let model = QrDetectionModel::new(model_path()).expect("Failed to load QR detector");
    let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([255, 255, 255])));
    assert!(model.detect(&blank).unwrap().is_empty());
}
