// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Prediction endpoint tests for POST /predict-qr/, /predict-json/,
//! /predict-image/ and /v1/detect-qr
//!
//! A fixed detector stands in for the ONNX model so the tests exercise
//! routing, upload handling, region decoding and the wire format without
//! model files.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};
use qr_detection_node::{
    api::{create_router, AppState},
    config::NodeConfig,
    vision::{Detection, QrBoxDetector, VisionModelConfig, VisionModelManager},
};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const QR_FIXTURE: &[u8] = include_bytes!("../fixtures/qr_code.png");
const QR_PAYLOAD: &str = "https://qr.rs";
const SENTINEL: &str = "No QR code content detected";

// Fixture placement inside the 400x300 scene
const QR_OFFSET: (i64, i64) = (100, 40);

struct FixedDetector {
    boxes: Vec<Detection>,
}

impl QrBoxDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Ok(self.boxes.clone())
    }

    fn name(&self) -> &str {
        "fixed-test-detector"
    }
}

fn det(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Detection {
    Detection {
        x_min,
        y_min,
        x_max,
        y_max,
        score: 0.87,
        class_id: 0,
    }
}

/// Box around the code modules in the scene
fn qr_box() -> Detection {
    det(128.6, 70.2, 303.9, 243.5)
}

/// White 400x300 image with the QR fixture pasted in
fn scene() -> DynamicImage {
    let qr = image::load_from_memory(QR_FIXTURE).unwrap().to_rgb8();
    let mut canvas = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    imageops::overlay(&mut canvas, &qr, QR_OFFSET.0, QR_OFFSET.1);
    DynamicImage::ImageRgb8(canvas)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn router_with(boxes: Vec<Detection>, config: NodeConfig) -> Router {
    let manager = VisionModelManager::with_detector(Arc::new(FixedDetector { boxes }));
    create_router(AppState::with_manager(config, Arc::new(manager)))
}

fn router(boxes: Vec<Detection>) -> Router {
    router_with(boxes, NodeConfig::default())
}

fn multipart_request(uri: &str, field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "qr-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_upload(uri: &str, image: &DynamicImage) -> Request<Body> {
    multipart_request(uri, "file", "scene.png", "image/png", &encode(image, ImageFormat::Png))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod predict_json_tests {
    use super::*;

    #[tokio::test]
    async fn test_predict_qr_decodes_payload() {
        let app = router(vec![qr_box()]);

        let response = app.oneshot(png_upload("/predict-qr/", &scene())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 1);

        let p = &predictions[0];
        assert_eq!(p["x_min"], 128);
        assert_eq!(p["y_min"], 70);
        assert_eq!(p["x_max"], 303);
        assert_eq!(p["y_max"], 243);
        assert_eq!(p["qr_content"], QR_PAYLOAD);
    }

    #[tokio::test]
    async fn test_route_aliases() {
        for uri in ["/predict-qr", "/predict-json/"] {
            let app = router(vec![qr_box()]);
            let response = app.oneshot(png_upload(uri, &scene())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {}", uri);

            let body = json_body(response).await;
            assert_eq!(body["predictions"][0]["qr_content"], QR_PAYLOAD);
        }
    }

    #[tokio::test]
    async fn test_no_detections_returns_empty_list() {
        let app = router(vec![]);
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([255, 255, 255])));

        let response = app.oneshot(png_upload("/predict-qr/", &blank)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "predictions": [] }));
    }

    #[tokio::test]
    async fn test_undecodable_box_reports_sentinel() {
        // Second box covers only white background
        let app = router(vec![qr_box(), det(0.0, 0.0, 90.0, 90.0)]);

        let response = app.oneshot(png_upload("/predict-qr/", &scene())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0]["qr_content"], QR_PAYLOAD);
        assert_eq!(predictions[1]["qr_content"], SENTINEL);
        assert_eq!(predictions[1]["x_max"], 90);
    }

    #[tokio::test]
    async fn test_boxes_are_clamped_to_image() {
        let app = router(vec![det(-12.0, -3.0, 520.0, 310.5)]);

        let response = app.oneshot(png_upload("/predict-qr/", &scene())).await.unwrap();
        let body = json_body(response).await;
        let p = &body["predictions"][0];
        assert_eq!(p["x_min"], 0);
        assert_eq!(p["y_min"], 0);
        assert_eq!(p["x_max"], 400);
        assert_eq!(p["y_max"], 300);
    }
}

#[cfg(test)]
mod predict_error_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_field() {
        let app = router(vec![]);
        let data = encode(&scene(), ImageFormat::Png);

        let response = app
            .oneshot(multipart_request("/predict-qr/", "image", "scene.png", "image/png", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error_type"], "validation_error");
        assert_eq!(body["details"]["field"], "file");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_non_multipart_body() {
        let app = router(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/predict-qr/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupt_image() {
        let app = router(vec![]);

        let response = app
            .oneshot(multipart_request(
                "/predict-qr/",
                "file",
                "broken.png",
                "image/png",
                b"definitely not an image",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().contains("Invalid image"));
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let config = NodeConfig {
            max_upload_bytes: 1024,
            ..Default::default()
        };
        let app = router_with(vec![], config);
        let data = vec![0x42u8; 4096];

        let response = app
            .oneshot(multipart_request("/predict-qr/", "file", "big.bmp", "image/bmp", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_no_vision_manager() {
        let app = create_router(AppState::new_for_test());

        let response = app.oneshot(png_upload("/predict-qr/", &scene())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_detector_not_loaded() {
        let manager = VisionModelManager::new(VisionModelConfig {
            qr_model_path: None,
            ..Default::default()
        })
        .await
        .unwrap();
        let app = create_router(AppState::with_manager(NodeConfig::default(), Arc::new(manager)));

        let response = app.oneshot(png_upload("/predict-image/", &scene())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(response).await;
        assert_eq!(body["error_type"], "service_unavailable");
        assert_eq!(body["message"], "QR detector not loaded");
    }
}

#[cfg(test)]
mod predict_image_tests {
    use super::*;

    #[tokio::test]
    async fn test_png_upload_returns_annotated_png() {
        let app = router(vec![qr_box()]);

        let response = app.oneshot(png_upload("/predict-image/", &scene())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let annotated = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8();
        assert_eq!(annotated.dimensions(), (400, 300));
        // Left edge of the box is drawn, the background is untouched
        assert_eq!(annotated.get_pixel(128, 150), &Rgb([255, 0, 0]));
        assert_eq!(annotated.get_pixel(20, 20), &Rgb([255, 255, 255]));
    }

    #[tokio::test]
    async fn test_jpeg_upload_returns_jpeg() {
        let app = router(vec![qr_box()]);
        let data = encode(&scene(), ImageFormat::Jpeg);

        let response = app
            .oneshot(multipart_request("/predict-image/", "file", "scene.jpg", "image/jpeg", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }
}

#[cfg(test)]
mod detect_qr_json_tests {
    use super::*;

    fn json_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/detect-qr")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_base64_detection_with_annotation() {
        let app = router(vec![qr_box()]);
        let image = STANDARD.encode(encode(&scene(), ImageFormat::Png));

        let response = app
            .oneshot(json_request(serde_json::json!({ "image": image, "annotate": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["predictions"][0]["qr_content"], QR_PAYLOAD);
        assert_eq!(body["width"], 400);
        assert_eq!(body["height"], 300);
        assert_eq!(body["model"], "fixed-test-detector");

        let annotated = STANDARD.decode(body["annotatedImage"].as_str().unwrap()).unwrap();
        assert_eq!(&annotated[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    async fn test_data_url_prefix_accepted() {
        let app = router(vec![]);
        let image = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(encode(&scene(), ImageFormat::Png))
        );

        let response = app
            .oneshot(json_request(serde_json::json!({ "image": image })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body["predictions"].as_array().unwrap().is_empty());
        assert!(body.get("annotatedImage").is_none());
    }

    #[tokio::test]
    async fn test_missing_image() {
        let app = router(vec![]);

        let response = app.oneshot(json_request(serde_json::json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_body_over_limit() {
        let config = NodeConfig {
            max_upload_bytes: 1024,
            ..Default::default()
        };
        let app = router_with(vec![], config);
        let image = "A".repeat(4096);

        let response = app
            .oneshot(json_request(serde_json::json!({ "image": image })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = json_body(response).await;
        assert_eq!(body["error_type"], "payload_too_large");
        assert_eq!(body["details"]["limit_bytes"], 1024);
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let app = router(vec![]);

        let response = app
            .oneshot(json_request(serde_json::json!({ "image": "!!!not-base64!!!" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
