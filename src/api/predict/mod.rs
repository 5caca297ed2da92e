// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR prediction endpoints
//!
//! - `POST /predict-qr/`, `POST /predict-json/`: boxes and decoded payloads as JSON
//! - `POST /predict-image/`: the upload with boxes drawn on it
//! - `POST /v1/detect-qr`: base64 JSON variant

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{detect_qr_handler, predict_image_handler, predict_json_handler};
pub use request::{read_upload, DetectQrRequest, UploadedImage, UPLOAD_FIELD};
pub use response::{DetectQrResponse, QrBoundingBox, QrPredictionResponse};
