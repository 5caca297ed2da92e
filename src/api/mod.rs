// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod predict;
pub mod ui;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_router, start_server, AppState};
pub use predict::{
    detect_qr_handler, predict_image_handler, predict_json_handler, DetectQrRequest,
    DetectQrResponse, QrBoundingBox, QrPredictionResponse,
};
