// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR prediction endpoint handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, warn};

use super::request::{read_upload, DetectQrRequest};
use super::response::{DetectQrResponse, QrBoundingBox, QrPredictionResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::image_utils::{encode_image, format_to_mime, output_format_for};
use crate::vision::{
    decode_base64_image, decode_image_bytes, draw_bounding_boxes, ImageInfo, PipelineOutput,
    QrPipeline, BOX_COLOR, BOX_THICKNESS,
};

/// POST /predict-qr/ and /predict-json/ - Detect and decode QR codes
///
/// # Request
/// - multipart form with an image in the `file` field
///
/// # Response
/// - `predictions`: one entry per detected box with `x_min`, `y_min`,
///   `x_max`, `y_max` and `qr_content`
///
/// # Errors
/// - 400 Bad Request: missing file or undecodable image
/// - 413 Payload Too Large: upload over the configured limit
/// - 503 Service Unavailable: QR detector not loaded
/// - 500 Internal Server Error: inference failed
pub async fn predict_json_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QrPredictionResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    debug!(
        "QR prediction upload: {:?} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let pipeline = pipeline_from_state(&state).await?;
    let output = tokio::task::spawn_blocking(move || {
        let (image, _) = load_upload(&upload.bytes)?;
        run_pipeline(&pipeline, &image)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(QrPredictionResponse::from(&output)))
}

/// POST /predict-image/ - Return the upload with detected boxes drawn in red
///
/// JPEG uploads come back as JPEG, everything else as PNG.
pub async fn predict_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;

    let pipeline = pipeline_from_state(&state).await?;
    let (body, format) = tokio::task::spawn_blocking(move || {
        let (image, info) = load_upload(&upload.bytes)?;
        let output = run_pipeline(&pipeline, &image)?;
        let format = output_format_for(info.format);
        let body = annotate(&image, &output, format)?;
        Ok::<_, ApiError>((body, format))
    })
    .await
    .map_err(join_error)??;

    Ok(([(header::CONTENT_TYPE, format_to_mime(format))], body).into_response())
}

/// POST /v1/detect-qr - Detect QR codes in a base64-encoded image
///
/// # Request
/// - `image`: Base64-encoded image data (required)
/// - `annotate`: Also return the annotated image (default false)
pub async fn detect_qr_handler(
    State(state): State<AppState>,
    request: Result<Json<DetectQrRequest>, JsonRejection>,
) -> Result<Json<DetectQrResponse>, ApiError> {
    let Json(request) = request.map_err(|e| json_error(e, state.config.max_upload_bytes))?;

    if let Err(e) = request.validate() {
        warn!("QR detection validation failed: {}", e);
        return Err(e);
    }

    let pipeline = pipeline_from_state(&state).await?;
    let model = pipeline.detector_name().to_string();

    let response = tokio::task::spawn_blocking(move || {
        let data = request.image.unwrap_or_default();
        let (image, info) = decode_base64_image(&data).map_err(|e| {
            warn!("Failed to decode image: {}", e);
            ApiError::from(e)
        })?;
        let output = run_pipeline(&pipeline, &image)?;

        let annotated_image = if request.annotate {
            let body = annotate(&image, &output, output_format_for(info.format))?;
            Some(STANDARD.encode(body))
        } else {
            None
        };

        Ok::<_, ApiError>(DetectQrResponse {
            predictions: output.predictions.iter().map(QrBoundingBox::from).collect(),
            width: info.width,
            height: info.height,
            processing_time_ms: output.processing_time_ms,
            model,
            annotated_image,
        })
    })
    .await
    .map_err(join_error)??;

    Ok(Json(response))
}

async fn pipeline_from_state(state: &AppState) -> Result<QrPipeline, ApiError> {
    let manager_guard = state.vision_model_manager.read().await;
    let manager = manager_guard.as_ref().ok_or_else(|| {
        warn!("Vision service not available");
        ApiError::ServiceUnavailable("Vision service not available".to_string())
    })?;

    manager.get_pipeline().ok_or_else(|| {
        warn!("QR detector not loaded");
        ApiError::ServiceUnavailable("QR detector not loaded".to_string())
    })
}

fn load_upload(bytes: &Bytes) -> Result<(DynamicImage, ImageInfo), ApiError> {
    let (image, info) = decode_image_bytes(bytes).map_err(|e| {
        warn!("Failed to decode upload: {}", e);
        ApiError::from(e)
    })?;
    debug!(
        "Decoded image: {}x{} {:?}, {} bytes",
        info.width, info.height, info.format, info.size_bytes
    );
    Ok((image, info))
}

fn run_pipeline(pipeline: &QrPipeline, image: &DynamicImage) -> Result<PipelineOutput, ApiError> {
    let output = pipeline.run(image).map_err(|e| {
        warn!("QR detection failed: {}", e);
        ApiError::InternalError(format!("QR detection failed: {}", e))
    })?;
    info!(
        "QR prediction complete: {} boxes, {}ms",
        output.predictions.len(),
        output.processing_time_ms
    );
    Ok(output)
}

fn annotate(
    image: &DynamicImage,
    output: &PipelineOutput,
    format: ImageFormat,
) -> Result<Vec<u8>, ApiError> {
    let annotated = draw_bounding_boxes(image, &output.boxes(), BOX_COLOR, BOX_THICKNESS);
    Ok(encode_image(&DynamicImage::ImageRgb8(annotated), format)?)
}

fn json_error(err: JsonRejection, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("JSON body over the {} byte limit", limit);
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    ApiError::InternalError(format!("QR detection task failed: {}", err))
}
