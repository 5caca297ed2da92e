// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction request types: multipart uploads and base64 JSON bodies

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::errors::ApiError;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// An image received through a multipart form
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub file_name: Option<String>,
}

/// Pull the `file` field out of a multipart form
///
/// Other fields are skipped. A missing or empty `file` field is a
/// validation error; `limit` is the body limit reported on overflow.
pub async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<UploadedImage, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        if name.as_deref() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", name);
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        if bytes.is_empty() {
            return Err(ApiError::ValidationError {
                field: UPLOAD_FIELD.to_string(),
                message: "file is empty".to_string(),
            });
        }

        return Ok(UploadedImage {
            bytes,
            file_name,
        });
    }

    Err(ApiError::ValidationError {
        field: UPLOAD_FIELD.to_string(),
        message: "file is required".to_string(),
    })
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}

/// JSON body for `POST /v1/detect-qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectQrRequest {
    /// Base64-encoded image data (a data URL prefix is accepted)
    #[serde(default)]
    pub image: Option<String>,

    /// Also return the annotated image as base64 PNG/JPEG
    #[serde(default)]
    pub annotate: bool,
}

impl DetectQrRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let image = self.image.as_deref().unwrap_or("");
        if image.is_empty() {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }

        // base64 inflates by 4/3
        if image.len() > MAX_IMAGE_SIZE / 3 * 4 + 4 + 64 {
            return Err(ApiError::PayloadTooLarge {
                limit: MAX_IMAGE_SIZE,
            });
        }

        Ok(())
    }
}
