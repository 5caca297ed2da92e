// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::predict::{QrBoundingBox, QrPredictionResponse};
use crate::vision::{
    decode_image_bytes, draw_bounding_boxes, scan_qr_full, BoundingBox, PostprocessParams,
    QrDetectionModel, QrPipeline, QrPrediction, BOX_COLOR, BOX_THICKNESS,
};

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image file to scan
    pub image: PathBuf,

    /// ONNX QR detector (whole-image decoding when omitted)
    #[arg(long, env = "QR_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Write a copy of the image with the boxes drawn to this path
    #[arg(long)]
    pub annotate: Option<PathBuf>,

    /// Minimum detector score
    #[arg(long, default_value_t = 0.25)]
    pub confidence: f32,
}

/// Run the QR pipeline on a local file and print the JSON response
pub async fn run_detect(args: DetectArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let (image, image_info) = decode_image_bytes(&bytes)
        .with_context(|| format!("Failed to decode {}", args.image.display()))?;
    info!(
        "Loaded {}: {}x{} {:?}",
        args.image.display(),
        image_info.width,
        image_info.height,
        image_info.format
    );

    let params = PostprocessParams {
        confidence_threshold: args.confidence,
        ..Default::default()
    };
    let model = args.model.clone();
    let task_image = image.clone();
    let predictions = tokio::task::spawn_blocking(move || locate(&task_image, model, params))
        .await
        .context("Detection task panicked")??;

    let response = QrPredictionResponse {
        predictions: predictions.iter().map(QrBoundingBox::from).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(out) = args.annotate {
        let boxes: Vec<BoundingBox> = predictions.iter().map(|p| p.bbox).collect();
        let annotated = draw_bounding_boxes(&image, &boxes, BOX_COLOR, BOX_THICKNESS);
        DynamicImage::ImageRgb8(annotated)
            .save(&out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("🖼️  Annotated image written to {}", out.display());
    }

    Ok(())
}

fn locate(
    image: &DynamicImage,
    model: Option<PathBuf>,
    params: PostprocessParams,
) -> Result<Vec<QrPrediction>> {
    match model {
        Some(path) => {
            let detector = QrDetectionModel::new(&path)
                .with_context(|| format!("Failed to load QR detector {}", path.display()))?
                .with_params(params);
            let output = QrPipeline::new(Arc::new(detector)).run(image)?;
            Ok(output.predictions)
        }
        None => {
            warn!("No QR detector given, decoding the whole image");
            Ok(scan_qr_full(image))
        }
    }
}
