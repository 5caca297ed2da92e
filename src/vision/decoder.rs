// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR payload decoding inside detected regions
//!
//! Decoding is delegated to `rqrr`; this module only crops, pads and
//! converts to grayscale.

use image::{imageops, DynamicImage, GrayImage, Luma};
use tracing::{debug, trace};

use super::types::{BoundingBox, QrPrediction};

/// White border added around a crop, as a fraction of its longer side
const QUIET_ZONE_RATIO: u32 = 8;

/// Lower bound on the white border in pixels
const MIN_QUIET_ZONE: u32 = 4;

/// Decode the first readable QR code inside `bbox`
///
/// Returns `None` when the region is empty or nothing decodes.
pub fn decode_qr_region(image: &DynamicImage, bbox: &BoundingBox) -> Option<String> {
    let region = bbox.clamp_to(image.width(), image.height());
    if region.is_empty() {
        debug!(?bbox, "Skipping empty QR region");
        return None;
    }

    let crop = image
        .crop_imm(region.x_min, region.y_min, region.width(), region.height())
        .to_luma8();

    decode_gray(&with_quiet_zone(&crop)).into_iter().next()
}

/// Decode every readable QR code in the whole image
pub fn decode_qr_full(image: &DynamicImage) -> Vec<String> {
    decode_gray(&with_quiet_zone(&image.to_luma8()))
}

/// Locate and decode QR codes without a detector
///
/// Boxes come from the decoder's own grid corners. Grids that are found but
/// fail to decode are kept with `content: None`.
pub fn scan_qr_full(image: &DynamicImage) -> Vec<QrPrediction> {
    let gray = image.to_luma8();
    let margin = quiet_zone_margin(&gray) as i32;
    let padded = with_quiet_zone(&gray);

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        padded.width() as usize,
        padded.height() as usize,
        |x, y| padded.get_pixel(x as u32, y as u32).0[0],
    );

    prepared
        .detect_grids()
        .iter()
        .map(|grid| {
            let xs = grid.bounds.iter().map(|p| p.x - margin);
            let ys = grid.bounds.iter().map(|p| p.y - margin);
            let to_px = |v: i32| v.max(0) as u32;
            let bbox = BoundingBox::new(
                to_px(xs.clone().min().unwrap_or(0)),
                to_px(ys.clone().min().unwrap_or(0)),
                to_px(xs.max().unwrap_or(0)),
                to_px(ys.max().unwrap_or(0)),
            )
            .clamp_to(gray.width(), gray.height());

            QrPrediction {
                bbox,
                score: 1.0,
                content: grid.decode().ok().map(|(_meta, content)| content),
            }
        })
        .collect()
}

fn quiet_zone_margin(crop: &GrayImage) -> u32 {
    (crop.width().max(crop.height()) / QUIET_ZONE_RATIO).max(MIN_QUIET_ZONE)
}

/// Pad a grayscale crop with a white margin so finder patterns are isolated
fn with_quiet_zone(crop: &GrayImage) -> GrayImage {
    let margin = quiet_zone_margin(crop);
    let mut padded = GrayImage::from_pixel(
        crop.width() + 2 * margin,
        crop.height() + 2 * margin,
        Luma([255]),
    );
    imageops::replace(&mut padded, crop, margin as i64, margin as i64);
    padded
}

fn decode_gray(gray: &GrayImage) -> Vec<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );

    let grids = prepared.detect_grids();
    trace!(count = grids.len(), "QR grids located");

    grids
        .iter()
        .filter_map(|grid| match grid.decode() {
            Ok((_meta, content)) => Some(content),
            Err(e) => {
                debug!(error = %e, "Failed to decode QR grid");
                None
            }
        })
        .collect()
}
