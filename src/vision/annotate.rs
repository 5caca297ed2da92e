// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Draws prediction boxes onto an image

use image::{DynamicImage, Rgb, RgbImage};

use super::types::BoundingBox;

/// Outline color used by the API and UI
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline thickness in pixels
pub const BOX_THICKNESS: u32 = 3;

/// Draw a hollow rectangle for each box, growing inward from its edges
pub fn draw_bounding_boxes(
    image: &DynamicImage,
    boxes: &[BoundingBox],
    color: Rgb<u8>,
    thickness: u32,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();

    for bbox in boxes {
        let b = bbox.clamp_to(width, height);
        if b.is_empty() {
            continue;
        }
        let t = thickness.max(1);
        // top and bottom bands
        fill_rect(&mut canvas, b.x_min, b.y_min, b.x_max, (b.y_min + t).min(b.y_max), color);
        fill_rect(&mut canvas, b.x_min, b.y_max.saturating_sub(t).max(b.y_min), b.x_max, b.y_max, color);
        // left and right bands
        fill_rect(&mut canvas, b.x_min, b.y_min, (b.x_min + t).min(b.x_max), b.y_max, color);
        fill_rect(&mut canvas, b.x_max.saturating_sub(t).max(b.x_min), b.y_min, b.x_max, b.y_max, color);
    }

    canvas
}

/// Fill the half-open rectangle [x0, x1) x [y0, y1)
fn fill_rect(canvas: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(canvas.height()) {
        for x in x0..x1.min(canvas.width()) {
            canvas.put_pixel(x, y, color);
        }
    }
}
