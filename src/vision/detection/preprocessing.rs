// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for the YOLO QR detector

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square input size of the exported detector
pub const DETECTION_INPUT_SIZE: u32 = 640;

/// Gray value used for letterbox padding (Ultralytics convention)
pub const PAD_VALUE: u8 = 114;

/// Scale and padding applied by [`letterbox`]
///
/// Used to map detector coordinates back to the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Scale factor applied to the original image
    pub scale: f32,
    /// Horizontal padding on the left
    pub pad_x: u32,
    /// Vertical padding on top
    pub pad_y: u32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl LetterboxInfo {
    /// Calculate letterbox geometry for an image of the given size
    pub fn new(orig_w: u32, orig_h: u32, target_size: u32) -> Self {
        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0,
                pad_y: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let (new_w, new_h) = scaled_dims(orig_w, orig_h, scale);

        Self {
            scale,
            pad_x: (target_size - new_w) / 2,
            pad_y: (target_size - new_h) / 2,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Map a point from detector input space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.pad_x as f32) / self.scale;
        let orig_y = (y - self.pad_y as f32) / self.scale;
        (orig_x, orig_y)
    }

    /// Map a point from original image space into detector input space
    pub fn map_to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.pad_x as f32,
            y * self.scale + self.pad_y as f32,
        )
    }
}

fn scaled_dims(orig_w: u32, orig_h: u32, scale: f32) -> (u32, u32) {
    let new_w = ((orig_w as f32 * scale).round() as u32).max(1);
    let new_h = ((orig_h as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Resize with aspect ratio preservation and pad to a square canvas
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let info = LetterboxInfo::new(orig_w, orig_h, target_size);
    let mut canvas = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if orig_w == 0 || orig_h == 0 {
        return (canvas, info);
    }

    let (new_w, new_h) = scaled_dims(orig_w, orig_h, info.scale);
    let resized = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    image::imageops::replace(&mut canvas, &resized, info.pad_x as i64, info.pad_y as i64);

    (canvas, info)
}

/// Preprocess an image for the detector
///
/// Steps:
/// 1. Letterbox to `DETECTION_INPUT_SIZE` with gray padding
/// 2. Scale pixels to [0, 1], RGB order
/// 3. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_detection(image: &DynamicImage) -> (Array4<f32>, LetterboxInfo) {
    let (canvas, info) = letterbox(image, DETECTION_INPUT_SIZE);
    let size = DETECTION_INPUT_SIZE as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}
