// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Offline augmentation of a YOLO-format QR dataset
//!
//! A random fraction of the images get a chain of transforms applied and are
//! written next to the originals' layout as `images/aug_<name>` and
//! `labels/aug_<stem>.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::labels::{format_labels, read_label_file, YoloBox};
use super::DatasetError;

/// Image extensions picked up from the input directory
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Probability of each transform in the chain
const P_HORIZONTAL_FLIP: f64 = 0.5;
const P_VERTICAL_FLIP: f64 = 0.5;
const P_BRIGHTNESS_CONTRAST: f64 = 0.3;
const P_GAUSSIAN_BLUR: f64 = 0.3;
const P_ROTATE: f64 = 0.5;

const BRIGHTNESS_LIMIT: f32 = 0.2;
const CONTRAST_LIMIT: f32 = 0.2;
const ROTATE_LIMIT_DEGREES: f32 = 10.0;
const BLUR_KERNEL_SIZES: [u32; 3] = [3, 5, 7];

/// A single augmentation step with its sampled parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    HorizontalFlip,
    VerticalFlip,
    /// `out = in * (1 + contrast) + brightness * 255`
    BrightnessContrast { brightness: f32, contrast: f32 },
    GaussianBlur { sigma: f32 },
    /// Counter-clockwise rotation about the image center
    Rotate { degrees: f32 },
}

impl Transform {
    /// Whether box geometry is left untouched
    pub fn is_photometric(&self) -> bool {
        matches!(
            self,
            Transform::BrightnessContrast { .. } | Transform::GaussianBlur { .. }
        )
    }
}

/// Settings for [`augment_dataset`]
#[derive(Debug, Clone)]
pub struct AugmentConfig {
    /// Share of images that get an augmented copy
    pub fraction: f64,
    /// Seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            fraction: 0.2,
            seed: None,
        }
    }
}

impl AugmentConfig {
    pub fn validate(&self) -> Result<(), DatasetError> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(DatasetError::InvalidFraction(self.fraction));
        }
        Ok(())
    }
}

/// Counts reported after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    /// Images found in the input directory
    pub scanned: usize,
    /// Augmented copies written
    pub augmented: usize,
    /// Selected images that could not be read
    pub skipped: usize,
}

/// Draw a transform chain
pub fn sample_transforms<R: Rng + ?Sized>(rng: &mut R) -> Vec<Transform> {
    let mut chain = Vec::new();

    if rng.gen_bool(P_HORIZONTAL_FLIP) {
        chain.push(Transform::HorizontalFlip);
    }
    if rng.gen_bool(P_VERTICAL_FLIP) {
        chain.push(Transform::VerticalFlip);
    }
    if rng.gen_bool(P_BRIGHTNESS_CONTRAST) {
        chain.push(Transform::BrightnessContrast {
            brightness: rng.gen_range(-BRIGHTNESS_LIMIT..=BRIGHTNESS_LIMIT),
            contrast: rng.gen_range(-CONTRAST_LIMIT..=CONTRAST_LIMIT),
        });
    }
    if rng.gen_bool(P_GAUSSIAN_BLUR) {
        let kernel = BLUR_KERNEL_SIZES[rng.gen_range(0..BLUR_KERNEL_SIZES.len())];
        chain.push(Transform::GaussianBlur {
            sigma: sigma_for_kernel(kernel),
        });
    }
    if rng.gen_bool(P_ROTATE) {
        chain.push(Transform::Rotate {
            degrees: rng.gen_range(-ROTATE_LIMIT_DEGREES..=ROTATE_LIMIT_DEGREES),
        });
    }

    chain
}

// OpenCV's sigma for a kernel size when none is given
fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Apply one transform to an image and its boxes
pub fn apply_transform(
    image: &DynamicImage,
    boxes: &[YoloBox],
    transform: Transform,
) -> (DynamicImage, Vec<YoloBox>) {
    match transform {
        Transform::HorizontalFlip => (
            image.fliph(),
            boxes
                .iter()
                .map(|b| YoloBox { cx: 1.0 - b.cx, ..*b })
                .collect(),
        ),
        Transform::VerticalFlip => (
            image.flipv(),
            boxes
                .iter()
                .map(|b| YoloBox { cy: 1.0 - b.cy, ..*b })
                .collect(),
        ),
        Transform::BrightnessContrast {
            brightness,
            contrast,
        } => (
            DynamicImage::ImageRgb8(adjust_brightness_contrast(&image.to_rgb8(), brightness, contrast)),
            boxes.to_vec(),
        ),
        Transform::GaussianBlur { sigma } => (image.blur(sigma), boxes.to_vec()),
        Transform::Rotate { degrees } => {
            let rotated = rotate_image(&image.to_rgb8(), degrees);
            let (w, h) = (image.width() as f32, image.height() as f32);
            let boxes = boxes
                .iter()
                .filter_map(|b| rotate_box(b, degrees, w, h))
                .collect();
            (DynamicImage::ImageRgb8(rotated), boxes)
        }
    }
}

/// Sample a chain and run it over one image/label pair
pub fn augment_sample<R: Rng + ?Sized>(
    image: &DynamicImage,
    boxes: &[YoloBox],
    rng: &mut R,
) -> (DynamicImage, Vec<YoloBox>, Vec<Transform>) {
    let chain = sample_transforms(rng);
    let mut image = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut boxes = boxes.to_vec();

    for transform in &chain {
        let (next_image, next_boxes) = apply_transform(&image, &boxes, *transform);
        image = next_image;
        boxes = next_boxes;
    }

    (image, boxes, chain)
}

/// Augment a fraction of the images in `image_dir`
///
/// Labels are looked up as `<label_dir>/<stem>.txt`. Output goes to
/// `<output_dir>/images` and `<output_dir>/labels`, created if missing.
pub fn augment_dataset(
    image_dir: &Path,
    label_dir: &Path,
    output_dir: &Path,
    config: &AugmentConfig,
) -> Result<AugmentSummary, DatasetError> {
    config.validate()?;

    if !image_dir.is_dir() {
        return Err(DatasetError::MissingDirectory(image_dir.to_path_buf()));
    }

    let out_images = output_dir.join("images");
    let out_labels = output_dir.join("labels");
    fs::create_dir_all(&out_images).map_err(|e| DatasetError::io(&out_images, e))?;
    fs::create_dir_all(&out_labels).map_err(|e| DatasetError::io(&out_labels, e))?;

    let images = list_images(image_dir)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut summary = AugmentSummary {
        scanned: images.len(),
        ..Default::default()
    };

    for path in images {
        if !rng.gen_bool(config.fraction) {
            continue;
        }

        let (Some(file_name), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            summary.skipped += 1;
            continue;
        };

        let image = match image::open(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping unreadable image {}: {}", path.display(), e);
                summary.skipped += 1;
                continue;
            }
        };

        let boxes = read_label_file(&label_dir.join(format!("{}.txt", stem)))?;
        let (augmented, boxes, chain) = augment_sample(&image, &boxes, &mut rng);
        debug!("Augmenting {} with {:?}", file_name, chain);

        let image_out = out_images.join(format!("aug_{}", file_name));
        augmented.save(&image_out).map_err(|e| DatasetError::Image {
            path: image_out.clone(),
            source: e,
        })?;

        let label_out = out_labels.join(format!("aug_{}.txt", stem));
        fs::write(&label_out, format_labels(&boxes)).map_err(|e| DatasetError::io(&label_out, e))?;

        summary.augmented += 1;
    }

    info!(
        "Augmentation complete: {} scanned, {} augmented, {} skipped",
        summary.scanned, summary.augmented, summary.skipped
    );

    Ok(summary)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DatasetError::io(dir, e))?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            images.push(path);
        }
    }

    // read_dir order is platform dependent; seeded runs must not be
    images.sort();
    Ok(images)
}

fn adjust_brightness_contrast(image: &RgbImage, brightness: f32, contrast: f32) -> RgbImage {
    let alpha = 1.0 + contrast;
    let beta = brightness * 255.0;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * alpha + beta).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Rotate counter-clockwise about the center, keeping the canvas size
///
/// Uncovered pixels are black.
fn rotate_image(image: &RgbImage, degrees: f32) -> RgbImage {
    let (w, h) = image.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);

    RgbImage::from_fn(w, h, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let src_x = (cx + dx * cos - dy * sin).floor();
        let src_y = (cy + dx * sin + dy * cos).floor();

        if src_x >= 0.0 && src_y >= 0.0 && src_x < w as f32 && src_y < h as f32 {
            *image.get_pixel(src_x as u32, src_y as u32)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Rotate a box's corners and take their axis-aligned hull
fn rotate_box(b: &YoloBox, degrees: f32, width: f32, height: f32) -> Option<YoloBox> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (cx, cy) = (width / 2.0, height / 2.0);
    let (x0, y0, x1, y1) = b.corners();

    let mut min = (f32::MAX, f32::MAX);
    let mut max = (f32::MIN, f32::MIN);
    for (nx, ny) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
        let dx = nx * width - cx;
        let dy = ny * height - cy;
        let rx = (cx + dx * cos + dy * sin) / width;
        let ry = (cy - dx * sin + dy * cos) / height;
        min = (min.0.min(rx), min.1.min(ry));
        max = (max.0.max(rx), max.1.max(ry));
    }

    YoloBox::from_corners(b.class_id, min.0, min.1, max.0, max.1)
}
