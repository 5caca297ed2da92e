// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Dataset augmentation over a temporary YOLO dataset

use image::{DynamicImage, Rgb, RgbImage};
use qr_detection_node::dataset::{
    augment_dataset, parse_labels, AugmentConfig, AugmentSummary, DatasetError,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Dataset {
    _root: TempDir,
    images: std::path::PathBuf,
    labels: std::path::PathBuf,
    output: std::path::PathBuf,
}

fn write_image(path: &Path, w: u32, h: u32) {
    let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, 90]));
    DynamicImage::ImageRgb8(img).save(path).unwrap();
}

/// Three images: two labelled, one without a label file, plus a stray text file
fn dataset() -> Dataset {
    let root = tempfile::tempdir().unwrap();
    let images = root.path().join("train/images");
    let labels = root.path().join("train/labels");
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&labels).unwrap();

    write_image(&images.join("a.jpg"), 64, 48);
    write_image(&images.join("b.png"), 40, 40);
    write_image(&images.join("c.jpeg"), 32, 32);
    fs::write(images.join("notes.txt"), "not an image").unwrap();

    fs::write(labels.join("a.txt"), "0 0.5 0.5 0.25 0.25\n").unwrap();
    fs::write(labels.join("b.txt"), "0 0.5 0.5 0.2 0.3\n0 0.5 0.45 0.1 0.1\n").unwrap();

    let output = root.path().join("augmented");
    Dataset {
        _root: root,
        images,
        labels,
        output,
    }
}

#[test]
fn test_full_fraction_augments_every_image() {
    let ds = dataset();
    let config = AugmentConfig {
        fraction: 1.0,
        seed: Some(7),
    };

    let summary = augment_dataset(&ds.images, &ds.labels, &ds.output, &config).unwrap();
    assert_eq!(
        summary,
        AugmentSummary {
            scanned: 3,
            augmented: 3,
            skipped: 0
        }
    );

    for name in ["aug_a.jpg", "aug_b.png", "aug_c.jpeg"] {
        assert!(ds.output.join("images").join(name).is_file(), "{}", name);
    }

    // Centered boxes survive any flip and a rotation of at most 10 degrees
    let a = parse_labels(&fs::read_to_string(ds.output.join("labels/aug_a.txt")).unwrap()).unwrap();
    assert_eq!(a.len(), 1);
    let b = parse_labels(&fs::read_to_string(ds.output.join("labels/aug_b.txt")).unwrap()).unwrap();
    assert_eq!(b.len(), 2);
    for label in a.iter().chain(&b) {
        let (x0, y0, x1, y1) = label.corners();
        assert!(x0 >= 0.0 && y0 >= 0.0 && x1 <= 1.0 + 1e-5 && y1 <= 1.0 + 1e-5);
    }

    // No label file means an empty label file out
    let c = fs::read_to_string(ds.output.join("labels/aug_c.txt")).unwrap();
    assert!(c.is_empty());
}

#[test]
fn test_augmented_image_keeps_dimensions() {
    let ds = dataset();
    let config = AugmentConfig {
        fraction: 1.0,
        seed: Some(3),
    };
    augment_dataset(&ds.images, &ds.labels, &ds.output, &config).unwrap();

    let out = image::open(ds.output.join("images/aug_a.jpg")).unwrap();
    assert_eq!((out.width(), out.height()), (64, 48));
}

#[test]
fn test_zero_fraction_creates_layout_only() {
    let ds = dataset();
    let config = AugmentConfig {
        fraction: 0.0,
        seed: Some(1),
    };

    let summary = augment_dataset(&ds.images, &ds.labels, &ds.output, &config).unwrap();
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.augmented, 0);
    assert!(ds.output.join("images").is_dir());
    assert!(ds.output.join("labels").is_dir());
    assert_eq!(fs::read_dir(ds.output.join("images")).unwrap().count(), 0);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let ds = dataset();
    let config = AugmentConfig {
        fraction: 0.5,
        seed: Some(1234),
    };

    let first_out = ds.output.join("first");
    let second_out = ds.output.join("second");
    let first = augment_dataset(&ds.images, &ds.labels, &first_out, &config).unwrap();
    let second = augment_dataset(&ds.images, &ds.labels, &second_out, &config).unwrap();
    assert_eq!(first, second);

    for name in ["aug_a.txt", "aug_b.txt", "aug_c.txt"] {
        let a = fs::read_to_string(first_out.join("labels").join(name)).ok();
        let b = fs::read_to_string(second_out.join("labels").join(name)).ok();
        assert_eq!(a, b, "{}", name);
    }
}

#[test]
fn test_unreadable_image_is_skipped() {
    let ds = dataset();
    fs::write(ds.images.join("broken.png"), b"not a png").unwrap();
    let config = AugmentConfig {
        fraction: 1.0,
        seed: Some(9),
    };

    let summary = augment_dataset(&ds.images, &ds.labels, &ds.output, &config).unwrap();
    assert_eq!(summary.scanned, 4);
    assert_eq!(summary.augmented, 3);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_bad_label_file_is_an_error() {
    let ds = dataset();
    fs::write(ds.labels.join("a.txt"), "0 0.5\n").unwrap();
    let config = AugmentConfig {
        fraction: 1.0,
        seed: Some(9),
    };

    let err = augment_dataset(&ds.images, &ds.labels, &ds.output, &config).unwrap_err();
    assert!(matches!(err, DatasetError::InvalidLabel { line: 1, .. }));
}

#[test]
fn test_missing_image_directory() {
    let ds = dataset();
    let err = augment_dataset(
        &ds.images.join("nope"),
        &ds.labels,
        &ds.output,
        &AugmentConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DatasetError::MissingDirectory(_)));
}
