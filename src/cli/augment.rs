// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::dataset::{augment_dataset, AugmentConfig};

/// Arguments for the augment command
#[derive(Args, Debug)]
pub struct AugmentArgs {
    /// Directory holding the source images
    #[arg(long)]
    pub images: PathBuf,

    /// Directory holding the YOLO label files
    #[arg(long)]
    pub labels: PathBuf,

    /// Output root; `images/` and `labels/` are created below it
    #[arg(long)]
    pub output: PathBuf,

    /// Share of images to augment
    #[arg(long, default_value_t = 0.2)]
    pub fraction: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Augment a dataset on disk
pub async fn run_augment(args: AugmentArgs) -> Result<()> {
    let config = AugmentConfig {
        fraction: args.fraction,
        seed: args.seed,
    };

    println!(
        "🔄 Augmenting {} ({}% of images)...",
        args.images.display(),
        (args.fraction * 100.0).round()
    );

    let summary = tokio::task::spawn_blocking(move || {
        augment_dataset(&args.images, &args.labels, &args.output, &config)
    })
    .await
    .context("Augmentation task panicked")??;

    println!(
        "✅ Augmented {} of {} images ({} skipped)",
        summary.augmented, summary.scanned, summary.skipped
    );
    Ok(())
}
