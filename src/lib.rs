// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod version;
pub mod vision;

pub use api::{create_router, AppState};
pub use config::NodeConfig;
pub use vision::{QrPipeline, QrPrediction, VisionModelManager};
