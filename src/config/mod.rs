// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod node;

pub use node::{NodeConfig, DEFAULT_MAX_UPLOAD_BYTES};
