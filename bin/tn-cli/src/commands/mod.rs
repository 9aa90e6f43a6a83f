// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod check;
pub mod compare;
pub mod inspect;

use rand::rngs::StdRng;
use rand::Rng;
use std::path::Path;
use tensor_core::{Shape, Tensor};
use tensor_network::LayerConfig;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the layer config from `path`, or the demo layer when absent.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayerConfig> {
    match path {
        Some(path) => Ok(LayerConfig::from_file(path)?),
        None => Ok(LayerConfig {
            seed: Some(0),
            ..LayerConfig::new(8, 6, 4)
        }),
    }
}

/// A `[batch, features]` tensor of uniform values in `[-1, 1)`.
pub fn random_batch(rng: &mut StdRng, batch: usize, features: usize) -> anyhow::Result<Tensor> {
    let data = (0..batch * features)
        .map(|_| rng.gen_range(-1.0f32..1.0))
        .collect();
    Ok(Tensor::from_vec(Shape::matrix(batch, features), data)?)
}
