// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tn compare`: every execution path on one batch, with timings and the
//! largest deviation from the reference path.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tensor_core::Tensor;
use tensor_network::{
    DeviceKind, DeviceRuntime, HostDevice, LayerConfig, ParallelDevice, TensorNetwork,
};

pub fn execute(
    mut config: LayerConfig,
    batch: usize,
    threads: Option<usize>,
    seed: u64,
) -> anyhow::Result<()> {
    if threads.is_some() {
        config.num_threads = threads;
    }
    config.validate()?;
    let (d1, d2) = (config.d1(), config.d2());
    let layer = TensorNetwork::new(config)?;
    let own_pool = pool_for(&layer)?;
    let parallel = match (&own_pool, layer.device()) {
        (Some(pool), _) => pool as &dyn DeviceRuntime,
        (None, Some(device)) => device,
        (None, None) => anyhow::bail!("no parallel device available"),
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let x0 = super::random_batch(&mut rng, batch, d1)?;
    let x1 = super::random_batch(&mut rng, batch, d2)?;
    let gy = super::random_batch(&mut rng, batch, layer.params().dims().2)?;

    println!(
        "  {:<10} {:>12} {:>12} {:>14} {:>14}",
        "Path", "Forward", "Backward", "Max |Δy|", "Max |Δgx|",
    );
    println!("  {}", "-".repeat(66));

    let mut reference = layer.clone();
    let start = Instant::now();
    let y_ref = reference.forward(&x0, &x1)?;
    let fwd_ms = start.elapsed().as_secs_f64() * 1000.0;
    let start = Instant::now();
    let (g0_ref, g1_ref) = reference.backward(&x0, &x1, &gy)?;
    let bwd_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!(
        "  {:<10} {:>10.3}ms {:>10.3}ms {:>14} {:>14}",
        "reference", fwd_ms, bwd_ms, "-", "-",
    );

    let host = HostDevice::new();
    for device in [&host as &dyn DeviceRuntime, parallel] {
        let mut on_device = layer.clone();
        let start = Instant::now();
        let y = on_device.forward_on(device, &x0, &x1)?;
        let fwd_ms = start.elapsed().as_secs_f64() * 1000.0;
        let start = Instant::now();
        let (g0, g1) = on_device.backward_on(device, &x0, &x1, &gy)?;
        let bwd_ms = start.elapsed().as_secs_f64() * 1000.0;

        println!(
            "  {:<10} {:>10.3}ms {:>10.3}ms {:>14.3e} {:>14.3e}",
            device.name(),
            fwd_ms,
            bwd_ms,
            max_abs_diff(&y, &y_ref),
            max_abs_diff(&g0, &g0_ref).max(max_abs_diff(&g1, &g1_ref)),
        );
    }
    println!();
    Ok(())
}

/// A fresh pool, unless the layer already runs on the parallel device.
fn pool_for(layer: &TensorNetwork) -> anyhow::Result<Option<ParallelDevice>> {
    if layer.config().device == DeviceKind::Parallel && layer.device().is_some() {
        return Ok(None);
    }
    Ok(Some(ParallelDevice::new(layer.config().resolve_threads())?))
}

fn max_abs_diff(a: &Tensor, b: &Tensor) -> f32 {
    a.as_f32_slice()
        .iter()
        .zip(b.as_f32_slice())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(device: DeviceKind) -> LayerConfig {
        LayerConfig {
            seed: Some(1),
            device,
            num_threads: Some(2),
            ..LayerConfig::new(3, 2, 2)
        }
    }

    #[test]
    fn test_reuses_configured_pool() {
        let layer = TensorNetwork::new(config(DeviceKind::Parallel)).unwrap();
        assert!(pool_for(&layer).unwrap().is_none());

        let layer = TensorNetwork::new(config(DeviceKind::Host)).unwrap();
        assert!(pool_for(&layer).unwrap().is_some());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = execute(config(DeviceKind::Reference), 2, Some(0), 0).unwrap_err();
        assert!(err.to_string().contains("num_threads"));
    }

    #[test]
    fn test_runs_on_parallel_config() {
        execute(config(DeviceKind::Parallel), 3, None, 7).unwrap();
    }
}
