// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tn check`: finite-difference gradient check on a random batch.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tensor_network::{check_gradients, GradCheckConfig, LayerConfig, TensorNetwork};

pub fn execute(
    config: LayerConfig,
    batch: usize,
    max_entries: Option<usize>,
    seed: u64,
    json: bool,
) -> anyhow::Result<()> {
    let (d1, d2) = (config.d1(), config.d2());
    let layer = TensorNetwork::new(config)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let x0 = super::random_batch(&mut rng, batch, d1)?;
    let x1 = super::random_batch(&mut rng, batch, d2)?;

    let check_config = GradCheckConfig {
        max_entries,
        seed,
        ..GradCheckConfig::default()
    };
    let report = check_gradients(&layer, &x0, &x1, &check_config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "  {:<6} {:>8} {:>14} {:>14} {:>6}",
            "Tensor", "Checked", "Max abs err", "Max rel err", "OK",
        );
        println!("  {}", "-".repeat(52));
        for t in &report.tensors {
            println!(
                "  {:<6} {:>8} {:>14.3e} {:>14.3e} {:>6}",
                t.name,
                t.checked,
                t.max_abs_error,
                t.max_rel_error,
                if t.passed { "yes" } else { "NO" },
            );
        }
        println!();
    }

    if !report.passed {
        let failed: Vec<_> = report.failures().map(|t| t.name.as_str()).collect();
        anyhow::bail!("gradient check failed for: {}", failed.join(", "));
    }
    Ok(())
}
