// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tn inspect`: resolved configuration and parameter shapes.

use tensor_network::{LayerConfig, TensorNetwork};

pub fn execute(config: LayerConfig) -> anyhow::Result<()> {
    let layer = TensorNetwork::new(config)?;
    let params = layer.params();
    let (d1, d2, out) = params.dims();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             tn · Layer Inspector                     ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Inputs:  d1 = {d1}, d2 = {d2}");
    println!("  Outputs: {out}");
    println!("  Bias:    {:?}", params.bias_mode());
    println!(
        "  Device:  {}",
        layer.device().map_or("reference", |d| d.name())
    );
    println!();

    // ── Parameters ─────────────────────────────────────────────
    println!("  {:<6} {:<16} {:>10} {:>10}", "Name", "Shape", "Elements", "Bytes");
    println!("  {}", "-".repeat(46));
    let mut total = 0;
    for name in params.parameter_names() {
        if let Some(t) = params.parameter(name) {
            total += t.size_bytes();
            println!(
                "  {:<6} {:<16} {:>10} {:>10}",
                name,
                t.shape().to_string(),
                t.num_elements(),
                t.size_bytes(),
            );
        }
    }
    println!("  {}", "-".repeat(46));
    println!(
        "  Total parameter bytes: {total} (gradients: {})",
        params.gradient_names().len()
    );
    println!();

    // ── Config ─────────────────────────────────────────────────
    println!("  Resolved configuration:");
    for line in layer.config().to_toml()?.lines() {
        println!("    {line}");
    }
    println!();
    Ok(())
}
