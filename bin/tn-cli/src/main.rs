// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tn
//!
//! Command-line driver for the tensor network layer.
//!
//! ## Usage
//! ```bash
//! # Show the resolved layer configuration and parameter shapes
//! tn --config layer.toml inspect
//!
//! # Verify the analytic gradients against central differences
//! tn --config layer.toml check --batch 4 --json
//!
//! # Compare the reference and device paths on a random batch
//! tn --config layer.toml compare --batch 256 --threads 4
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tn",
    about = "Bilinear tensor network layer: inspect, gradient-check, and compare paths",
    version
)]
struct Cli {
    /// Path to a TOML layer configuration (defaults to a small demo layer).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration and parameter shapes.
    Inspect,

    /// Run a finite-difference gradient check on a random batch.
    Check {
        /// Batch size.
        #[arg(short, long, default_value_t = 4)]
        batch: usize,

        /// Check at most this many entries per tensor.
        #[arg(long)]
        max_entries: Option<usize>,

        /// Seed for the inputs and the cotangent direction.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run every execution path on the same batch and report differences.
    Compare {
        /// Batch size.
        #[arg(short, long, default_value_t = 64)]
        batch: usize,

        /// Worker threads for the parallel device.
        #[arg(short, long)]
        threads: Option<usize>,

        /// Seed for the inputs.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "layer configuration loaded");

    match cli.command {
        Commands::Inspect => commands::inspect::execute(config),
        Commands::Check {
            batch,
            max_entries,
            seed,
            json,
        } => commands::check::execute(config, batch, max_entries, seed, json),
        Commands::Compare {
            batch,
            threads,
            seed,
        } => commands::compare::execute(config, batch, threads, seed),
    }
}
