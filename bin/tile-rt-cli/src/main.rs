// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tile-rt
//!
//! Command-line interface for the tiled accelerator runtime.
//!
//! ## Usage
//! ```bash
//! # Show how 100 elements split over 8 units with 16-element buffers
//! tile-rt plan --elements 100 --units 8 --capacity 16
//!
//! # Ask which path a set of dtypes takes on a revision
//! tile-rt dispatch --dtype f32,bf16 --revision 100
//!
//! # Print the capability table
//! tile-rt table
//!
//! # Run a kernel end to end and check it against the host fallback
//! tile-rt run --op maximum --elements 40961 --dtype f32
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tile-rt",
    about = "Tiling planner and dispatcher for multi-core accelerator kernels",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI arguments override it).
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
    /// Compute and print a tiling plan.
    Plan {
        /// Total elements to partition.
        #[arg(short, long)]
        elements: i64,

        /// Execution units (defaults to the config's unit count).
        #[arg(short, long)]
        units: Option<usize>,

        /// Staging buffer capacity, e.g. "16", "16K" (defaults to the config's).
        #[arg(long)]
        capacity: Option<String>,

        /// Split policy: remainder-first, remainder-last, distinct-tail.
        #[arg(short, long)]
        policy: Option<String>,

        /// Element type used to align the buffer capacity.
        #[arg(long)]
        dtype: Option<String>,

        /// Emit the plan and its tiling record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decide accelerated vs fallback for a list of operand dtypes.
    Dispatch {
        /// Comma-separated operand dtypes (e.g. "f32,f32").
        #[arg(short, long, value_delimiter = ',', required = true)]
        dtype: Vec<String>,

        /// Hardware revision (defaults to the config's).
        #[arg(short, long)]
        revision: Option<u32>,
    },

    /// Print the capability support table.
    Table,

    /// Run a built-in kernel on synthetic data.
    Run {
        /// Operation: copy, maximum, minimum.
        #[arg(long, default_value = "maximum")]
        op: String,

        /// Elements per operand.
        #[arg(short, long, default_value_t = 4096)]
        elements: usize,

        /// Element type: f32, f64, i32, i64.
        #[arg(long, default_value = "f32")]
        dtype: String,

        /// Hardware revision (defaults to the config's).
        #[arg(short, long)]
        revision: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan {
            elements,
            units,
            capacity,
            policy,
            dtype,
            json,
        } => commands::plan::execute(config, elements, units, capacity, policy, dtype, json),
        Commands::Dispatch { dtype, revision } => {
            commands::dispatch::execute(config, dtype, revision)
        }
        Commands::Table => commands::table::execute(),
        Commands::Run {
            op,
            elements,
            dtype,
            revision,
        } => commands::run::execute(config, op, elements, dtype, revision).await,
    }
}
