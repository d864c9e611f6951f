// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare split policies on the same invocation.
//!
//! Every policy covers the same elements, so outputs agree; what differs
//! is which units carry the extra work and how many tiles each runs.
//!
//! ```bash
//! cargo run -p runtime --example policy_comparison
//! ```

use runtime::{KernelRegistry, Launch, OpId, RuntimeConfig};
use staging::StagingCapacity;
use std::sync::Arc;
use tensor_core::{DType, TensorDescriptor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let totals = [100usize, 1_003, 40_961];
    let policies = ["remainder-first", "remainder-last", "distinct-tail"];

    println!(
        "{:<18} {:>8} {:>8} {:>8} {:>10} {:>12}",
        "Policy", "Elements", "Units", "Tiles", "Max unit", "Workspace",
    );
    println!("{}", "-".repeat(70));

    for policy in policies {
        for total in totals {
            let config = RuntimeConfig {
                split_policy: policy.into(),
                buffer_capacity: StagingCapacity::parse("1K")?,
                ..Default::default()
            };
            let ready = Launch::new(config)?
                .dispatch(vec![TensorDescriptor::flat(total, DType::F32); 2])?
                .plan()?;
            let plan = ready.plan();
            let max_unit = plan.units.iter().map(|u| u.element_count).max().unwrap_or(0);
            println!(
                "{:<18} {:>8} {:>8} {:>8} {:>10} {:>10} B",
                policy,
                total,
                plan.active_units(),
                plan.total_tiles(),
                max_unit,
                ready.workspace_bytes(),
            );
        }
    }

    // Run one invocation per policy and check the outputs agree.
    println!("\n--- Running 'maximum' on 40961 f32 elements ---\n");
    let a: Arc<[f32]> = (0..40_961).map(|i| (i % 97) as f32).collect();
    let b: Arc<[f32]> = (0..40_961).map(|i| (i % 89) as f32).collect();
    let registry = KernelRegistry::with_builtins();
    let rt = tokio::runtime::Runtime::new()?;

    let mut outputs = Vec::new();
    for policy in policies {
        let config = RuntimeConfig {
            split_policy: policy.into(),
            ..Default::default()
        };
        let ready = Launch::new(config)?
            .dispatch(vec![TensorDescriptor::flat(a.len(), DType::F32); 2])?
            .plan()?;
        let out = rt.block_on(ready.run_op(
            &registry,
            OpId::MAXIMUM,
            vec![Arc::clone(&a), Arc::clone(&b)],
        ))?;
        println!("{policy}: {}", out.metrics.summary());
        outputs.push(out.output);
    }

    let agree = outputs.windows(2).all(|w| w[0] == w[1]);
    println!("\nOutputs agree across policies: {agree}");
    Ok(())
}
