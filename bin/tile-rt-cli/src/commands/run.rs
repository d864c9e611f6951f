// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt run` command: execute a built-in kernel on synthetic data.
//!
//! Walks the type-state launch:
//! ```text
//! Launch<Idle> → dispatch → <Dispatched> → plan → <Ready> → run_op
//! ```
//! and checks the output against the host fallback.

use runtime::{FallbackExecutor, HostFallback, KernelRegistry, Launch, OpId, RuntimeConfig};
use std::sync::Arc;
use tensor_core::{DType, Element, TensorDescriptor};

pub async fn execute(
    mut config: RuntimeConfig,
    op: String,
    elements: usize,
    dtype: String,
    revision: Option<u32>,
) -> anyhow::Result<()> {
    if let Some(revision) = revision {
        config.revision = revision;
    }
    let op = parse_op(&op)?;

    super::banner("Kernel Runner");
    println!("  Config:");
    println!("   Revision: {}", config.revision);
    println!("   Units:    {}", config.unit_count);
    println!("   Capacity: {}", config.buffer_capacity);
    println!("   Policy:   {}", config.split_policy);
    println!("   Op:       {}", op.as_str());
    println!();

    match DType::parse(&dtype)? {
        DType::F32 => run_typed::<f32>(config, op, elements, |i| (i % 251) as f32 * 0.5).await,
        DType::F64 => run_typed::<f64>(config, op, elements, |i| (i % 251) as f64 * 0.25).await,
        DType::I32 => run_typed::<i32>(config, op, elements, |i| (i % 251) as i32 - 125).await,
        DType::I64 => run_typed::<i64>(config, op, elements, |i| (i % 251) as i64 - 125).await,
        other => anyhow::bail!("no synthetic data for dtype '{other}'; use f32, f64, i32 or i64"),
    }
}

fn parse_op(name: &str) -> anyhow::Result<OpId> {
    [OpId::COPY, OpId::MAXIMUM, OpId::MINIMUM]
        .into_iter()
        .find(|op| op.as_str() == name)
        .ok_or_else(|| anyhow::anyhow!("unknown op '{name}'; expected copy, maximum or minimum"))
}

async fn run_typed<T: Element>(
    config: RuntimeConfig,
    op: OpId,
    elements: usize,
    value: impl Fn(usize) -> T,
) -> anyhow::Result<()> {
    let registry = KernelRegistry::with_builtins();
    let kernel = registry.get::<T>(op)?;
    let arity = kernel.arity();

    // Operand k is the base sequence rotated by k * 17.
    let sources: Vec<Arc<[T]>> = (0..arity)
        .map(|k| (0..elements).map(|i| value(i + k * 17)).collect())
        .collect();

    // ── Type-State Launch ──────────────────────────────────────
    println!("  [1/3] Dispatching...");
    let dispatched =
        Launch::new(config)?.dispatch(vec![TensorDescriptor::flat(elements, T::DTYPE); arity])?;
    println!("        {}", dispatched.decision());

    println!("  [2/3] Planning...");
    let ready = dispatched.plan()?;
    println!("        {}", ready.plan().summary());
    println!("        workspace: {} bytes", ready.workspace_bytes());

    println!("  [3/3] Running...");
    let output = ready.run_op(&registry, op, sources.clone()).await?;
    println!();

    // ── Check ──────────────────────────────────────────────────
    let lanes: Vec<&[T]> = sources.iter().map(|s| &s[..]).collect();
    let mut expected = vec![T::default(); elements];
    HostFallback.execute(kernel.as_ref(), &lanes, &mut expected)?;
    let mismatches = output
        .output
        .iter()
        .zip(&expected)
        .filter(|(a, b)| a != b)
        .count();

    println!("  Metrics:");
    println!("   {}", output.metrics.summary());
    if let Some(slowest) = output.metrics.slowest_unit() {
        println!(
            "   slowest unit: #{} ({} elements, {:.2}ms)",
            slowest.unit_index,
            slowest.element_count,
            slowest.duration.as_secs_f64() * 1000.0,
        );
    }
    println!();

    if mismatches > 0 {
        anyhow::bail!("{mismatches} of {elements} elements differ from the host fallback");
    }
    println!("  Output matches host fallback ({elements} elements).");
    Ok(())
}
