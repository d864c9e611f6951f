// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt plan` command: print the unit and tile partition of a tensor.

use runtime::RuntimeConfig;
use staging::StagingCapacity;
use tensor_core::DType;
use tiling_planner::{workspace_size, TilingPlanner, TilingRecord};

pub fn execute(
    mut config: RuntimeConfig,
    elements: i64,
    units: Option<usize>,
    capacity: Option<String>,
    policy: Option<String>,
    dtype: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(units) = units {
        config.unit_count = units;
    }
    if let Some(capacity) = capacity {
        config.buffer_capacity = StagingCapacity::parse(&capacity)
            .map_err(|e| anyhow::anyhow!("invalid capacity '{capacity}': {e}"))?;
    }
    if let Some(policy) = policy {
        config.split_policy = policy;
    }
    config.validate()?;

    let mut planner = TilingPlanner::for_profile(&config.hardware_profile()?)
        .with_policy(config.create_policy()?)
        .with_min_elements_per_unit(config.min_elements_per_unit)
        .with_queue_depth(config.queue_depth);
    if let Some(dtype) = dtype {
        planner = planner.with_dtype(DType::parse(&dtype)?);
    }

    let plan = planner.plan(elements)?;
    let record = TilingRecord::from_plan(&plan)?;

    if json {
        let doc = serde_json::json!({
            "plan": plan,
            "record": record,
            "workspace_bytes": workspace_size(&plan),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    super::banner("Tiling Plan");
    println!("  {}", plan.summary());
    println!();

    // ── Per-Unit Detail ────────────────────────────────────────
    println!(
        "  {:<6} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "Unit", "Offset", "Elements", "Tiles", "Tile", "Tail",
    );
    println!("  {}", "-".repeat(56));
    for unit in &plan.units {
        println!(
            "  {:<6} {:>10} {:>10} {:>8} {:>8} {:>8}",
            unit.unit_index,
            unit.element_offset,
            unit.element_count,
            unit.tile_count,
            unit.tile_size,
            unit.tail_tile_size,
        );
    }
    println!();

    // ── Record ─────────────────────────────────────────────────
    println!("  Record ({} bytes):", TilingRecord::SIZE);
    println!(
        "   units [0, {}): {} elements each",
        record.cutover, record.leading.element_count
    );
    if record.cutover < record.active_units {
        println!(
            "   units [{}, {}): {} elements each",
            record.cutover, record.active_units, record.trailing.element_count
        );
    }
    println!("   workspace: {} bytes", workspace_size(&plan));
    println!();
    Ok(())
}
