// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt dispatch` command: report the execution path for operand dtypes.

use capability::{CapabilityDispatcher, CapabilitySupportTable, HardwareProfile};
use runtime::RuntimeConfig;
use tensor_core::{DType, TensorDescriptor};

pub fn execute(
    config: RuntimeConfig,
    dtypes: Vec<String>,
    revision: Option<u32>,
) -> anyhow::Result<()> {
    let dtypes = dtypes
        .iter()
        .map(|s| DType::parse(s))
        .collect::<Result<Vec<_>, _>>()?;
    let operands: Vec<TensorDescriptor> =
        dtypes.iter().map(|d| TensorDescriptor::flat(1, *d)).collect();

    let revision = revision.unwrap_or(config.revision);
    let profile = HardwareProfile::new(
        revision,
        config.unit_count,
        config.buffer_capacity.elements(),
    )?;
    let table = CapabilitySupportTable::representative();
    let dispatcher = CapabilityDispatcher::new(&table);

    let row = match table.lookup(revision) {
        Ok(row) => format!("{} {}", row.name, row.revisions),
        Err(_) => "none".to_string(),
    };
    let decision = dispatcher.decide_or_fallback(&operands, &profile)?;

    println!("  Revision:  {revision} (row: {row})");
    println!(
        "  Operands:  {}",
        dtypes.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!("  Decision:  {decision}");
    Ok(())
}
