// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tile-rt table` command: print the capability support table.

use capability::CapabilitySupportTable;
use tensor_core::DType;

pub fn execute() -> anyhow::Result<()> {
    super::banner("Capability Table");
    let table = CapabilitySupportTable::representative();

    print!("  {:<8} {:<14}", "Row", "Revisions");
    for dtype in DType::ALL {
        print!(" {:>5}", dtype.as_str());
    }
    println!();
    println!("  {}", "-".repeat(23 + 6 * DType::ALL.len()));

    for row in table.rows() {
        print!("  {:<8} {:<14}", row.name, row.revisions.to_string());
        for dtype in DType::ALL {
            let mark = if row.supported.contains(dtype) { "x" } else { "." };
            print!(" {mark:>5}");
        }
        println!();
    }
    println!();
    Ok(())
}
