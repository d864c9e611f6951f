// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scratch workspace sizing.

use crate::TilingPlan;

/// Returns the scratch bytes an invocation of `plan` needs.
///
/// Each active unit holds an input queue (one lane per source operand)
/// and an output queue, both `queue_depth` slots of the largest tile.
/// See [`staging_bytes`].
///
/// The result must be allocated and passed to the device before launch.
pub fn workspace_size(plan: &TilingPlan) -> usize {
    staging_bytes(
        plan.active_units(),
        plan.queue_depth,
        plan.input_streams,
        plan.max_tile_size(),
        plan.element_bytes,
    )
}

/// Scratch bytes for `active_units` units staging `input_streams` operands:
///
/// ```text
/// active_units × queue_depth × (input_streams + 1) × max_tile_size × element_bytes
/// ```
///
/// Saturates at `usize::MAX`, which no workspace can satisfy.
pub fn staging_bytes(
    active_units: usize,
    queue_depth: usize,
    input_streams: usize,
    max_tile_size: usize,
    element_bytes: usize,
) -> usize {
    [queue_depth, input_streams + 1, max_tile_size, element_bytes]
        .into_iter()
        .fold(active_units, usize::saturating_mul)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TilingPlanner;
    use tensor_core::DType;

    #[test]
    fn test_scenario_b_workspace() {
        let plan = TilingPlanner::new(4, 8)
            .with_dtype(DType::I8)
            .with_input_streams(2)
            .plan(40)
            .unwrap();
        // 4 units × 2 slots × (2 in + 1 out) × 8 elements × 1 byte
        assert_eq!(workspace_size(&plan), 4 * 2 * 3 * 8);
    }

    #[test]
    fn test_staging_bytes_saturates() {
        assert_eq!(staging_bytes(4, 2, 2, 8, 1), 4 * 2 * 3 * 8);
        assert_eq!(staging_bytes(usize::MAX, 2, 1, 16, 4), usize::MAX);
        assert_eq!(staging_bytes(0, 2, 1, 16, 4), 0);
    }

    #[test]
    fn test_empty_plan_needs_no_workspace() {
        let plan = TilingPlanner::new(8, 16).plan(0).unwrap();
        assert_eq!(workspace_size(&plan), 0);
    }

    #[test]
    fn test_single_buffering_halves_workspace() {
        let double = TilingPlanner::new(2, 64).with_dtype(DType::F32);
        let single = double.clone().with_queue_depth(1);
        let a = workspace_size(&double.plan(1000).unwrap());
        let b = workspace_size(&single.plan(1000).unwrap());
        assert_eq!(a, 2 * b);
    }
}
