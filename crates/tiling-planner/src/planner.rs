// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The tiling planner.
//!
//! Two levels of partitioning:
//!
//! ```text
//! [0, total)
//!   ├─ unit 0 [0, n0)        ── tile 0 | tile 1 | ... | tail
//!   ├─ unit 1 [n0, n0+n1)    ── tile 0 | ... | tail
//!   └─ ...
//! ```
//!
//! Units come from the [`SplitPolicy`]; tiles are `buffer_capacity`
//! elements each, with the last tile absorbing the remainder.

use crate::plan::PlanBuilder;
use crate::policy::{RemainderFirst, SplitPolicy};
use crate::{PlannerError, TilingPlan};
use capability::HardwareProfile;
use std::sync::Arc;
use tensor_core::DType;

/// Bytes per on-chip data block; staging tiles are aligned to this.
pub const BLOCK_BYTES: usize = 32;

/// Default staging queue depth (double buffering).
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

/// Computes [`TilingPlan`]s for a fixed unit count and buffer capacity.
///
/// The planner holds no mutable state: identical inputs always produce
/// identical plans.
///
/// # Example
/// ```
/// use tiling_planner::TilingPlanner;
///
/// let plan = TilingPlanner::new(4, 8).plan(40).unwrap();
/// assert_eq!(plan.active_units(), 4);
/// assert_eq!(plan.units[0].tile_count, 2);
/// assert_eq!(plan.units[0].tail_tile_size, 2);
/// ```
#[derive(Debug, Clone)]
pub struct TilingPlanner {
    unit_count: usize,
    buffer_capacity: usize,
    policy: Arc<dyn SplitPolicy>,
    min_elements_per_unit: usize,
    element_bytes: usize,
    input_streams: usize,
    queue_depth: usize,
}

impl TilingPlanner {
    /// Creates a remainder-first planner for `unit_count` units with
    /// `buffer_capacity`-element staging buffers.
    pub fn new(unit_count: usize, buffer_capacity: usize) -> Self {
        Self {
            unit_count,
            buffer_capacity,
            policy: Arc::new(RemainderFirst),
            min_elements_per_unit: 1,
            element_bytes: 1,
            input_streams: 1,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }

    /// Creates a planner sized for `profile`.
    pub fn for_profile(profile: &HardwareProfile) -> Self {
        Self::new(profile.unit_count(), profile.buffer_capacity())
    }

    /// Uses a different remainder-distribution policy.
    pub fn with_policy(mut self, policy: Arc<dyn SplitPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Keeps at least `min` elements on each active unit (when there are
    /// enough elements), so small tensors occupy fewer units.
    pub fn with_min_elements_per_unit(mut self, min: usize) -> Self {
        self.min_elements_per_unit = min.max(1);
        self
    }

    /// Sizes staging for `dtype`: records the element size and aligns the
    /// buffer capacity down to whole data blocks.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.element_bytes = dtype.size_bytes();
        self.buffer_capacity = aligned_capacity(self.buffer_capacity, dtype);
        self
    }

    /// Number of source operands staged per tile.
    pub fn with_input_streams(mut self, streams: usize) -> Self {
        self.input_streams = streams.max(1);
        self
    }

    /// Staging queue depth; 1 disables double buffering.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn policy(&self) -> &dyn SplitPolicy {
        self.policy.as_ref()
    }

    /// Partitions `total_elements` across units and tiles.
    ///
    /// Fails with [`PlannerError::InvalidPartition`] when `total_elements`
    /// is negative, or the planner has zero units or zero capacity.
    pub fn plan(&self, total_elements: i64) -> Result<TilingPlan, PlannerError> {
        let total = usize::try_from(total_elements).map_err(|_| {
            PlannerError::InvalidPartition(format!(
                "total element count must be non-negative, got {total_elements}"
            ))
        })?;
        if self.unit_count == 0 {
            return Err(PlannerError::InvalidPartition(
                "unit count must be at least 1".into(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(PlannerError::InvalidPartition(
                "buffer capacity must be at least 1 element".into(),
            ));
        }

        let effective_units = self.effective_units(total);
        let split = self.policy.split(total, effective_units);

        let mut builder = PlanBuilder::new(
            self.policy.name(),
            total,
            self.unit_count,
            self.buffer_capacity,
        )
        .staging(self.element_bytes, self.input_streams, self.queue_depth);
        for count in split {
            builder.add_unit(count);
        }

        let plan = builder.build();
        plan.validate()?;
        tracing::debug!("{}", plan.summary());
        Ok(plan)
    }

    /// Units actually offered to the split policy.
    fn effective_units(&self, total: usize) -> usize {
        let wanted = total.div_ceil(self.min_elements_per_unit).max(1);
        wanted.min(self.unit_count)
    }
}

/// Rounds `capacity` down to whole [`BLOCK_BYTES`] blocks of `dtype`.
///
/// Capacities smaller than one block are returned unchanged.
pub fn aligned_capacity(capacity: usize, dtype: DType) -> usize {
    let per_block = (BLOCK_BYTES / dtype.size_bytes()).max(1);
    if capacity < per_block {
        capacity
    } else {
        capacity - capacity % per_block
    }
}
