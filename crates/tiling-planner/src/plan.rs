// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tiling plan: the output of the planner.
//!
//! A plan lists the active execution units. Each unit owns a contiguous
//! element range and walks it in tiles no larger than its staging buffer.
//! The plan is the contract between the host-side planner and the
//! per-unit kernel pipeline.

use crate::PlannerError;

/// One tile of a unit's range, in absolute element coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    /// Position of the tile within its unit.
    pub index: usize,
    /// Absolute offset of the first element.
    pub offset: usize,
    /// Number of elements in the tile.
    pub len: usize,
}

impl TileSpan {
    /// One past the last element of the tile.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// The share of work given to a single active execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnitPlan {
    /// Index of this unit among the active units.
    pub unit_index: usize,
    /// First element owned by this unit.
    pub element_offset: usize,
    /// Number of elements owned by this unit (always > 0).
    pub element_count: usize,
    /// Size of every tile except possibly the last.
    pub tile_size: usize,
    /// Number of tiles.
    pub tile_count: usize,
    /// Size of the last tile.
    pub tail_tile_size: usize,
}

impl UnitPlan {
    /// Tiles a range of `element_count` elements with buffers of `capacity`.
    pub(crate) fn tile(
        unit_index: usize,
        element_offset: usize,
        element_count: usize,
        capacity: usize,
    ) -> Self {
        let tile_size = capacity.min(element_count);
        let tile_count = element_count.div_ceil(capacity);
        let tail_tile_size = element_count - (tile_count - 1) * capacity;
        Self {
            unit_index,
            element_offset,
            element_count,
            tile_size,
            tile_count,
            tail_tile_size,
        }
    }

    /// One past the last element owned by this unit.
    pub fn element_end(&self) -> usize {
        self.element_offset + self.element_count
    }

    /// Iterates the unit's tiles in increasing-offset order.
    pub fn tiles(&self) -> impl Iterator<Item = TileSpan> + '_ {
        (0..self.tile_count).map(move |index| {
            let len = if index + 1 == self.tile_count {
                self.tail_tile_size
            } else {
                self.tile_size
            };
            TileSpan {
                index,
                offset: self.element_offset + index * self.tile_size,
                len,
            }
        })
    }
}

/// The complete partition of one invocation.
///
/// Read-only once built. Invariants (checked by [`validate`](Self::validate)):
/// - unit ranges cover `[0, total_elements)` exactly, in order, without overlap;
/// - every unit's tiles sum to its element count;
/// - no tile exceeds `buffer_capacity`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TilingPlan {
    /// Split policy that produced this plan.
    pub policy_name: String,
    /// Elements to process.
    pub total_elements: usize,
    /// Units offered by the hardware profile (active units may be fewer).
    pub unit_count: usize,
    /// Per-unit staging capacity in elements.
    pub buffer_capacity: usize,
    /// Size of one element in bytes.
    pub element_bytes: usize,
    /// Number of source operands staged per tile.
    pub input_streams: usize,
    /// Staging queue depth (2 = double buffering).
    pub queue_depth: usize,
    /// Active units, in element order.
    pub units: Vec<UnitPlan>,
}

impl TilingPlan {
    /// Returns the number of units with work.
    pub fn active_units(&self) -> usize {
        self.units.len()
    }

    /// Returns the total number of tiles across all units.
    pub fn total_tiles(&self) -> usize {
        self.units.iter().map(|u| u.tile_count).sum()
    }

    /// Returns the largest tile any unit will stage.
    pub fn max_tile_size(&self) -> usize {
        self.units.iter().map(|u| u.tile_size).max().unwrap_or(0)
    }

    /// Returns the plan for active unit `index`.
    pub fn unit(&self, index: usize) -> Option<&UnitPlan> {
        self.units.get(index)
    }

    /// Validates the plan invariants.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::InconsistentPlan {
            policy: self.policy_name.clone(),
            detail,
        };

        if self.units.len() > self.unit_count {
            return Err(fail(format!(
                "{} active units but only {} available",
                self.units.len(),
                self.unit_count,
            )));
        }

        let mut expected_offset = 0;
        for (i, unit) in self.units.iter().enumerate() {
            if unit.unit_index != i {
                return Err(fail(format!(
                    "expected unit index {i}, got {}",
                    unit.unit_index
                )));
            }
            if unit.element_count == 0 {
                return Err(fail(format!("unit {i} is active but has no elements")));
            }
            if unit.element_offset != expected_offset {
                return Err(fail(format!(
                    "unit {i} starts at {} but previous unit ended at {expected_offset}",
                    unit.element_offset,
                )));
            }
            if unit.tile_size > self.buffer_capacity || unit.tail_tile_size > unit.tile_size {
                return Err(fail(format!(
                    "unit {i} tile {} / tail {} exceeds capacity {}",
                    unit.tile_size, unit.tail_tile_size, self.buffer_capacity,
                )));
            }
            let tiled: usize = unit.tiles().map(|t| t.len).sum();
            if tiled != unit.element_count || unit.tail_tile_size == 0 {
                return Err(fail(format!(
                    "unit {i} tiles cover {tiled} of {} elements",
                    unit.element_count
                )));
            }
            expected_offset = unit.element_end();
        }

        if expected_offset != self.total_elements {
            return Err(fail(format!(
                "units cover {expected_offset} of {} elements",
                self.total_elements
            )));
        }
        Ok(())
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let counts: Vec<usize> = self.units.iter().map(|u| u.element_count).collect();
        format!(
            "Plan '{}': {} elements on {}/{} units, {} tiles (capacity {}), unit sizes: {:?}",
            self.policy_name,
            self.total_elements,
            self.active_units(),
            self.unit_count,
            self.total_tiles(),
            self.buffer_capacity,
            counts,
        )
    }
}

/// Builder helper for constructing a `TilingPlan` unit by unit.
pub(crate) struct PlanBuilder {
    plan: TilingPlan,
    next_offset: usize,
}

impl PlanBuilder {
    pub fn new(policy_name: &str, total_elements: usize, unit_count: usize, buffer_capacity: usize) -> Self {
        Self {
            plan: TilingPlan {
                policy_name: policy_name.to_string(),
                total_elements,
                unit_count,
                buffer_capacity,
                element_bytes: 1,
                input_streams: 1,
                queue_depth: 2,
                units: Vec::new(),
            },
            next_offset: 0,
        }
    }

    pub fn staging(mut self, element_bytes: usize, input_streams: usize, queue_depth: usize) -> Self {
        self.plan.element_bytes = element_bytes;
        self.plan.input_streams = input_streams;
        self.plan.queue_depth = queue_depth;
        self
    }

    /// Appends a unit of `element_count` elements. Empty units are skipped.
    pub fn add_unit(&mut self, element_count: usize) {
        if element_count == 0 {
            return;
        }
        let unit = UnitPlan::tile(
            self.plan.units.len(),
            self.next_offset,
            element_count,
            self.plan.buffer_capacity,
        );
        self.next_offset += element_count;
        self.plan.units.push(unit);
    }

    pub fn build(self) -> TilingPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> TilingPlan {
        let mut b = PlanBuilder::new("test", 40, 4, 8);
        for _ in 0..4 {
            b.add_unit(10);
        }
        b.build()
    }

    #[test]
    fn test_validate_ok() {
        sample_plan().validate().unwrap();
    }

    #[test]
    fn test_unit_tiling() {
        let u = UnitPlan::tile(0, 0, 10, 8);
        assert_eq!(u.tile_size, 8);
        assert_eq!(u.tile_count, 2);
        assert_eq!(u.tail_tile_size, 2);

        let tiles: Vec<TileSpan> = u.tiles().collect();
        assert_eq!(tiles[0], TileSpan { index: 0, offset: 0, len: 8 });
        assert_eq!(tiles[1], TileSpan { index: 1, offset: 8, len: 2 });
        assert_eq!(tiles[1].end(), 10);
    }

    #[test]
    fn test_unit_smaller_than_capacity() {
        let u = UnitPlan::tile(3, 39, 13, 16);
        assert_eq!(u.tile_size, 13);
        assert_eq!(u.tile_count, 1);
        assert_eq!(u.tail_tile_size, 13);
        assert_eq!(u.element_end(), 52);
    }

    #[test]
    fn test_exact_multiple_has_full_tail() {
        let u = UnitPlan::tile(0, 0, 32, 8);
        assert_eq!(u.tile_count, 4);
        assert_eq!(u.tail_tile_size, 8);
    }

    #[test]
    fn test_builder_skips_empty_units() {
        let mut b = PlanBuilder::new("test", 2, 4, 8);
        b.add_unit(1);
        b.add_unit(1);
        b.add_unit(0);
        b.add_unit(0);
        let plan = b.build();
        assert_eq!(plan.active_units(), 2);
        assert_eq!(plan.units[1].element_offset, 1);
        plan.validate().unwrap();
    }

    #[test]
    fn test_validate_gap() {
        let mut plan = sample_plan();
        plan.units[2].element_offset += 1;
        assert!(matches!(plan.validate(), Err(PlannerError::InconsistentPlan { .. })));
    }

    #[test]
    fn test_validate_short_coverage() {
        let mut plan = sample_plan();
        plan.total_elements = 41;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_bad_unit_index() {
        let mut plan = sample_plan();
        plan.units[1].unit_index = 5;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_tile_over_capacity() {
        let mut plan = sample_plan();
        plan.buffer_capacity = 4;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_too_many_units() {
        let mut plan = sample_plan();
        plan.unit_count = 2;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let s = sample_plan().summary();
        assert!(s.contains("test"));
        assert!(s.contains("40 elements on 4/4 units"));
        assert!(s.contains("8 tiles"));
    }

    #[test]
    fn test_json_roundtrip() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"policy_name\":\"test\""));
        let back: TilingPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        back.validate().unwrap();
    }

    #[test]
    fn test_max_tile_size_empty_plan() {
        let plan = PlanBuilder::new("empty", 0, 4, 8).build();
        assert_eq!(plan.max_tile_size(), 0);
        assert_eq!(plan.total_tiles(), 0);
        plan.validate().unwrap();
    }
}
