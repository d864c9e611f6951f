// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-size tiling record handed to the device.
//!
//! Every split policy produces at most two classes of units, so a plan
//! packs into two unit classes and a cutover index:
//!
//! ```text
//! units [0, cutover)             → leading
//! units [cutover, active_units)  → trailing
//! ```
//!
//! The device reads the record verbatim and derives each unit's offset
//! from it; it never re-runs the planner.
//!
//! Wire layout (little-endian, [`TilingRecord::SIZE`] bytes):
//!
//! ```text
//! 0   u32 active_units
//! 4   u32 cutover
//! 8   u64 × 4 leading  {element_count, tile_size, tile_count, tail_tile_size}
//! 40  u64 × 4 trailing {element_count, tile_size, tile_count, tail_tile_size}
//! ```

use crate::{PlannerError, TilingPlan, UnitPlan};

/// Shape of every unit in one class.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnitClass {
    pub element_count: u64,
    pub tile_size: u64,
    pub tile_count: u64,
    pub tail_tile_size: u64,
}

impl UnitClass {
    fn of(unit: &UnitPlan) -> Self {
        Self {
            element_count: unit.element_count as u64,
            tile_size: unit.tile_size as u64,
            tile_count: unit.tile_count as u64,
            tail_tile_size: unit.tail_tile_size as u64,
        }
    }

    fn write(&self, out: &mut [u8]) {
        let fields = [
            self.element_count,
            self.tile_size,
            self.tile_count,
            self.tail_tile_size,
        ];
        for (chunk, value) in out.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
    }

    fn validate(&self, class: &str) -> Result<(), PlannerError> {
        let bad = |detail: String| {
            Err(PlannerError::MalformedRecord(format!("{class} class: {detail}")))
        };
        if self.element_count == 0 || self.tile_count == 0 {
            return bad(format!(
                "{} elements in {} tiles",
                self.element_count, self.tile_count
            ));
        }
        if self.tail_tile_size == 0 || self.tail_tile_size > self.tile_size {
            return bad(format!(
                "tail tile {} with tile size {}",
                self.tail_tile_size, self.tile_size
            ));
        }
        let covered = (self.tile_count - 1)
            .checked_mul(self.tile_size)
            .and_then(|full| full.checked_add(self.tail_tile_size));
        if covered != Some(self.element_count) {
            return bad(format!(
                "{} tiles of {} (tail {}) do not cover {} elements",
                self.tile_count, self.tile_size, self.tail_tile_size, self.element_count
            ));
        }
        Ok(())
    }

    fn read(bytes: &[u8]) -> Self {
        let mut fields = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]));
        let mut next = || fields.next().unwrap_or(0);
        Self {
            element_count: next(),
            tile_size: next(),
            tile_count: next(),
            tail_tile_size: next(),
        }
    }
}

/// Host-produced, device-consumed tiling parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TilingRecord {
    pub active_units: u32,
    pub cutover: u32,
    pub leading: UnitClass,
    pub trailing: UnitClass,
}

impl TilingRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8 + 2 * 32;

    /// Packs a validated plan into a record.
    pub fn from_plan(plan: &TilingPlan) -> Result<Self, PlannerError> {
        let Some(first) = plan.units.first() else {
            return Ok(Self::default());
        };
        let leading = UnitClass::of(first);
        let cutover = plan
            .units
            .iter()
            .take_while(|u| UnitClass::of(u) == leading)
            .count();
        let trailing = plan
            .units
            .get(cutover)
            .map(UnitClass::of)
            .unwrap_or_default();

        if let Some(odd) = plan.units[cutover..]
            .iter()
            .find(|u| UnitClass::of(u) != trailing)
        {
            return Err(PlannerError::UnrepresentableRecord(format!(
                "unit {} has {} elements, expected {} (policy '{}')",
                odd.unit_index, odd.element_count, trailing.element_count, plan.policy_name,
            )));
        }

        let active_units = u32::try_from(plan.active_units()).map_err(|_| {
            PlannerError::UnrepresentableRecord(format!(
                "{} active units do not fit in u32",
                plan.active_units()
            ))
        })?;

        Ok(Self {
            active_units,
            // cutover <= active_units, so this cannot truncate.
            cutover: cutover as u32,
            leading,
            trailing,
        })
    }

    /// Derives the plan of active unit `index` from the record alone.
    pub fn unit(&self, index: usize) -> Option<UnitPlan> {
        if index >= self.active_units as usize {
            return None;
        }
        let cutover = self.cutover as usize;
        let (class, offset) = if index < cutover {
            (&self.leading, index * self.leading.element_count as usize)
        } else {
            (
                &self.trailing,
                cutover * self.leading.element_count as usize
                    + (index - cutover) * self.trailing.element_count as usize,
            )
        };
        Some(UnitPlan {
            unit_index: index,
            element_offset: offset,
            element_count: class.element_count as usize,
            tile_size: class.tile_size as usize,
            tile_count: class.tile_count as usize,
            tail_tile_size: class.tail_tile_size as usize,
        })
    }

    /// Iterates every active unit's plan.
    pub fn units(&self) -> impl Iterator<Item = UnitPlan> + '_ {
        (0..self.active_units as usize).filter_map(move |i| self.unit(i))
    }

    /// Largest tile any active unit stages.
    pub fn max_tile_size(&self) -> usize {
        let leading = if self.cutover > 0 { self.leading.tile_size } else { 0 };
        let trailing = if self.active_units > self.cutover {
            self.trailing.tile_size
        } else {
            0
        };
        usize::try_from(leading.max(trailing)).unwrap_or(usize::MAX)
    }

    /// Total elements covered by the record.
    ///
    /// Saturates on records that [`validate`](Self::validate) would reject.
    pub fn total_elements(&self) -> usize {
        self.checked_total().unwrap_or(usize::MAX)
    }

    fn checked_total(&self) -> Option<usize> {
        let cutover = self.cutover.min(self.active_units) as usize;
        let trailing_units = (self.active_units as usize) - cutover;
        let leading = cutover.checked_mul(usize::try_from(self.leading.element_count).ok()?)?;
        let trailing =
            trailing_units.checked_mul(usize::try_from(self.trailing.element_count).ok()?)?;
        leading.checked_add(trailing)
    }

    /// Checks that every class in use tiles its elements exactly.
    ///
    /// A class is in use when at least one active unit reads it. Each such
    /// class needs a non-empty range, `tile_size >= tail_tile_size > 0`
    /// and `(tile_count - 1) * tile_size + tail_tile_size == element_count`.
    /// The covered total must fit in `usize`.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.cutover > self.active_units {
            return Err(PlannerError::MalformedRecord(format!(
                "cutover {} beyond {} active units",
                self.cutover, self.active_units
            )));
        }
        if self.cutover > 0 {
            self.leading.validate("leading")?;
        }
        if self.active_units > self.cutover {
            self.trailing.validate("trailing")?;
        }
        self.checked_total().map(|_| ()).ok_or_else(|| {
            PlannerError::MalformedRecord("covered element count overflows".into())
        })
    }

    /// Encodes the record into its fixed little-endian layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.active_units.to_le_bytes());
        out[4..8].copy_from_slice(&self.cutover.to_le_bytes());
        self.leading.write(&mut out[8..40]);
        self.trailing.write(&mut out[40..72]);
        out
    }

    /// Decodes a record, rejecting short buffers and records that fail
    /// [`validate`](Self::validate).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlannerError> {
        if bytes.len() != Self::SIZE {
            return Err(PlannerError::MalformedRecord(format!(
                "expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        let record = Self {
            active_units: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            cutover: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            leading: UnitClass::read(&bytes[8..40]),
            trailing: UnitClass::read(&bytes[40..72]),
        };
        record.validate()?;
        Ok(record)
    }
}
