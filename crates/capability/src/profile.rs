// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The active hardware profile.

use crate::CapabilityError;
use std::fmt;

/// Well-known revision ids of the representative capability table.
pub mod revision {
    /// First-generation core array.
    pub const GEN1: u32 = 100;
    /// Second-generation core array.
    pub const GEN2: u32 = 200;
    /// Second-generation refresh; shares its capability row with [`GEN2`].
    pub const GEN2_REFRESH: u32 = 201;
    /// Third-generation core array.
    pub const GEN3: u32 = 300;
}

/// Describes the accelerator an invocation will run on.
///
/// Built once at startup (usually from `RuntimeConfig`) and passed
/// explicitly to every dispatch and planning call; nothing reads it from
/// global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HardwareProfile {
    /// Hardware revision id; selects a capability-table row.
    revision: u32,
    /// Number of parallel execution units available to one invocation.
    unit_count: usize,
    /// Per-unit staging buffer capacity, in elements.
    buffer_capacity: usize,
}

impl HardwareProfile {
    /// Creates a profile, rejecting zero units or zero capacity.
    pub fn new(
        revision: u32,
        unit_count: usize,
        buffer_capacity: usize,
    ) -> Result<Self, CapabilityError> {
        if unit_count == 0 {
            return Err(CapabilityError::InvalidProfile(
                "unit_count must be at least 1".into(),
            ));
        }
        if buffer_capacity == 0 {
            return Err(CapabilityError::InvalidProfile(
                "buffer_capacity must be at least 1 element".into(),
            ));
        }
        Ok(Self {
            revision,
            unit_count,
            buffer_capacity,
        })
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

impl Default for HardwareProfile {
    /// A second-generation part with 8 units and 16K-element staging buffers.
    fn default() -> Self {
        Self {
            revision: revision::GEN2,
            unit_count: 8,
            buffer_capacity: 16 * 1024,
        }
    }
}

impl fmt::Display for HardwareProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rev {} ({} units, {} elem staging)",
            self.revision, self.unit_count, self.buffer_capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates() {
        assert!(HardwareProfile::new(revision::GEN1, 0, 16).is_err());
        assert!(HardwareProfile::new(revision::GEN1, 4, 0).is_err());
        let p = HardwareProfile::new(revision::GEN1, 4, 16).unwrap();
        assert_eq!(p.unit_count(), 4);
        assert_eq!(p.buffer_capacity(), 16);
    }

    #[test]
    fn test_display() {
        let p = HardwareProfile::default();
        assert_eq!(format!("{p}"), "rev 200 (8 units, 16384 elem staging)");
    }

    #[test]
    fn test_json_roundtrip() {
        let p = HardwareProfile::new(revision::GEN3, 48, 4096).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"unit_count\":48"));
        let back: HardwareProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
