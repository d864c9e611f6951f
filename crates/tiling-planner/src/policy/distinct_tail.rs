// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Distinct-tail-unit split.
//!
//! Every unit is sized for `ceil(total / units)` elements; the last unit
//! that still has work takes whatever is left. Units past it stay idle.
//!
//! ```text
//! total = 10, units = 4  →  per = 3  →  [3, 3, 3, 1]
//! total =  9, units = 4  →  per = 3  →  [3, 3, 3, 0]
//! ```

use super::SplitPolicy;

/// Equal leading units plus one shorter tail unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctTailUnit;

impl SplitPolicy for DistinctTailUnit {
    fn name(&self) -> &str {
        "distinct-tail"
    }

    fn split(&self, total_elements: usize, unit_count: usize) -> Vec<usize> {
        let mut split = vec![0; unit_count];
        if total_elements == 0 {
            return split;
        }
        let per_unit = total_elements.div_ceil(unit_count);
        let mut left = total_elements;
        for slot in split.iter_mut() {
            let take = per_unit.min(left);
            *slot = take;
            left -= take;
        }
        split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_unit() {
        assert_eq!(DistinctTailUnit.split(10, 4), vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_idle_units_after_tail() {
        assert_eq!(DistinctTailUnit.split(9, 4), vec![3, 3, 3, 0]);
        assert_eq!(DistinctTailUnit.split(5, 4), vec![2, 2, 1, 0]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(DistinctTailUnit.split(0, 3), vec![0, 0, 0]);
    }
}
