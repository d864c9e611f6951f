// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Remainder-first split: the default.
//!
//! ```text
//! base = total / units        remainder = total % units
//! units [0, remainder)      → base + 1   ("big" units)
//! units [remainder, units)  → base       ("small" units)
//! ```

use super::SplitPolicy;

/// Gives the leftover elements to the leading units.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemainderFirst;

impl SplitPolicy for RemainderFirst {
    fn name(&self) -> &str {
        "remainder-first"
    }

    fn split(&self, total_elements: usize, unit_count: usize) -> Vec<usize> {
        let base = total_elements / unit_count;
        let remainder = total_elements % unit_count;
        (0..unit_count)
            .map(|unit| if unit < remainder { base + 1 } else { base })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_over_eight() {
        let split = RemainderFirst.split(100, 8);
        assert_eq!(split, vec![13, 13, 13, 13, 12, 12, 12, 12]);
    }

    #[test]
    fn test_fewer_elements_than_units() {
        let split = RemainderFirst.split(3, 8);
        assert_eq!(split, vec![1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_even_split() {
        assert_eq!(RemainderFirst.split(40, 4), vec![10; 4]);
    }
}
