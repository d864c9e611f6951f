// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Remainder-last split.
//!
//! Mirror image of [`super::RemainderFirst`]: the trailing
//! `total % units` units take one extra element each.

use super::SplitPolicy;

/// Gives the leftover elements to the trailing units.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemainderLast;

impl SplitPolicy for RemainderLast {
    fn name(&self) -> &str {
        "remainder-last"
    }

    fn split(&self, total_elements: usize, unit_count: usize) -> Vec<usize> {
        let base = total_elements / unit_count;
        let remainder = total_elements % unit_count;
        let cutover = unit_count - remainder;
        (0..unit_count)
            .map(|unit| if unit < cutover { base } else { base + 1 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_over_eight() {
        let split = RemainderLast.split(100, 8);
        assert_eq!(split, vec![12, 12, 12, 12, 13, 13, 13, 13]);
    }

    #[test]
    fn test_fewer_elements_than_units() {
        // Inactive units lead; the planner drops them and renumbers the rest.
        assert_eq!(RemainderLast.split(2, 4), vec![0, 0, 1, 1]);
    }
}
