// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SplitPolicy`] trait and the remainder-distribution policies.
//!
//! | Policy | Extra elements go to | Record classes |
//! |---|---|---|
//! | [`RemainderFirst`] | the first `total % units` units | big, then small |
//! | [`RemainderLast`] | the last `total % units` units | small, then big |
//! | [`DistinctTailUnit`] | nobody: all units get `ceil(total / units)` and the last takes what is left | full, then tail |

mod distinct_tail;
mod remainder_first;
mod remainder_last;

pub use distinct_tail::DistinctTailUnit;
pub use remainder_first::RemainderFirst;
pub use remainder_last::RemainderLast;

use crate::PlannerError;

/// Decides how many elements each execution unit receives.
///
/// Policies are pure arithmetic, no I/O or global state, so the same
/// inputs always produce the same split.
pub trait SplitPolicy: Send + Sync + std::fmt::Debug {
    /// Stable name of this policy, used in configs and plan summaries.
    fn name(&self) -> &str;

    /// Returns one element count per unit, in unit order.
    ///
    /// The result has exactly `unit_count` entries summing to
    /// `total_elements`; zero entries mark inactive units. `unit_count`
    /// is always > 0.
    fn split(&self, total_elements: usize, unit_count: usize) -> Vec<usize>;
}

/// Creates a policy from its config name.
pub fn policy_by_name(name: &str) -> Result<Box<dyn SplitPolicy>, PlannerError> {
    match name.to_lowercase().as_str() {
        "remainder-first" | "first" => Ok(Box::new(RemainderFirst)),
        "remainder-last" | "last" => Ok(Box::new(RemainderLast)),
        "distinct-tail" | "tail" => Ok(Box::new(DistinctTailUnit)),
        _ => Err(PlannerError::UnknownPolicy(name.to_string())),
    }
}
