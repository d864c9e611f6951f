// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tiling-planner
//!
//! Splits an invocation's elements across the accelerator's execution
//! units, then each unit's range into staging-buffer-sized tiles.
//!
//! # Policies
//!
//! | Policy | Who gets the leftover elements |
//! |---|---|
//! | [`RemainderFirst`] (default) | leading units |
//! | [`RemainderLast`] | trailing units |
//! | [`DistinctTailUnit`] | nobody; the last active unit is short |
//!
//! The policy is per-operator configuration: an operator ported from a
//! kernel that splits remainder-last keeps doing so.
//!
//! # Outputs
//!
//! - [`TilingPlan`]: per-unit ranges and tile geometry, validated.
//! - [`TilingRecord`]: the fixed-size form the device consumes.
//! - [`workspace_size`]: scratch bytes to allocate before launch.
//!
//! # Example
//! ```
//! use tiling_planner::{TilingPlanner, TilingRecord, workspace_size};
//!
//! let plan = TilingPlanner::new(8, 16).plan(100).unwrap();
//! assert_eq!(plan.units[0].element_count, 13);
//! assert_eq!(plan.units[7].element_count, 12);
//!
//! let record = TilingRecord::from_plan(&plan).unwrap();
//! assert_eq!(record.unit(5), plan.unit(5).copied());
//! assert!(workspace_size(&plan) > 0);
//! ```

mod error;
pub(crate) mod plan;
mod planner;
pub mod policy;
mod record;
mod workspace;

pub use error::PlannerError;
pub use plan::{TileSpan, TilingPlan, UnitPlan};
pub use planner::{aligned_capacity, TilingPlanner, BLOCK_BYTES, DEFAULT_QUEUE_DEPTH};
pub use policy::{policy_by_name, DistinctTailUnit, RemainderFirst, RemainderLast, SplitPolicy};
pub use record::{TilingRecord, UnitClass};
pub use workspace::{staging_bytes, workspace_size};
