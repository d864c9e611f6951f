// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the tiling planner.

/// Errors that can occur while planning or decoding a tiling.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The partition request is nonsensical (negative size, no units, no capacity).
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// A plan failed its coverage or tile invariants.
    #[error("plan from policy '{policy}' is inconsistent: {detail}")]
    InconsistentPlan { policy: String, detail: String },

    /// The plan has more than two unit classes and cannot be packed into a record.
    #[error("plan cannot be encoded as a tiling record: {0}")]
    UnrepresentableRecord(String),

    /// A serialized tiling record is truncated or corrupt.
    #[error("malformed tiling record: {0}")]
    MalformedRecord(String),

    /// A split policy name was not recognised.
    #[error("unknown split policy '{0}'; expected 'remainder-first', 'remainder-last' or 'distinct-tail'")]
    UnknownPolicy(String),
}
