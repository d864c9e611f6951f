// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for staging queues.

/// Errors raised while moving tiles through a staging queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    /// A tile does not fit in a slot.
    #[error("buffer overflow: tile of {requested} elements exceeds slot capacity {capacity}")]
    BufferOverflow { requested: usize, capacity: usize },

    /// Slots were not returned with `release`.
    #[error("slot leak: {outstanding} slot(s) outstanding, {leaked} dropped without release")]
    SlotLeak { outstanding: u64, leaked: u64 },

    /// Lane index out of range for this queue.
    #[error("lane {lane} out of range (queue has {lanes} lane(s))")]
    InvalidLane { lane: usize, lanes: usize },

    /// A capacity string could not be parsed.
    #[error("invalid staging capacity: {0}")]
    InvalidCapacity(String),

    /// Queue geometry with a zero dimension.
    #[error("invalid queue geometry: depth {depth}, capacity {capacity}, lanes {lanes}")]
    InvalidGeometry {
        depth: usize,
        capacity: usize,
        lanes: usize,
    },

    /// The queue's hand-off channel closed underneath a waiting stage.
    #[error("staging queue closed")]
    Closed,
}
