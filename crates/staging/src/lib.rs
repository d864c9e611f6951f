// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # staging
//!
//! Bounded staging queues that let a kernel pipeline overlap data movement
//! with compute on a unit's local buffers.
//!
//! # Key Components
//!
//! - [`StagingQueue`]: a ring of `depth` slots with async `acquire` /
//!   `dequeue` and synchronous `enqueue` / `release`.
//! - [`StagingSlot`]: one slot, moved by value between stages. Dropping it
//!   without `release` returns it but records a leak.
//! - [`QueueStats`]: slot traffic counters and the leak check.
//! - [`StagingCapacity`]: per-slot element count with `"16K"` parsing.
//!
//! # Ownership Model
//!
//! ```text
//! StagingQueue::acquire()
//!       │
//!       ▼
//!   StagingSlot  ◄─── owns lane buffers, holds Arc<QueueInner>
//!       │
//!       │  release() / drop()
//!       ▼
//!   QueueInner::reclaim()  ──► free list, one permit back
//! ```

mod capacity;
mod error;
pub mod queue;
mod slot;
mod stats;

pub use capacity::StagingCapacity;
pub use error::StagingError;
pub use queue::StagingQueue;
pub use slot::{SlotState, StagingSlot};
pub use stats::QueueStats;
