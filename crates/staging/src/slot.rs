// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Staging slot: the unit of ownership that moves between pipeline stages.
//!
//! A [`StagingSlot`] is moved by value from the stage that filled it to the
//! stage that consumes it. Only the stage holding the slot can touch its
//! buffers, so no two stages ever alias a tile.
//!
//! A slot handed back with [`StagingQueue::release`] returns to the free
//! list. A slot that is simply dropped is returned as well, but counted as
//! leaked so [`StagingQueue::ensure_drained`] can report it.
//!
//! [`StagingQueue::release`]: crate::StagingQueue::release
//! [`StagingQueue::ensure_drained`]: crate::StagingQueue::ensure_drained

use crate::queue::QueueInner;
use crate::StagingError;
use std::fmt;
use std::sync::Arc;
use tensor_core::Element;

/// Lifecycle state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SlotState {
    /// On the free list.
    Free,
    /// Enqueued, waiting for the consumer.
    Filled,
    /// Held by a pipeline stage.
    InUse,
}

/// One fixed-capacity staging buffer with one lane per staged stream.
pub struct StagingSlot<T: Element> {
    /// Lane buffers. `None` once the slot has been released or enqueued.
    lanes: Option<Vec<Vec<T>>>,
    /// Valid elements in every lane.
    len: usize,
    state: SlotState,
    queue: Arc<QueueInner<T>>,
}

impl<T: Element> StagingSlot<T> {
    pub(crate) fn new(lanes: Vec<Vec<T>>, len: usize, queue: Arc<QueueInner<T>>) -> Self {
        Self {
            lanes: Some(lanes),
            len,
            state: SlotState::InUse,
            queue,
        }
    }

    /// Takes the buffers out, leaving the slot inert for `Drop`.
    pub(crate) fn take(&mut self, state: SlotState) -> (Vec<Vec<T>>, usize) {
        self.state = state;
        (self.lanes.take().unwrap_or_default(), self.len)
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Valid elements per lane.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum elements per lane.
    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }

    pub fn lane_count(&self) -> usize {
        self.queue.lanes
    }

    /// Sets the number of valid elements in every lane.
    pub fn set_len(&mut self, len: usize) -> Result<(), StagingError> {
        if len > self.capacity() {
            self.queue.note_overflow();
            return Err(StagingError::BufferOverflow {
                requested: len,
                capacity: self.capacity(),
            });
        }
        self.len = len;
        Ok(())
    }

    /// Copies `data` into `lane` and sets the slot length to match.
    ///
    /// Fails with [`StagingError::BufferOverflow`] if `data` is longer than
    /// the slot capacity.
    pub fn fill(&mut self, lane: usize, data: &[T]) -> Result<(), StagingError> {
        if lane >= self.lane_count() {
            return Err(StagingError::InvalidLane {
                lane,
                lanes: self.lane_count(),
            });
        }
        self.set_len(data.len())?;
        self.lane_mut(lane)?.copy_from_slice(data);
        Ok(())
    }

    /// The valid elements of `lane`.
    pub fn lane(&self, lane: usize) -> Result<&[T], StagingError> {
        let lanes = self.queue.lanes;
        self.lanes
            .as_ref()
            .and_then(|l| l.get(lane))
            .map(|buf| &buf[..self.len])
            .ok_or(StagingError::InvalidLane { lane, lanes })
    }

    /// The valid elements of `lane`, mutably.
    pub fn lane_mut(&mut self, lane: usize) -> Result<&mut [T], StagingError> {
        let lanes = self.queue.lanes;
        let len = self.len;
        self.lanes
            .as_mut()
            .and_then(|l| l.get_mut(lane))
            .map(|buf| &mut buf[..len])
            .ok_or(StagingError::InvalidLane { lane, lanes })
    }

    /// Every lane's valid elements, in lane order.
    pub fn lane_slices(&self) -> Vec<&[T]> {
        self.lanes
            .iter()
            .flatten()
            .map(|buf| &buf[..self.len])
            .collect()
    }
}

impl<T: Element> Drop for StagingSlot<T> {
    fn drop(&mut self) {
        if let Some(lanes) = self.lanes.take() {
            self.queue.reclaim(lanes, true);
        }
    }
}

impl<T: Element> fmt::Debug for StagingSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingSlot")
            .field("state", &self.state)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("lanes", &self.lane_count())
            .finish()
    }
}
