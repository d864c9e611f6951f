// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-depth staging queue.
//!
//! A [`StagingQueue`] owns `depth` slots of `capacity` elements per lane
//! and moves them between a producer stage and a consumer stage:
//!
//! ```text
//!   acquire ──► StagingSlot (InUse) ──► enqueue ──► (Filled) ──► dequeue
//!      ▲                                                             │
//!      └──────────────── release (Free) ◄── StagingSlot (InUse) ◄───┘
//! ```
//!
//! With `depth = 2` the producer can fill tile `i + 1` while the consumer
//! still holds tile `i`. A third acquire suspends until a slot is
//! released; there is no polling.
//!
//! # Thread Safety
//! `StagingQueue` is `Send + Sync` and cheap to clone; clones share the
//! same slots, so producer and consumer futures each hold one.

use crate::{QueueStats, SlotState, StagingError, StagingSlot};
use std::sync::{Arc, Mutex};
use tensor_core::Element;
use tokio::sync::{mpsc, Semaphore, TryAcquireError};

/// Lane buffers plus valid length, as carried through the filled channel.
type Filled<T> = (Vec<Vec<T>>, usize);

/// Internal queue state, shared between the queue and its slots via `Arc`.
pub(crate) struct QueueInner<T: Element> {
    pub(crate) depth: usize,
    pub(crate) capacity: usize,
    pub(crate) lanes: usize,
    /// One permit per free slot.
    free_slots: Semaphore,
    free_list: Mutex<Vec<Vec<Vec<T>>>>,
    filled_tx: mpsc::UnboundedSender<Filled<T>>,
    filled_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Filled<T>>>,
    stats: Mutex<QueueStats>,
}

impl<T: Element> QueueInner<T> {
    /// Returns a slot's buffers to the free list and wakes one waiter.
    pub(crate) fn reclaim(&self, lanes: Vec<Vec<T>>, leaked: bool) {
        if let Ok(mut stats) = self.stats.lock() {
            if leaked {
                stats.record_leak();
            } else {
                stats.record_release();
            }
        }
        if leaked {
            tracing::warn!(
                capacity = self.capacity,
                "staging slot dropped without release"
            );
        }
        if let Ok(mut free) = self.free_list.lock() {
            free.push(lanes);
        }
        self.free_slots.add_permits(1);
    }

    pub(crate) fn note_overflow(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_overflow();
        }
    }

    fn pop_free(&self) -> Vec<Vec<T>> {
        self.free_list
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_else(|| vec![vec![T::default(); self.capacity]; self.lanes])
    }
}

/// A bounded ring of staging slots with acquire/release semantics.
///
/// # Example
/// ```
/// use staging::StagingQueue;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let queue = StagingQueue::<f32>::new(2, 8, 1).unwrap();
///
/// let mut slot = queue.acquire().await.unwrap();
/// slot.fill(0, &[1.0, 2.0, 3.0]).unwrap();
/// queue.enqueue(slot).unwrap();
///
/// let slot = queue.dequeue().await.unwrap();
/// assert_eq!(slot.lane(0).unwrap(), &[1.0, 2.0, 3.0]);
/// queue.release(slot);
///
/// queue.ensure_drained().unwrap();
/// # });
/// ```
pub struct StagingQueue<T: Element> {
    inner: Arc<QueueInner<T>>,
}

impl<T: Element> StagingQueue<T> {
    /// Creates a queue of `depth` slots, each holding `capacity` elements
    /// in each of `lanes` lanes.
    pub fn new(depth: usize, capacity: usize, lanes: usize) -> Result<Self, StagingError> {
        if depth == 0 || capacity == 0 || lanes == 0 {
            return Err(StagingError::InvalidGeometry {
                depth,
                capacity,
                lanes,
            });
        }

        let free = (0..depth)
            .map(|_| vec![vec![T::default(); capacity]; lanes])
            .collect();
        let (filled_tx, filled_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(QueueInner {
                depth,
                capacity,
                lanes,
                free_slots: Semaphore::new(depth),
                free_list: Mutex::new(free),
                filled_tx,
                filled_rx: tokio::sync::Mutex::new(filled_rx),
                stats: Mutex::new(QueueStats::default()),
            }),
        })
    }

    /// Creates a depth-2 queue.
    pub fn double_buffered(capacity: usize, lanes: usize) -> Result<Self, StagingError> {
        Self::new(2, capacity, lanes)
    }

    /// Waits for a free slot and returns it `InUse` with length 0.
    pub async fn acquire(&self) -> Result<StagingSlot<T>, StagingError> {
        let waited = match self.inner.free_slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                false
            }
            Err(TryAcquireError::NoPermits) => {
                self.inner
                    .free_slots
                    .acquire()
                    .await
                    .map_err(|_| StagingError::Closed)?
                    .forget();
                true
            }
            Err(TryAcquireError::Closed) => return Err(StagingError::Closed),
        };

        let lanes = self.inner.pop_free();
        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_acquire(waited);
        }
        Ok(StagingSlot::new(lanes, 0, Arc::clone(&self.inner)))
    }

    /// Marks `slot` `Filled` and hands it to the consumer.
    pub fn enqueue(&self, mut slot: StagingSlot<T>) -> Result<(), StagingError> {
        let filled = slot.take(SlotState::Filled);
        self.inner
            .filled_tx
            .send(filled)
            .map_err(|_| StagingError::Closed)?;
        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_enqueue();
        }
        Ok(())
    }

    /// Waits for the oldest `Filled` slot and returns it `InUse`.
    pub async fn dequeue(&self) -> Result<StagingSlot<T>, StagingError> {
        let mut rx = self.inner.filled_rx.lock().await;
        let (lanes, len) = rx.recv().await.ok_or(StagingError::Closed)?;
        Ok(StagingSlot::new(lanes, len, Arc::clone(&self.inner)))
    }

    /// Returns `slot` to the free list.
    pub fn release(&self, mut slot: StagingSlot<T>) {
        let (lanes, _) = slot.take(SlotState::Free);
        self.inner.reclaim(lanes, false);
    }

    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn lanes(&self) -> usize {
        self.inner.lanes
    }

    /// Slots currently available to `acquire`.
    pub fn free_slots(&self) -> usize {
        self.inner.free_slots.available_permits()
    }

    /// Returns a snapshot of queue statistics.
    pub fn stats(&self) -> QueueStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Checks that every acquired slot was released.
    ///
    /// Fails with [`StagingError::SlotLeak`] if slots are still held or
    /// were dropped without `release`.
    pub fn ensure_drained(&self) -> Result<(), StagingError> {
        let stats = self.stats();
        if stats.is_balanced() {
            Ok(())
        } else {
            Err(StagingError::SlotLeak {
                outstanding: stats.outstanding(),
                leaked: stats.leaks,
            })
        }
    }
}

impl<T: Element> Clone for StagingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> std::fmt::Debug for StagingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingQueue")
            .field("depth", &self.depth())
            .field("capacity", &self.capacity())
            .field("lanes", &self.lanes())
            .field("free_slots", &self.free_slots())
            .finish()
    }
}
