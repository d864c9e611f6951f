// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Queue statistics for profiling and leak checks.
//!
//! [`QueueStats`] counts slot traffic through a [`StagingQueue`]: how many
//! slots were acquired and released, how often a stage had to wait for a
//! free slot, and how many slots were dropped without being released.
//!
//! [`StagingQueue`]: crate::StagingQueue

/// Cumulative statistics about a staging queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct QueueStats {
    /// Slots handed out by `acquire`.
    pub acquires: u64,
    /// Slots returned by `release`.
    pub releases: u64,
    /// Slots dropped while acquired (returned, but counted here).
    pub leaks: u64,
    /// Acquires that found no free slot and had to wait.
    pub waits: u64,
    /// Slots handed from producer to consumer.
    pub enqueued: u64,
    /// Fills rejected for exceeding slot capacity.
    pub overflows: u64,
    /// Most slots acquired at once.
    pub peak_in_flight: u64,
}

impl QueueStats {
    /// Slots acquired but neither released nor dropped.
    pub fn outstanding(&self) -> u64 {
        self.acquires.saturating_sub(self.releases + self.leaks)
    }

    /// True when every acquire has been matched by a release.
    pub fn is_balanced(&self) -> bool {
        self.outstanding() == 0 && self.leaks == 0
    }

    pub(crate) fn record_acquire(&mut self, waited: bool) {
        self.acquires += 1;
        if waited {
            self.waits += 1;
        }
        self.peak_in_flight = self.peak_in_flight.max(self.outstanding());
    }

    pub(crate) fn record_release(&mut self) {
        self.releases += 1;
    }

    pub(crate) fn record_leak(&mut self) {
        self.leaks += 1;
    }

    pub(crate) fn record_enqueue(&mut self) {
        self.enqueued += 1;
    }

    pub(crate) fn record_overflow(&mut self) {
        self.overflows += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Slots: {} acquired, {} released, {} leaked, {} waits, peak {} in flight, {} overflows",
            self.acquires,
            self.releases,
            self.leaks,
            self.waits,
            self.peak_in_flight,
            self.overflows,
        )
    }
}
