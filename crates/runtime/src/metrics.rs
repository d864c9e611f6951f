// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Invocation profiling metrics.
//!
//! [`InvocationMetrics`] collects the dispatch decision, plan geometry and
//! per-unit timing of one launch. [`UnitMetrics`] carries each unit's
//! staging-queue statistics, which is where double buffering shows up:
//! `waits` counts how often a stage stalled on a full queue.

use capability::ExecutionDecision;
use staging::QueueStats;
use std::time::Duration;

/// Metrics for one execution unit's pipeline run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnitMetrics {
    pub unit_index: usize,
    pub element_offset: usize,
    pub element_count: usize,
    pub tile_count: usize,
    /// Wall-clock time from first stage-in to last stage-out.
    pub duration: Duration,
    /// Input queue traffic.
    pub input_queue: QueueStats,
    /// Output queue traffic.
    pub output_queue: QueueStats,
}

/// Aggregate metrics for one invocation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvocationMetrics {
    /// Kernel name.
    pub kernel: String,
    /// Dispatch verdict.
    pub decision: ExecutionDecision,
    /// Elements processed.
    pub total_elements: usize,
    /// Units that received work.
    pub active_units: usize,
    /// Tiles across all units.
    pub total_tiles: usize,
    /// Scratch bytes handed to the device.
    pub workspace_bytes: usize,
    /// Time spent on the host before launch.
    pub plan_duration: Duration,
    /// Time from launch to completion.
    pub run_duration: Duration,
    /// Per-unit metrics (empty on the fallback path).
    pub units: Vec<UnitMetrics>,
}

impl InvocationMetrics {
    /// Creates an empty metrics container.
    pub fn new(kernel: impl Into<String>, decision: ExecutionDecision) -> Self {
        Self {
            kernel: kernel.into(),
            decision,
            total_elements: 0,
            active_units: 0,
            total_tiles: 0,
            workspace_bytes: 0,
            plan_duration: Duration::ZERO,
            run_duration: Duration::ZERO,
            units: Vec::new(),
        }
    }

    /// Records one unit's metrics.
    pub fn record_unit(&mut self, unit: UnitMetrics) {
        self.units.push(unit);
    }

    /// Stage waits summed over every unit and both queues.
    pub fn total_waits(&self) -> u64 {
        self.units
            .iter()
            .map(|u| u.input_queue.waits + u.output_queue.waits)
            .sum()
    }

    /// The slowest unit's duration; bounds the invocation's device time.
    pub fn slowest_unit(&self) -> Option<&UnitMetrics> {
        self.units.iter().max_by_key(|u| u.duration)
    }

    /// Elements per second over the run phase.
    pub fn throughput(&self) -> f64 {
        let secs = self.run_duration.as_secs_f64();
        if secs <= 0.0 || self.total_elements == 0 {
            return 0.0;
        }
        self.total_elements as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Invocation '{}': {}, {} elements on {} units in {} tiles, \
             workspace {} B, plan {:.3}ms, run {:.3}ms ({:.0} elem/s), {} stage waits",
            self.kernel,
            self.decision,
            self.total_elements,
            self.active_units,
            self.total_tiles,
            self.workspace_bytes,
            self.plan_duration.as_secs_f64() * 1000.0,
            self.run_duration.as_secs_f64() * 1000.0,
            self.throughput(),
            self.total_waits(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(index: usize, millis: u64, waits: u64) -> UnitMetrics {
        UnitMetrics {
            unit_index: index,
            element_offset: index * 10,
            element_count: 10,
            tile_count: 2,
            duration: Duration::from_millis(millis),
            input_queue: QueueStats {
                waits,
                ..Default::default()
            },
            output_queue: QueueStats::default(),
        }
    }

    #[test]
    fn test_empty_metrics() {
        let m = InvocationMetrics::new("copy", ExecutionDecision::fallback());
        assert_eq!(m.throughput(), 0.0);
        assert_eq!(m.total_waits(), 0);
        assert!(m.slowest_unit().is_none());
    }

    #[test]
    fn test_record_units() {
        let mut m = InvocationMetrics::new("copy", ExecutionDecision::fallback());
        m.record_unit(unit(0, 5, 1));
        m.record_unit(unit(1, 9, 2));
        assert_eq!(m.total_waits(), 3);
        assert_eq!(m.slowest_unit().unwrap().unit_index, 1);
    }

    #[test]
    fn test_throughput() {
        let mut m = InvocationMetrics::new("copy", ExecutionDecision::fallback());
        m.total_elements = 1000;
        m.run_duration = Duration::from_secs(2);
        assert!((m.throughput() - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_summary_format() {
        let mut m = InvocationMetrics::new("maximum", ExecutionDecision::fallback());
        m.total_elements = 40;
        m.active_units = 4;
        m.total_tiles = 8;
        let s = m.summary();
        assert!(s.contains("Invocation 'maximum'"));
        assert!(s.contains("fallback via fallback"));
        assert!(s.contains("40 elements on 4 units in 8 tiles"));
    }
}
