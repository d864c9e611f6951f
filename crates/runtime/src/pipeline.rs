// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-unit kernel pipeline.
//!
//! One execution unit walks its element range tile by tile through three
//! stages connected by two staging queues:
//!
//! ```text
//!  sources ──stage-in──► [input queue] ──compute──► [output queue] ──stage-out──► destination
//!                         lanes = arity              lanes = 1
//! ```
//!
//! The stages are separate futures joined with `try_join!`. With depth 2
//! stage-in of tile `i + 1` proceeds while compute holds tile `i` and
//! stage-out drains tile `i - 1`; a stage that finds its queue full
//! suspends until the next stage releases a slot. The first stage error
//! cancels the other two.

use crate::{Kernel, RuntimeError, UnitMetrics};
use staging::StagingQueue;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::Element;
use tiling_planner::UnitPlan;

/// Runs one unit's tiles through stage-in, compute and stage-out.
pub struct KernelPipeline<T: Element> {
    kernel: Arc<dyn Kernel<T>>,
    slot_capacity: usize,
    queue_depth: usize,
}

impl<T: Element> KernelPipeline<T> {
    /// Creates a pipeline whose staging slots hold `slot_capacity` elements.
    pub fn new(kernel: Arc<dyn Kernel<T>>, slot_capacity: usize) -> Self {
        Self {
            kernel,
            slot_capacity,
            queue_depth: tiling_planner::DEFAULT_QUEUE_DEPTH,
        }
    }

    /// Staging queue depth; 1 disables double buffering.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn kernel(&self) -> &dyn Kernel<T> {
        self.kernel.as_ref()
    }

    /// Processes `unit`.
    ///
    /// `sources` are the full operand ranges, read at the unit's absolute
    /// offsets. `destination` is the unit's own chunk: its length must be
    /// `unit.element_count`, and tile `t` lands at
    /// `t.offset - unit.element_offset`.
    ///
    /// Fails with [`StagingError::BufferOverflow`] if a tile exceeds the
    /// slot capacity. Both queues are checked for leaked slots on success.
    ///
    /// [`StagingError::BufferOverflow`]: staging::StagingError::BufferOverflow
    pub async fn run(
        &self,
        unit: &UnitPlan,
        sources: &[&[T]],
        destination: &mut [T],
    ) -> Result<UnitMetrics, RuntimeError> {
        let arity = self.kernel.arity();
        if sources.len() != arity {
            return Err(RuntimeError::DispatchFailure(format!(
                "kernel '{}' takes {arity} operand(s), got {}",
                self.kernel.name(),
                sources.len()
            )));
        }
        if let Some(short) = sources.iter().find(|s| s.len() < unit.element_end()) {
            return Err(RuntimeError::DispatchFailure(format!(
                "unit {} needs elements up to {}, source has {}",
                unit.unit_index,
                unit.element_end(),
                short.len()
            )));
        }
        if destination.len() != unit.element_count {
            return Err(RuntimeError::DispatchFailure(format!(
                "unit {} owns {} elements, destination chunk has {}",
                unit.unit_index,
                unit.element_count,
                destination.len()
            )));
        }

        let start = Instant::now();
        let input = StagingQueue::<T>::new(self.queue_depth, self.slot_capacity, arity.max(1))?;
        let output = StagingQueue::<T>::new(self.queue_depth, self.slot_capacity, 1)?;

        let stage_in = async {
            for tile in unit.tiles() {
                let mut slot = input.acquire().await?;
                for (lane, source) in sources.iter().enumerate() {
                    slot.fill(lane, &source[tile.offset..tile.end()])?;
                }
                if sources.is_empty() {
                    slot.set_len(tile.len)?;
                }
                input.enqueue(slot)?;
                tracing::trace!(unit = unit.unit_index, tile = tile.index, "staged in");
            }
            Ok::<_, RuntimeError>(())
        };

        let compute = async {
            for _ in 0..unit.tile_count {
                let staged = input.dequeue().await?;
                let mut result = output.acquire().await?;
                result.set_len(staged.len())?;
                let lanes = if arity == 0 { Vec::new() } else { staged.lane_slices() };
                self.kernel.compute(&lanes, result.lane_mut(0)?);
                drop(lanes);
                input.release(staged);
                output.enqueue(result)?;
            }
            Ok::<_, RuntimeError>(())
        };

        let stage_out = async {
            for tile in unit.tiles() {
                let result = output.dequeue().await?;
                let data = result.lane(0)?;
                if data.len() != tile.len {
                    return Err(RuntimeError::DispatchFailure(format!(
                        "unit {} tile {} computed {} elements, expected {}",
                        unit.unit_index,
                        tile.index,
                        data.len(),
                        tile.len
                    )));
                }
                let at = tile.offset - unit.element_offset;
                destination[at..at + tile.len].copy_from_slice(data);
                output.release(result);
                tracing::trace!(unit = unit.unit_index, tile = tile.index, "staged out");
            }
            Ok::<_, RuntimeError>(())
        };

        tokio::try_join!(stage_in, compute, stage_out)?;
        input.ensure_drained()?;
        output.ensure_drained()?;

        let metrics = UnitMetrics {
            unit_index: unit.unit_index,
            element_offset: unit.element_offset,
            element_count: unit.element_count,
            tile_count: unit.tile_count,
            duration: start.elapsed(),
            input_queue: input.stats(),
            output_queue: output.stats(),
        };
        tracing::debug!(
            unit = unit.unit_index,
            tiles = unit.tile_count,
            "unit done in {:?}",
            metrics.duration
        );
        Ok(metrics)
    }
}

impl<T: Element> std::fmt::Debug for KernelPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelPipeline")
            .field("kernel", &self.kernel.name())
            .field("slot_capacity", &self.slot_capacity)
            .field("queue_depth", &self.queue_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapKernel;
    use staging::StagingError;
    use tiling_planner::TilingPlanner;

    fn double() -> Arc<dyn Kernel<i32>> {
        Arc::new(MapKernel::unary("double", |x: i32| x * 2))
    }

    #[tokio::test]
    async fn test_scenario_b_unit() {
        let plan = TilingPlanner::new(4, 8).plan(40).unwrap();
        let source: Vec<i32> = (0..40).collect();
        let unit = plan.units[1];
        let mut chunk = vec![0; unit.element_count];

        let pipeline = KernelPipeline::new(double(), 8);
        let metrics = pipeline.run(&unit, &[&source], &mut chunk).await.unwrap();

        assert_eq!(chunk, (10..20).map(|x| x * 2).collect::<Vec<_>>());
        assert_eq!(metrics.tile_count, 2);
        assert_eq!(metrics.input_queue.acquires, 2);
        assert!(metrics.input_queue.is_balanced());
        assert!(metrics.output_queue.is_balanced());
    }

    #[tokio::test]
    async fn test_many_tiles_with_double_buffering() {
        let plan = TilingPlanner::new(1, 4).plan(103).unwrap();
        let a: Vec<i32> = (0..103).collect();
        let b: Vec<i32> = (0..103).map(|x| 1000 - x).collect();
        let unit = plan.units[0];
        let mut out = vec![0; 103];

        let add: Arc<dyn Kernel<i32>> = Arc::new(MapKernel::binary("add", |x: i32, y: i32| x + y));
        let metrics = KernelPipeline::new(add, 4)
            .run(&unit, &[&a, &b], &mut out)
            .await
            .unwrap();

        assert!(out.iter().all(|&v| v == 1000));
        assert_eq!(metrics.tile_count, 26);
        assert!(metrics.input_queue.peak_in_flight <= 2);
        assert!(metrics.output_queue.peak_in_flight <= 2);
    }

    #[tokio::test]
    async fn test_single_buffering() {
        let plan = TilingPlanner::new(1, 3).plan(10).unwrap();
        let source: Vec<i32> = (0..10).collect();
        let mut out = vec![0; 10];
        let metrics = KernelPipeline::new(double(), 3)
            .with_queue_depth(1)
            .run(&plan.units[0], &[&source], &mut out)
            .await
            .unwrap();
        assert_eq!(out[9], 18);
        assert_eq!(metrics.input_queue.peak_in_flight, 1);
    }

    #[tokio::test]
    async fn test_tile_larger_than_slot_overflows() {
        let plan = TilingPlanner::new(1, 16).plan(16).unwrap();
        let source = vec![1; 16];
        let mut out = vec![0; 16];
        let err = KernelPipeline::new(double(), 8)
            .run(&plan.units[0], &[&source], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Staging(StagingError::BufferOverflow {
                requested: 16,
                capacity: 8
            })
        ));
    }

    #[tokio::test]
    async fn test_arity_mismatch() {
        let plan = TilingPlanner::new(1, 8).plan(4).unwrap();
        let source = vec![1; 4];
        let mut out = vec![0; 4];
        let err = KernelPipeline::new(double(), 8)
            .run(&plan.units[0], &[&source, &source], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DispatchFailure(_)));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let plan = TilingPlanner::new(3, 5).plan(47).unwrap();
        let source: Vec<i32> = (0..47).map(|x| x * 7 - 100).collect();
        let pipeline = KernelPipeline::new(double(), 5);

        let mut first = Vec::new();
        let mut second = Vec::new();
        for out in [&mut first, &mut second] {
            for unit in &plan.units {
                let mut chunk = vec![0; unit.element_count];
                pipeline.run(unit, &[&source], &mut chunk).await.unwrap();
                out.extend(chunk);
            }
        }
        assert_eq!(first, second);
        assert_eq!(first.len(), 47);
    }
}
