// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulated accelerator.
//!
//! [`Device::submit`] is the launch entry point. It takes the kernel, the
//! operands, a destination buffer, the packed [`TilingRecord`] and a
//! pre-allocated [`Workspace`], and returns at once with an
//! [`InvocationHandle`]. Each active unit then runs as its own tokio task,
//! deriving its span from the record alone.
//!
//! ```text
//! submit ──► validate ──► spawn coordinator
//!                              ├─ unit 0 task: KernelPipeline::run
//!                              ├─ unit 1 task: KernelPipeline::run
//!                              └─ ...
//!                         gather chunks ──► status: Succeeded | Failed
//! ```
//!
//! Failure after launch is terminal: the destination is not returned and
//! no unit is retried.

use crate::{Kernel, KernelPipeline, RuntimeError, UnitMetrics};
use capability::HardwareProfile;
use std::sync::Arc;
use std::time::Duration;
use tensor_core::Element;
use tiling_planner::{staging_bytes, TilingRecord, DEFAULT_QUEUE_DEPTH};
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ── Workspace ──────────────────────────────────────────────────

/// Scratch memory handed to the device for its staging queues.
#[derive(Debug, Default)]
pub struct Workspace {
    buffer: Vec<u8>,
}

impl Workspace {
    /// Allocates `bytes` of zeroed scratch space.
    pub fn allocate(bytes: usize) -> Self {
        Self {
            buffer: vec![0; bytes],
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

// ── Status channel ─────────────────────────────────────────────

/// Progress of a submitted invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStatus {
    Pending,
    Succeeded,
    Failed(String),
}

impl InvocationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Everything the device produced for one invocation.
#[derive(Debug)]
pub struct DeviceOutput<T> {
    /// The destination buffer, fully written.
    pub destination: Vec<T>,
    /// One entry per active unit, in unit order.
    pub units: Vec<UnitMetrics>,
}

enum Outcome<T> {
    Rejected(RuntimeError),
    Running(JoinHandle<Result<DeviceOutput<T>, RuntimeError>>),
}

/// Caller's view of a submitted invocation.
pub struct InvocationHandle<T: Element> {
    status: watch::Receiver<InvocationStatus>,
    outcome: Outcome<T>,
}

impl<T: Element> InvocationHandle<T> {
    fn rejected(error: RuntimeError) -> Self {
        tracing::warn!("launch rejected: {error}");
        let (_, status) = watch::channel(InvocationStatus::Failed(error.to_string()));
        Self {
            status,
            outcome: Outcome::Rejected(error),
        }
    }

    /// Returns the current status without blocking.
    pub fn status(&self) -> InvocationStatus {
        self.status.borrow().clone()
    }

    /// Waits until the status leaves `Pending` and returns it.
    pub async fn settled(&mut self) -> InvocationStatus {
        match self.status.wait_for(|s| !s.is_pending()).await {
            Ok(status) => (*status).clone(),
            Err(_) => InvocationStatus::Failed("device ended without reporting status".into()),
        }
    }

    /// Waits for completion and returns the device output.
    pub async fn wait(self) -> Result<DeviceOutput<T>, RuntimeError> {
        match self.outcome {
            Outcome::Rejected(error) => Err(error),
            Outcome::Running(task) => task
                .await
                .map_err(|e| RuntimeError::DispatchFailure(format!("device task failed: {e}")))?,
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Giving up abandons the wait only; units already running finish in
    /// the background and their result is discarded.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<DeviceOutput<T>, RuntimeError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| RuntimeError::Timeout { waited: timeout })?
    }
}

impl<T: Element> std::fmt::Debug for InvocationHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationHandle")
            .field("status", &self.status())
            .finish()
    }
}

// ── Device ─────────────────────────────────────────────────────

/// A host-simulated accelerator with `profile.unit_count()` units.
#[derive(Debug, Clone)]
pub struct Device {
    profile: HardwareProfile,
    queue_depth: usize,
}

impl Device {
    pub fn new(profile: HardwareProfile) -> Self {
        Self {
            profile,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }

    /// Staging queue depth used by every unit.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Scratch bytes a launch of `record` with `arity` operands of `T` needs.
    pub fn required_workspace<T: Element>(&self, record: &TilingRecord, arity: usize) -> usize {
        staging_bytes(
            record.active_units as usize,
            self.queue_depth,
            arity.max(1),
            record.max_tile_size(),
            T::DTYPE.size_bytes(),
        )
    }

    /// Launches `kernel` over `sources` into `destination`.
    ///
    /// Must be called from within a tokio runtime. Launches that fail the
    /// host-side checks come back already `Failed`:
    /// - the record fails [`TilingRecord::validate`];
    /// - the record uses more units than the device has;
    /// - the record, sources and destination disagree on length;
    /// - the kernel's arity differs from the source count;
    /// - `workspace` is smaller than [`required_workspace`](Self::required_workspace).
    pub fn submit<T: Element>(
        &self,
        kernel: Arc<dyn Kernel<T>>,
        sources: Vec<Arc<[T]>>,
        destination: Vec<T>,
        record: &TilingRecord,
        workspace: Workspace,
    ) -> InvocationHandle<T> {
        let checked =
            self.check_launch(kernel.as_ref(), &sources, &destination, record, &workspace);
        if let Err(error) = checked {
            return InvocationHandle::rejected(error);
        }

        tracing::info!(
            kernel = kernel.name(),
            units = record.active_units,
            elements = destination.len(),
            "launching on {}",
            self.profile
        );

        let (status_tx, status) = watch::channel(InvocationStatus::Pending);
        let record = *record;
        let capacity = self.profile.buffer_capacity();
        let depth = self.queue_depth;

        let task = tokio::spawn(async move {
            let result = execute(kernel, sources, destination, record, capacity, depth).await;
            let outcome = match &result {
                Ok(_) => InvocationStatus::Succeeded,
                Err(e) => InvocationStatus::Failed(e.to_string()),
            };
            status_tx.send_replace(outcome);
            // Scratch stays allocated until every unit has finished.
            drop(workspace);
            result
        });

        InvocationHandle {
            status,
            outcome: Outcome::Running(task),
        }
    }

    fn check_launch<T: Element>(
        &self,
        kernel: &dyn Kernel<T>,
        sources: &[Arc<[T]>],
        destination: &[T],
        record: &TilingRecord,
        workspace: &Workspace,
    ) -> Result<(), RuntimeError> {
        let fail = |msg: String| Err(RuntimeError::DispatchFailure(msg));

        if let Err(e) = record.validate() {
            return fail(format!("rejected tiling record: {e}"));
        }

        if record.active_units as usize > self.profile.unit_count() {
            return fail(format!(
                "record uses {} units, device has {}",
                record.active_units,
                self.profile.unit_count()
            ));
        }
        if record.total_elements() != destination.len() {
            return fail(format!(
                "record covers {} elements, destination has {}",
                record.total_elements(),
                destination.len()
            ));
        }
        if sources.len() != kernel.arity() {
            return fail(format!(
                "kernel '{}' takes {} operand(s), got {}",
                kernel.name(),
                kernel.arity(),
                sources.len()
            ));
        }
        if let Some(bad) = sources.iter().find(|s| s.len() != destination.len()) {
            return fail(format!(
                "source has {} elements, destination has {}",
                bad.len(),
                destination.len()
            ));
        }
        let required = self.required_workspace::<T>(record, sources.len());
        if workspace.len() < required {
            return fail(format!(
                "workspace of {} bytes, launch needs {required}",
                workspace.len()
            ));
        }
        Ok(())
    }
}

/// Runs every active unit and stitches the chunks back together.
async fn execute<T: Element>(
    kernel: Arc<dyn Kernel<T>>,
    sources: Vec<Arc<[T]>>,
    mut destination: Vec<T>,
    record: TilingRecord,
    capacity: usize,
    depth: usize,
) -> Result<DeviceOutput<T>, RuntimeError> {
    let mut tasks = Vec::with_capacity(record.active_units as usize);
    for unit in record.units() {
        let pipeline = KernelPipeline::new(Arc::clone(&kernel), capacity).with_queue_depth(depth);
        let sources = sources.clone();
        tasks.push(tokio::spawn(async move {
            let lanes: Vec<&[T]> = sources.iter().map(|s| &s[..]).collect();
            let mut chunk = vec![T::default(); unit.element_count];
            let metrics = pipeline.run(&unit, &lanes, &mut chunk).await?;
            Ok::<_, RuntimeError>((chunk, metrics))
        }));
    }

    let mut units = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    for (index, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(Ok((chunk, metrics))) => {
                let at = metrics.element_offset;
                destination[at..at + chunk.len()].copy_from_slice(&chunk);
                units.push(metrics);
            }
            Ok(Err(error)) => {
                tracing::warn!(unit = index, "unit failed: {error}");
                first_error.get_or_insert(error);
            }
            Err(join) => {
                tracing::warn!(unit = index, "unit task aborted: {join}");
                first_error.get_or_insert(RuntimeError::DispatchFailure(format!(
                    "unit {index} task failed: {join}"
                )));
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(DeviceOutput { destination, units }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapKernel;
    use staging::StagingError;
    use tiling_planner::{workspace_size, TilingPlanner};

    fn profile(units: usize, capacity: usize) -> HardwareProfile {
        HardwareProfile::new(capability::revision::GEN2, units, capacity).unwrap()
    }

    fn negate() -> Arc<dyn Kernel<i64>> {
        Arc::new(MapKernel::unary("negate", |x: i64| -x))
    }

    #[tokio::test]
    async fn test_submit_scenario_a() {
        let plan = TilingPlanner::new(8, 16)
            .with_dtype(tensor_core::DType::I64)
            .plan(100)
            .unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(8, 16));
        let source: Arc<[i64]> = (0..100).collect();

        let mut handle = device.submit(
            negate(),
            vec![source],
            vec![0; 100],
            &record,
            Workspace::allocate(workspace_size(&plan)),
        );
        assert_eq!(handle.settled().await, InvocationStatus::Succeeded);
        let out = handle.wait().await.unwrap();

        assert_eq!(out.destination, (0..100).map(|x| -x).collect::<Vec<i64>>());
        assert_eq!(out.units.len(), 8);
        assert_eq!(out.units[3].element_count, 13);
        assert_eq!(out.units[4].element_offset, 52);
    }

    #[tokio::test]
    async fn test_workspace_matches_planner() {
        let plan = TilingPlanner::new(4, 8)
            .with_dtype(tensor_core::DType::I64)
            .with_input_streams(2)
            .plan(40)
            .unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(4, 8));
        assert_eq!(device.required_workspace::<i64>(&record, 2), workspace_size(&plan));
    }

    #[tokio::test]
    async fn test_small_workspace_rejected() {
        let plan = TilingPlanner::new(4, 8).plan(40).unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(4, 8));
        let source: Arc<[i64]> = vec![1; 40].into();

        let handle = device.submit(
            negate(),
            vec![source],
            vec![0; 40],
            &record,
            Workspace::allocate(1),
        );
        assert!(matches!(handle.status(), InvocationStatus::Failed(_)));
        assert!(matches!(handle.wait().await, Err(RuntimeError::DispatchFailure(_))));
    }

    #[tokio::test]
    async fn test_record_larger_than_device_rejected() {
        let plan = TilingPlanner::new(16, 8).plan(160).unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(4, 8));
        let source: Arc<[i64]> = vec![1; 160].into();
        let handle = device.submit(
            negate(),
            vec![source],
            vec![0; 160],
            &record,
            Workspace::allocate(1 << 20),
        );
        assert!(matches!(handle.wait().await, Err(RuntimeError::DispatchFailure(_))));
    }

    #[tokio::test]
    async fn test_tile_overflow_fails_invocation() {
        // Planned for 32-element slots, run on a device with 8.
        let plan = TilingPlanner::new(2, 32).plan(64).unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(2, 8));
        let source: Arc<[i64]> = vec![3; 64].into();

        let mut handle = device.submit(
            negate(),
            vec![source],
            vec![0; 64],
            &record,
            Workspace::allocate(1 << 20),
        );
        assert!(matches!(handle.settled().await, InvocationStatus::Failed(_)));
        let err = handle.wait().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Staging(StagingError::BufferOverflow { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_record_rejected() {
        // One 8-element tile cannot cover the 10 elements the class claims.
        let plan = TilingPlanner::new(1, 8).plan(10).unwrap();
        let mut record = TilingRecord::from_plan(&plan).unwrap();
        record.leading = tiling_planner::UnitClass {
            element_count: 10,
            tile_size: 8,
            tile_count: 1,
            tail_tile_size: 8,
        };
        let device = Device::new(profile(1, 8));
        let source: Arc<[i64]> = (0..10).collect();

        let handle = device.submit(
            negate(),
            vec![source],
            vec![0; 10],
            &record,
            Workspace::allocate(1 << 20),
        );
        assert!(matches!(handle.status(), InvocationStatus::Failed(_)));
        assert!(matches!(handle.wait().await, Err(RuntimeError::DispatchFailure(_))));
    }

    #[tokio::test]
    async fn test_huge_record_rejected() {
        let huge = tiling_planner::UnitClass {
            element_count: u64::MAX,
            tile_size: u64::MAX,
            tile_count: 1,
            tail_tile_size: u64::MAX,
        };
        let record = TilingRecord {
            active_units: 2,
            cutover: 2,
            leading: huge,
            trailing: Default::default(),
        };
        let device = Device::new(profile(2, 8));
        let source: Arc<[i64]> = vec![0; 4].into();
        let handle = device.submit(negate(), vec![source], vec![0; 4], &record, Workspace::default());
        assert!(matches!(handle.wait().await, Err(RuntimeError::DispatchFailure(_))));
    }

    #[tokio::test]
    async fn test_zero_elements() {
        let plan = TilingPlanner::new(8, 16).plan(0).unwrap();
        let record = TilingRecord::from_plan(&plan).unwrap();
        let device = Device::new(profile(8, 16));
        let source: Arc<[i64]> = Arc::from(Vec::<i64>::new());

        let handle = device.submit(
            negate(),
            vec![source],
            Vec::new(),
            &record,
            Workspace::default(),
        );
        let out = handle.wait().await.unwrap();
        assert!(out.destination.is_empty());
        assert!(out.units.is_empty());
    }
}
