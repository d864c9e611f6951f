// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Host-side launch orchestration with a type-state–enforced sequence.
//!
//! ```text
//! Launch<Idle>
//!     │  .dispatch(operands)     capability check → ExecutionDecision
//!     ▼
//! Launch<Dispatched>
//!     │  .plan()                 tiling plan, record, workspace size
//!     ▼
//! Launch<Ready>
//!     │  .run(kernel, sources)   device or fallback
//!     ▼
//!   LaunchOutput
//! ```
//!
//! Every host check happens before `run` touches the device, and each
//! transition consumes the previous state, so a launch cannot run without
//! a decision and a plan.

use crate::{
    Device, FallbackExecutor, HostFallback, InvocationMetrics, Kernel, KernelRegistry, OpId,
    RuntimeConfig, RuntimeError, Workspace,
};
use capability::{CapabilityDispatcher, CapabilitySupportTable, ExecutionDecision, HardwareProfile};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tensor_core::{Element, TensorDescriptor, TensorError};
use tiling_planner::{workspace_size, TilingPlan, TilingPlanner, TilingRecord};

// ── Type-state markers ─────────────────────────────────────────

/// No operands yet.
#[derive(Debug)]
pub struct Idle;

/// Operands checked against the capability table.
#[derive(Debug)]
pub struct Dispatched {
    operands: Vec<TensorDescriptor>,
    decision: ExecutionDecision,
    started: Instant,
}

/// Plan, record and workspace size computed; ready to run.
#[derive(Debug)]
pub struct Ready {
    operands: Vec<TensorDescriptor>,
    decision: ExecutionDecision,
    plan: TilingPlan,
    record: TilingRecord,
    workspace_bytes: usize,
    plan_duration: Duration,
}

/// Sealed trait for launch states.
pub trait LaunchState: std::fmt::Debug {}
impl LaunchState for Idle {}
impl LaunchState for Dispatched {}
impl LaunchState for Ready {}

// ── Launch output ──────────────────────────────────────────────

/// The result of one invocation.
#[derive(Debug)]
pub struct LaunchOutput<T> {
    /// The destination buffer.
    pub output: Vec<T>,
    pub metrics: InvocationMetrics,
}

// ── Launch ─────────────────────────────────────────────────────

/// One kernel invocation, from capability check to completion.
///
/// # Example
/// ```
/// use runtime::{KernelRegistry, Launch, OpId, RuntimeConfig};
/// use std::sync::Arc;
/// use tensor_core::{DType, TensorDescriptor};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let a: Arc<[f32]> = (0..100).map(|i| i as f32).collect();
/// let b: Arc<[f32]> = (0..100).map(|i| 99.0 - i as f32).collect();
///
/// let launch = Launch::new(RuntimeConfig::default())
///     .unwrap()
///     .dispatch(vec![TensorDescriptor::flat(100, DType::F32); 2])
///     .unwrap()
///     .plan()
///     .unwrap();
/// assert!(launch.decision().is_accelerated());
///
/// let registry = KernelRegistry::with_builtins();
/// let out = launch.run_op(&registry, OpId::MAXIMUM, vec![a, b]).await.unwrap();
/// assert_eq!(out.output[0], 99.0);
/// assert_eq!(out.output[99], 99.0);
/// # });
/// ```
pub struct Launch<S: LaunchState = Idle> {
    config: RuntimeConfig,
    profile: HardwareProfile,
    table: Arc<CapabilitySupportTable>,
    state: S,
}

// ── Idle → Dispatched ──────────────────────────────────────────

impl Launch<Idle> {
    /// Creates a launch against the representative capability table.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let profile = config.hardware_profile()?;
        Ok(Self {
            config,
            profile,
            table: Arc::new(CapabilitySupportTable::representative()),
            state: Idle,
        })
    }

    /// Uses a different capability table.
    pub fn with_table(mut self, table: Arc<CapabilitySupportTable>) -> Self {
        self.table = table;
        self
    }

    /// Decides accelerated vs fallback for `operands`.
    ///
    /// Operands must share one element count. A revision missing from the
    /// table yields a fallback decision.
    pub fn dispatch(
        self,
        operands: Vec<TensorDescriptor>,
    ) -> Result<Launch<Dispatched>, RuntimeError> {
        let started = Instant::now();
        if let Some(first) = operands.first() {
            if let Some(odd) = operands
                .iter()
                .find(|o| o.num_elements() != first.num_elements())
            {
                return Err(TensorError::ElementCountMismatch {
                    shape: odd.shape().clone(),
                    expected: first.num_elements(),
                    actual: odd.num_elements(),
                }
                .into());
            }
        }

        let decision =
            CapabilityDispatcher::new(&self.table).decide_or_fallback(&operands, &self.profile)?;
        tracing::info!(revision = self.profile.revision(), "decision: {decision}");

        Ok(Launch {
            config: self.config,
            profile: self.profile,
            table: self.table,
            state: Dispatched {
                operands,
                decision,
                started,
            },
        })
    }
}

// ── Dispatched → Ready ─────────────────────────────────────────

impl Launch<Dispatched> {
    pub fn decision(&self) -> ExecutionDecision {
        self.state.decision
    }

    pub fn operands(&self) -> &[TensorDescriptor] {
        &self.state.operands
    }

    /// Builds the planner this launch uses: profile geometry, configured
    /// policy, block-aligned capacity for the primary dtype.
    pub fn planner(&self) -> Result<TilingPlanner, RuntimeError> {
        let mut planner = TilingPlanner::for_profile(&self.profile)
            .with_policy(self.config.create_policy()?)
            .with_min_elements_per_unit(self.config.min_elements_per_unit)
            .with_input_streams(self.state.operands.len())
            .with_queue_depth(self.config.queue_depth);
        if let Some(primary) = self.state.operands.first() {
            planner = planner.with_dtype(primary.dtype());
        }
        Ok(planner)
    }

    /// Plans the invocation and packs the tiling record.
    pub fn plan(self) -> Result<Launch<Ready>, RuntimeError> {
        let total = self
            .state
            .operands
            .first()
            .map_or(0, TensorDescriptor::num_elements);
        let total = i64::try_from(total).map_err(|_| {
            RuntimeError::ConfigError(format!("{total} elements exceed the planner's range"))
        })?;

        let plan = self.planner()?.plan(total)?;
        let record = TilingRecord::from_plan(&plan)?;
        let workspace_bytes = workspace_size(&plan);
        tracing::info!("{}", plan.summary());
        tracing::debug!("workspace: {workspace_bytes} bytes");

        Ok(Launch {
            config: self.config,
            profile: self.profile,
            table: self.table,
            state: Ready {
                operands: self.state.operands,
                decision: self.state.decision,
                plan,
                record,
                workspace_bytes,
                plan_duration: self.state.started.elapsed(),
            },
        })
    }
}

// ── Ready: run ─────────────────────────────────────────────────

impl Launch<Ready> {
    pub fn decision(&self) -> ExecutionDecision {
        self.state.decision
    }

    pub fn plan(&self) -> &TilingPlan {
        &self.state.plan
    }

    pub fn record(&self) -> &TilingRecord {
        &self.state.record
    }

    pub fn workspace_bytes(&self) -> usize {
        self.state.workspace_bytes
    }

    /// Runs `kernel`, falling back to [`HostFallback`] when the decision
    /// says so.
    pub async fn run<T: Element>(
        &self,
        kernel: Arc<dyn Kernel<T>>,
        sources: Vec<Arc<[T]>>,
    ) -> Result<LaunchOutput<T>, RuntimeError> {
        self.run_with_fallback(kernel, sources, &HostFallback).await
    }

    /// Runs the registry's kernel for `op` on `T`.
    pub async fn run_op<T: Element>(
        &self,
        registry: &KernelRegistry,
        op: OpId,
        sources: Vec<Arc<[T]>>,
    ) -> Result<LaunchOutput<T>, RuntimeError> {
        let kernel = registry.get::<T>(op)?;
        self.run(kernel, sources).await
    }

    /// Runs `kernel` on the device, or on `fallback` for fallback decisions.
    pub async fn run_with_fallback<T: Element>(
        &self,
        kernel: Arc<dyn Kernel<T>>,
        sources: Vec<Arc<[T]>>,
        fallback: &dyn FallbackExecutor<T>,
    ) -> Result<LaunchOutput<T>, RuntimeError> {
        self.check_sources(kernel.as_ref(), &sources)?;

        let plan = &self.state.plan;
        let mut metrics = InvocationMetrics::new(kernel.name(), self.state.decision);
        metrics.total_elements = plan.total_elements;
        metrics.plan_duration = self.state.plan_duration;

        let run_start = Instant::now();
        let output = if self.state.decision.is_accelerated() {
            let device = Device::new(self.profile).with_queue_depth(self.config.queue_depth);
            let handle = device.submit(
                kernel,
                sources,
                vec![T::default(); plan.total_elements],
                &self.state.record,
                Workspace::allocate(self.state.workspace_bytes),
            );
            let result = match self.config.launch_timeout() {
                Some(timeout) => handle.wait_timeout(timeout).await,
                None => handle.wait().await,
            }?;
            metrics.active_units = plan.active_units();
            metrics.total_tiles = plan.total_tiles();
            metrics.workspace_bytes = self.state.workspace_bytes;
            for unit in result.units {
                metrics.record_unit(unit);
            }
            result.destination
        } else {
            tracing::info!("running '{}' on {} fallback", kernel.name(), fallback.name());
            let lanes: Vec<&[T]> = sources.iter().map(|s| &s[..]).collect();
            let mut destination = vec![T::default(); plan.total_elements];
            fallback.execute(kernel.as_ref(), &lanes, &mut destination)?;
            destination
        };
        metrics.run_duration = run_start.elapsed();

        if self.config.enable_profiling {
            tracing::info!("{}", metrics.summary());
        }
        Ok(LaunchOutput { output, metrics })
    }

    fn check_sources<T: Element>(
        &self,
        kernel: &dyn Kernel<T>,
        sources: &[Arc<[T]>],
    ) -> Result<(), RuntimeError> {
        let operands = &self.state.operands;
        if sources.len() != operands.len() || kernel.arity() != operands.len() {
            return Err(RuntimeError::DispatchFailure(format!(
                "{} operand(s) dispatched, {} source(s) given, kernel '{}' takes {}",
                operands.len(),
                sources.len(),
                kernel.name(),
                kernel.arity()
            )));
        }
        for (descriptor, source) in operands.iter().zip(sources) {
            descriptor.check_data::<T>(source)?;
        }
        Ok(())
    }
}

impl<S: LaunchState> std::fmt::Debug for Launch<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("state", &std::any::type_name::<S>())
            .field("profile", &self.profile.to_string())
            .field("policy", &self.config.split_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapKernel;
    use capability::{revision, ExecutionPath};
    use tensor_core::DType;

    fn config(revision: u32, units: usize, capacity: usize) -> RuntimeConfig {
        RuntimeConfig {
            revision,
            unit_count: units,
            buffer_capacity: staging::StagingCapacity::from_elements(capacity).unwrap(),
            ..Default::default()
        }
    }

    fn ready(config: RuntimeConfig, operands: Vec<TensorDescriptor>) -> Launch<Ready> {
        Launch::new(config)
            .unwrap()
            .dispatch(operands)
            .unwrap()
            .plan()
            .unwrap()
    }

    #[test]
    fn test_idle_to_ready() {
        let launch = ready(
            config(revision::GEN2, 8, 16),
            vec![TensorDescriptor::flat(100, DType::I32)],
        );
        assert!(launch.decision().is_accelerated());
        assert_eq!(launch.plan().active_units(), 8);
        assert_eq!(launch.record().cutover, 4);
        assert_eq!(launch.workspace_bytes(), 8 * 2 * 2 * 13 * 4);
    }

    #[test]
    fn test_unsupported_dtype_falls_back() {
        let launch = Launch::new(config(revision::GEN1, 4, 8))
            .unwrap()
            .dispatch(vec![TensorDescriptor::flat(10, DType::BF16)])
            .unwrap();
        assert_eq!(launch.decision().path, ExecutionPath::Fallback);
    }

    #[test]
    fn test_unknown_revision_falls_back() {
        let launch = Launch::new(config(999, 4, 8))
            .unwrap()
            .dispatch(vec![TensorDescriptor::flat(10, DType::F32)])
            .unwrap();
        assert_eq!(launch.decision(), ExecutionDecision::fallback());
    }

    #[test]
    fn test_mismatched_operands_rejected() {
        let err = Launch::new(RuntimeConfig::default())
            .unwrap()
            .dispatch(vec![
                TensorDescriptor::flat(10, DType::F32),
                TensorDescriptor::flat(11, DType::F32),
            ])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Tensor(_)));
    }

    #[test]
    fn test_no_operands_rejected() {
        let err = Launch::new(RuntimeConfig::default())
            .unwrap()
            .dispatch(Vec::new())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Capability(_)));
    }

    #[test]
    fn test_policy_from_config() {
        let mut c = config(revision::GEN2, 8, 16);
        c.split_policy = "remainder-last".into();
        let launch = ready(c, vec![TensorDescriptor::flat(100, DType::F32)]);
        assert_eq!(launch.plan().policy_name, "remainder-last");
        assert_eq!(launch.plan().units[0].element_count, 12);
    }

    #[tokio::test]
    async fn test_run_accelerated() {
        let launch = ready(
            config(revision::GEN2, 4, 8),
            vec![TensorDescriptor::flat(40, DType::I32)],
        );
        let kernel: Arc<dyn Kernel<i32>> = Arc::new(MapKernel::unary("inc", |x: i32| x + 1));
        let source: Arc<[i32]> = (0..40).collect();
        let out = launch.run(kernel, vec![source]).await.unwrap();

        assert_eq!(out.output, (1..41).collect::<Vec<_>>());
        assert_eq!(out.metrics.units.len(), 4);
        assert_eq!(out.metrics.total_tiles, 8);
    }

    #[tokio::test]
    async fn test_run_fallback() {
        let launch = ready(
            config(999, 4, 8),
            vec![TensorDescriptor::flat(40, DType::I32)],
        );
        let kernel: Arc<dyn Kernel<i32>> = Arc::new(MapKernel::unary("inc", |x: i32| x + 1));
        let source: Arc<[i32]> = (0..40).collect();
        let out = launch.run(kernel, vec![source]).await.unwrap();

        assert_eq!(out.output, (1..41).collect::<Vec<_>>());
        assert!(out.metrics.units.is_empty());
        assert_eq!(out.metrics.decision, ExecutionDecision::fallback());
    }

    #[tokio::test]
    async fn test_wrong_element_type_rejected() {
        let launch = ready(
            config(revision::GEN2, 4, 8),
            vec![TensorDescriptor::flat(4, DType::F32)],
        );
        let kernel: Arc<dyn Kernel<i32>> = Arc::new(MapKernel::unary("id", |x: i32| x));
        let source: Arc<[i32]> = vec![1, 2, 3, 4].into();
        let err = launch.run(kernel, vec![source]).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Tensor(TensorError::DTypeMismatch { .. })));
    }

    #[test]
    fn test_debug_format() {
        let launch = Launch::new(RuntimeConfig::default()).unwrap();
        let debug = format!("{launch:?}");
        assert!(debug.contains("Launch"));
        assert!(debug.contains("Idle"));
    }
}
