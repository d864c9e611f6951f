// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Runs element-wise kernels across an accelerator's execution units.
//!
//! The runtime takes:
//! - operand descriptors, checked by `capability` to pick the accelerated
//!   or fallback path;
//! - a `TilingPlan` and its packed `TilingRecord` from `tiling-planner`;
//! - per-unit `StagingQueue`s from `staging`.
//!
//! And executes every active unit as a [`KernelPipeline`] on a simulated
//! [`Device`], or the whole range on a [`FallbackExecutor`].
//!
//! # Type-State Launch
//! ```text
//! Launch<Idle> → Launch<Dispatched> → Launch<Ready>
//! ```
//! Transitions are compile-time checked.
//!
//! # Async Execution
//! Units are tokio tasks. Within a unit, stage-in, compute and stage-out
//! are futures that hand tiles over through depth-2 staging queues.

mod config;
mod device;
mod error;
mod fallback;
mod kernel;
mod launch;
mod metrics;
mod pipeline;

pub use config::RuntimeConfig;
pub use device::{Device, DeviceOutput, InvocationHandle, InvocationStatus, Workspace};
pub use error::RuntimeError;
pub use fallback::{FallbackExecutor, HostFallback};
pub use kernel::{Kernel, KernelRegistry, MapKernel, OpId};
pub use launch::{Dispatched, Idle, Launch, LaunchOutput, LaunchState, Ready};
pub use metrics::{InvocationMetrics, UnitMetrics};
pub use pipeline::KernelPipeline;
