// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the kernel runtime.

use std::time::Duration;
use tensor_core::DType;

/// Errors that can occur while planning, dispatching or running a kernel.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Operand data does not match its descriptor.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// Capability lookup failed.
    #[error("capability error: {0}")]
    Capability(#[from] capability::CapabilityError),

    /// The tiling planner rejected the invocation.
    #[error("planner error: {0}")]
    Planner(#[from] tiling_planner::PlannerError),

    /// A staging queue failed (overflow, leak).
    #[error("staging error: {0}")]
    Staging(#[from] staging::StagingError),

    /// No kernel registered for this operator and dtype.
    #[error("no kernel registered for '{op}' on {dtype}")]
    UnknownKernel { op: String, dtype: DType },

    /// The device rejected the launch, or a unit failed after launch.
    #[error("dispatch failure: {0}")]
    DispatchFailure(String),

    /// The caller stopped waiting for an invocation.
    #[error("invocation did not complete within {waited:?}")]
    Timeout { waited: Duration },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
