// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor descriptors.

use crate::{DType, Shape};

/// Errors raised while building or checking tensor descriptors.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A dtype label could not be parsed.
    #[error("unknown dtype '{0}'")]
    UnknownDType(String),

    /// A layout tag could not be parsed.
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    /// Host data does not match the descriptor's element count.
    #[error("element count mismatch for {shape}: expected {expected}, got {actual}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// Host data type does not match the descriptor's dtype.
    #[error("dtype mismatch: descriptor is {expected}, data is {actual}")]
    DTypeMismatch { expected: DType, actual: DType },
}
