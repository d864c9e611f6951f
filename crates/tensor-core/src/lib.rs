// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Operand descriptions shared by every tile-rt crate.
//!
//! This crate provides:
//! - [`TensorDescriptor`]: extents, dtype and layout tag of one operand.
//! - [`Shape`]: per-dimension extents.
//! - [`DType`] / [`DTypeSet`]: element data types and const-buildable
//!   dtype sets used by capability tables.
//! - [`Layout`]: layout tags carried through dispatch.
//! - [`Element`]: binds host scalars (`f32`, `i32`, ...) to their dtype.
//!
//! Nothing here touches data; descriptors are cheap, immutable values
//! owned by the caller.

mod descriptor;
mod dtype;
mod element;
mod error;
mod shape;

pub use descriptor::{Layout, TensorDescriptor};
pub use dtype::{DType, DTypeSet};
pub use element::Element;
pub use error::TensorError;
pub use shape::Shape;
