// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise kernels and the runtime dispatch table.
//!
//! A [`Kernel`] is applied tile by tile, so it must be tile-separable:
//! output element `i` may depend only on input elements `i`.
//!
//! The [`KernelRegistry`] maps `(operator, dtype)` to a kernel. Kernels of
//! different element types live in one table, type-erased behind `Any`
//! and recovered through [`Element::DTYPE`].

use crate::RuntimeError;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tensor_core::{DType, DTypeSet, Element};

/// An element-wise computation over one tile.
pub trait Kernel<T: Element>: Send + Sync {
    /// Human-readable name (for logs and metrics).
    fn name(&self) -> &str;

    /// Number of source operands.
    fn arity(&self) -> usize;

    /// Computes `output` from `inputs`.
    ///
    /// `inputs.len() == self.arity()`, and every input slice has the same
    /// length as `output`.
    fn compute(&self, inputs: &[&[T]], output: &mut [T]);
}

type ElementFn<T> = dyn Fn(&[T]) -> T + Send + Sync;

/// A kernel built from a per-element closure.
///
/// # Example
/// ```
/// use runtime::{Kernel, MapKernel};
///
/// let add = MapKernel::binary("add", |a: i32, b: i32| a.wrapping_add(b));
/// let mut out = [0; 3];
/// add.compute(&[&[1, 2, 3], &[10, 20, 30]], &mut out);
/// assert_eq!(out, [11, 22, 33]);
/// ```
pub struct MapKernel<T: Element> {
    name: String,
    arity: usize,
    f: Box<ElementFn<T>>,
}

impl<T: Element> MapKernel<T> {
    /// Wraps a closure receiving one element from each of `arity` inputs.
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(&[T]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            f: Box::new(f),
        }
    }

    pub fn unary(name: impl Into<String>, f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        Self::new(name, 1, move |args| f(args[0]))
    }

    pub fn binary(
        name: impl Into<String>,
        f: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, 2, move |args| f(args[0], args[1]))
    }
}

impl<T: Element> Kernel<T> for MapKernel<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn compute(&self, inputs: &[&[T]], output: &mut [T]) {
        let mut args = Vec::with_capacity(self.arity);
        for (i, out) in output.iter_mut().enumerate() {
            args.clear();
            args.extend(inputs.iter().map(|lane| lane[i]));
            *out = (self.f)(&args);
        }
    }
}

impl<T: Element> fmt::Debug for MapKernel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapKernel")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("dtype", &T::DTYPE)
            .finish()
    }
}

// ── Dispatch table ─────────────────────────────────────────────

/// Operator identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub &'static str);

impl OpId {
    pub const COPY: OpId = OpId("copy");
    pub const MAXIMUM: OpId = OpId("maximum");
    pub const MINIMUM: OpId = OpId("minimum");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Runtime dispatch table keyed by `(operator, dtype)`.
#[derive(Default)]
pub struct KernelRegistry {
    kernels: HashMap<(OpId, DType), Box<dyn Any + Send + Sync>>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `copy`, `maximum` and `minimum` for every
    /// host element type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins::<f32>();
        registry.register_builtins::<f64>();
        registry.register_builtins::<i8>();
        registry.register_builtins::<i16>();
        registry.register_builtins::<i32>();
        registry.register_builtins::<i64>();
        registry.register_builtins::<u8>();
        registry.register_builtins::<u16>();
        registry.register_builtins::<u32>();
        registry.register_builtins::<u64>();
        registry
    }

    fn register_builtins<T: Element>(&mut self) {
        self.register::<T>(OpId::COPY, Arc::new(MapKernel::unary("copy", |x: T| x)));
        self.register::<T>(
            OpId::MAXIMUM,
            Arc::new(MapKernel::binary("maximum", |a: T, b: T| if b > a { b } else { a })),
        );
        self.register::<T>(
            OpId::MINIMUM,
            Arc::new(MapKernel::binary("minimum", |a: T, b: T| if b < a { b } else { a })),
        );
    }

    /// Registers `kernel` for `op` on `T::DTYPE`, replacing any previous one.
    pub fn register<T: Element>(&mut self, op: OpId, kernel: Arc<dyn Kernel<T>>) {
        tracing::trace!(op = %op, dtype = %T::DTYPE, "registering kernel '{}'", kernel.name());
        self.kernels.insert((op, T::DTYPE), Box::new(kernel));
    }

    /// Looks up the kernel for `op` on `T::DTYPE`.
    pub fn get<T: Element>(&self, op: OpId) -> Result<Arc<dyn Kernel<T>>, RuntimeError> {
        self.kernels
            .get(&(op, T::DTYPE))
            .and_then(|k| k.downcast_ref::<Arc<dyn Kernel<T>>>())
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownKernel {
                op: op.to_string(),
                dtype: T::DTYPE,
            })
    }

    /// Dtypes that have a kernel for `op`.
    pub fn dtypes(&self, op: OpId) -> DTypeSet {
        self.kernels
            .keys()
            .filter(|(o, _)| *o == op)
            .map(|(_, d)| *d)
            .collect()
    }

    /// Registered operators, sorted.
    pub fn ops(&self) -> Vec<OpId> {
        let mut ops: Vec<OpId> = self.kernels.keys().map(|(o, _)| *o).collect();
        ops.sort();
        ops.dedup();
        ops
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("ops", &self.ops())
            .field("kernels", &self.len())
            .finish()
    }
}
