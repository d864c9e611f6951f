// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fallback execution path.
//!
//! When the capability check rejects an invocation it runs through a
//! [`FallbackExecutor`] instead of the device. [`HostFallback`] is the host
//! reference: it applies the kernel once over the whole range, with no
//! tiling, and serves as the oracle the accelerated path is tested against.

use crate::{Kernel, RuntimeError};
use tensor_core::Element;

/// Runs a kernel off the accelerator.
pub trait FallbackExecutor<T: Element>: Send + Sync {
    /// Executor name (for logs).
    fn name(&self) -> &str;

    /// Computes `destination` from `sources` with `kernel`.
    fn execute(
        &self,
        kernel: &dyn Kernel<T>,
        sources: &[&[T]],
        destination: &mut [T],
    ) -> Result<(), RuntimeError>;
}

/// Single-pass host implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFallback;

impl<T: Element> FallbackExecutor<T> for HostFallback {
    fn name(&self) -> &str {
        "host"
    }

    fn execute(
        &self,
        kernel: &dyn Kernel<T>,
        sources: &[&[T]],
        destination: &mut [T],
    ) -> Result<(), RuntimeError> {
        if sources.len() != kernel.arity() {
            return Err(RuntimeError::DispatchFailure(format!(
                "kernel '{}' takes {} operand(s), got {}",
                kernel.name(),
                kernel.arity(),
                sources.len()
            )));
        }
        if let Some(bad) = sources.iter().find(|s| s.len() != destination.len()) {
            return Err(RuntimeError::DispatchFailure(format!(
                "source has {} elements, destination {}",
                bad.len(),
                destination.len()
            )));
        }
        tracing::debug!(
            kernel = kernel.name(),
            elements = destination.len(),
            "running on host fallback"
        );
        kernel.compute(sources, destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapKernel;

    #[test]
    fn test_host_fallback() {
        let k: &dyn Kernel<f64> = &MapKernel::binary("sub", |a: f64, b: f64| a - b);
        let mut out = [0.0; 3];
        HostFallback
            .execute(k, &[&[5.0, 6.0, 7.0], &[1.0, 1.0, 1.0]], &mut out)
            .unwrap();
        assert_eq!(out, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let k: &dyn Kernel<u8> = &MapKernel::unary("id", |a: u8| a);
        let mut out = [0u8; 2];
        assert!(HostFallback.execute(k, &[&[1, 2, 3]], &mut out).is_err());
    }

    #[test]
    fn test_arity_mismatch() {
        let k: &dyn Kernel<u8> = &MapKernel::unary("id", |a: u8| a);
        let mut out = [0u8; 1];
        assert!(HostFallback.execute(k, &[&[1], &[2]], &mut out).is_err());
    }

    #[test]
    fn test_empty_range() {
        let k: &dyn Kernel<i64> = &MapKernel::unary("id", |a: i64| a);
        let mut out: [i64; 0] = [];
        HostFallback.execute(k, &[&[]], &mut out).unwrap();
    }
}
