// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Accelerated-vs-fallback decision per invocation.

use crate::{CapabilityError, CapabilitySupportTable, HardwareProfile};
use std::fmt;
use tensor_core::{DType, TensorDescriptor};

/// Which execution route an invocation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPath {
    /// Run on the accelerator's core array.
    Accelerated,
    /// Run on the general-purpose co-processor.
    Fallback,
}

/// Identifies the kernel entry point selected for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntryPointId(pub u32);

impl EntryPointId {
    /// Entry point used for every fallback execution.
    pub const FALLBACK: EntryPointId = EntryPointId(0);

    /// The accelerated entry point specialised for `dtype`.
    pub const fn accelerated(dtype: DType) -> Self {
        EntryPointId(dtype.tiling_key())
    }

    pub const fn is_fallback(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EntryPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fallback() {
            f.write_str("fallback")
        } else {
            write!(f, "entry#{}", self.0)
        }
    }
}

/// The dispatcher's verdict for one invocation. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ExecutionDecision {
    pub path: ExecutionPath,
    pub entry_point: EntryPointId,
}

impl ExecutionDecision {
    /// A fallback decision.
    pub const fn fallback() -> Self {
        Self {
            path: ExecutionPath::Fallback,
            entry_point: EntryPointId::FALLBACK,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        self.path == ExecutionPath::Accelerated
    }
}

impl fmt::Display for ExecutionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self.path {
            ExecutionPath::Accelerated => "accelerated",
            ExecutionPath::Fallback => "fallback",
        };
        write!(f, "{path} via {}", self.entry_point)
    }
}

/// Pure capability check over a read-only support table.
///
/// # Example
/// ```
/// use capability::{CapabilityDispatcher, CapabilitySupportTable, HardwareProfile, revision};
/// use tensor_core::{DType, TensorDescriptor};
///
/// let table = CapabilitySupportTable::representative();
/// let profile = HardwareProfile::new(revision::GEN1, 8, 1024).unwrap();
/// let ops = [TensorDescriptor::flat(64, DType::BF16)];
/// let decision = CapabilityDispatcher::new(&table).decide(&ops, &profile).unwrap();
/// assert!(!decision.is_accelerated());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDispatcher<'t> {
    table: &'t CapabilitySupportTable,
}

impl<'t> CapabilityDispatcher<'t> {
    pub fn new(table: &'t CapabilitySupportTable) -> Self {
        Self { table }
    }

    /// Decides the execution path for `operands` on `profile`.
    ///
    /// Accelerated when every operand's dtype is in the revision's row;
    /// the entry point is specialised on the first operand's dtype.
    /// Fails with [`CapabilityError::UnknownRevision`] when the revision
    /// has no row.
    pub fn decide(
        &self,
        operands: &[TensorDescriptor],
        profile: &HardwareProfile,
    ) -> Result<ExecutionDecision, CapabilityError> {
        let primary = operands.first().ok_or(CapabilityError::NoOperands)?;
        let row = self.table.lookup(profile.revision())?;

        let unsupported: Vec<DType> = operands
            .iter()
            .map(TensorDescriptor::dtype)
            .filter(|d| !row.supported.contains(*d))
            .collect();

        if unsupported.is_empty() {
            let decision = ExecutionDecision {
                path: ExecutionPath::Accelerated,
                entry_point: EntryPointId::accelerated(primary.dtype()),
            };
            tracing::debug!(
                revision = profile.revision(),
                row = %row.name,
                "{} operand(s) supported → {decision}",
                operands.len(),
            );
            Ok(decision)
        } else {
            tracing::debug!(
                revision = profile.revision(),
                row = %row.name,
                "unsupported dtypes {unsupported:?} → fallback",
            );
            Ok(ExecutionDecision::fallback())
        }
    }

    /// Like [`decide`](Self::decide), but an unknown revision yields a
    /// fallback decision instead of an error.
    ///
    /// Other configuration errors (such as an empty operand list) are
    /// still returned.
    pub fn decide_or_fallback(
        &self,
        operands: &[TensorDescriptor],
        profile: &HardwareProfile,
    ) -> Result<ExecutionDecision, CapabilityError> {
        match self.decide(operands, profile) {
            Err(CapabilityError::UnknownRevision { revision }) => {
                tracing::warn!("revision {revision} missing from capability table; forcing fallback");
                Ok(ExecutionDecision::fallback())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision;

    fn profile(rev: u32) -> HardwareProfile {
        HardwareProfile::new(rev, 8, 1024).unwrap()
    }

    #[test]
    fn test_all_supported_is_accelerated() {
        let table = CapabilitySupportTable::representative();
        let ops = [
            TensorDescriptor::flat(16, DType::F32),
            TensorDescriptor::flat(16, DType::F32),
        ];
        let d = CapabilityDispatcher::new(&table)
            .decide(&ops, &profile(revision::GEN1))
            .unwrap();
        assert_eq!(d.path, ExecutionPath::Accelerated);
        assert_eq!(d.entry_point, EntryPointId::accelerated(DType::F32));
    }

    #[test]
    fn test_one_unsupported_operand_falls_back() {
        let table = CapabilitySupportTable::representative();
        let ops = [
            TensorDescriptor::flat(16, DType::F32),
            TensorDescriptor::flat(16, DType::Bool),
        ];
        let d = CapabilityDispatcher::new(&table)
            .decide(&ops, &profile(revision::GEN2))
            .unwrap();
        assert_eq!(d, ExecutionDecision::fallback());

        let d = CapabilityDispatcher::new(&table)
            .decide(&ops, &profile(revision::GEN3))
            .unwrap();
        assert!(d.is_accelerated());
    }

    #[test]
    fn test_entry_point_follows_primary_operand() {
        let table = CapabilitySupportTable::representative();
        let ops = [
            TensorDescriptor::flat(4, DType::I32),
            TensorDescriptor::flat(4, DType::F32),
        ];
        let d = CapabilityDispatcher::new(&table)
            .decide(&ops, &profile(revision::GEN2))
            .unwrap();
        assert_eq!(d.entry_point, EntryPointId::accelerated(DType::I32));
    }

    #[test]
    fn test_unknown_revision_is_configuration_error() {
        let table = CapabilitySupportTable::representative();
        let ops = [TensorDescriptor::flat(4, DType::F32)];
        let dispatcher = CapabilityDispatcher::new(&table);

        assert!(matches!(
            dispatcher.decide(&ops, &profile(42)),
            Err(CapabilityError::UnknownRevision { revision: 42 })
        ));
        assert_eq!(
            dispatcher.decide_or_fallback(&ops, &profile(42)).unwrap(),
            ExecutionDecision::fallback()
        );
    }

    #[test]
    fn test_no_operands() {
        let table = CapabilitySupportTable::representative();
        let dispatcher = CapabilityDispatcher::new(&table);
        assert!(matches!(
            dispatcher.decide(&[], &profile(revision::GEN1)),
            Err(CapabilityError::NoOperands)
        ));
        assert!(dispatcher
            .decide_or_fallback(&[], &profile(revision::GEN1))
            .is_err());
    }

    #[test]
    fn test_decision_is_pure() {
        let table = CapabilitySupportTable::representative();
        let ops = [TensorDescriptor::flat(4, DType::BF16)];
        let dispatcher = CapabilityDispatcher::new(&table);
        let first = dispatcher.decide(&ops, &profile(revision::GEN2)).unwrap();
        for _ in 0..10 {
            assert_eq!(dispatcher.decide(&ops, &profile(revision::GEN2)).unwrap(), first);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ExecutionDecision::fallback().to_string(), "fallback via fallback");
        let d = ExecutionDecision {
            path: ExecutionPath::Accelerated,
            entry_point: EntryPointId(3),
        };
        assert_eq!(d.to_string(), "accelerated via entry#3");
    }

    #[test]
    fn test_decision_json() {
        let d = ExecutionDecision {
            path: ExecutionPath::Accelerated,
            entry_point: EntryPointId(3),
        };
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["path"], "accelerated");
        assert_eq!(json["entry_point"], 3);

        let path: ExecutionPath = serde_json::from_str("\"fallback\"").unwrap();
        assert_eq!(path, ExecutionPath::Fallback);
        assert!(serde_json::from_str::<ExecutionPath>("\"Fallback\"").is_err());
    }
}
