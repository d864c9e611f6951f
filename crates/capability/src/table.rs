// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static revision → supported-dtype table.
//!
//! Closely related revisions share one row: each row covers an inclusive
//! range of revision ids, and lookup is a range search rather than one
//! entry per revision.
//!
//! ```text
//!  revision   100 ──── 199   200 ── 201   300
//!  row        gen1           gen2         gen3
//! ```

use crate::profile::revision;
use crate::CapabilityError;
use std::borrow::Cow;
use std::fmt;
use tensor_core::{DType, DTypeSet};

/// An inclusive range of hardware revision ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RevisionRange {
    pub first: u32,
    pub last: u32,
}

impl RevisionRange {
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// A range holding exactly one revision.
    pub const fn single(revision: u32) -> Self {
        Self {
            first: revision,
            last: revision,
        }
    }

    pub const fn contains(&self, revision: u32) -> bool {
        self.first <= revision && revision <= self.last
    }

    fn overlaps(&self, other: &RevisionRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "[{}]", self.first)
        } else {
            write!(f, "[{}..={}]", self.first, self.last)
        }
    }
}

/// One row: a family of revisions and the dtypes its cores accelerate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TableRow {
    pub name: Cow<'static, str>,
    pub revisions: RevisionRange,
    pub supported: DTypeSet,
}

impl TableRow {
    pub const fn new(name: &'static str, revisions: RevisionRange, supported: DTypeSet) -> Self {
        Self {
            name: Cow::Borrowed(name),
            revisions,
            supported,
        }
    }
}

const GEN1_DTYPES: DTypeSet = DTypeSet::from_slice(&[
    DType::F32,
    DType::F16,
    DType::F64,
    DType::I8,
    DType::I16,
    DType::I32,
    DType::I64,
    DType::U8,
    DType::U16,
    DType::U32,
    DType::U64,
]);

const GEN2_DTYPES: DTypeSet = GEN1_DTYPES.with(DType::BF16);

const GEN3_DTYPES: DTypeSet = GEN2_DTYPES.with(DType::Bool);

/// The representative table shipped with the runtime.
pub const REPRESENTATIVE_ROWS: &[TableRow] = &[
    TableRow::new("gen1", RevisionRange::new(revision::GEN1, 199), GEN1_DTYPES),
    TableRow::new(
        "gen2",
        RevisionRange::new(revision::GEN2, revision::GEN2_REFRESH),
        GEN2_DTYPES,
    ),
    TableRow::new("gen3", RevisionRange::single(revision::GEN3), GEN3_DTYPES),
];

/// Read-only mapping from hardware revision to supported dtypes.
///
/// The table is immutable after construction and safe to share across
/// threads without locking.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapabilitySupportTable {
    rows: Cow<'static, [TableRow]>,
}

impl CapabilitySupportTable {
    /// Builds a table from rows, rejecting empty or overlapping ranges.
    pub fn new(rows: Vec<TableRow>) -> Result<Self, CapabilityError> {
        Self::check_rows(&rows)?;
        Ok(Self {
            rows: Cow::Owned(rows),
        })
    }

    /// The shipped three-row table.
    pub fn representative() -> Self {
        Self {
            rows: Cow::Borrowed(REPRESENTATIVE_ROWS),
        }
    }

    /// Finds the row covering `revision`.
    pub fn lookup(&self, revision: u32) -> Result<&TableRow, CapabilityError> {
        self.rows
            .iter()
            .find(|row| row.revisions.contains(revision))
            .ok_or(CapabilityError::UnknownRevision { revision })
    }

    /// Returns `true` if `revision` accelerates `dtype`.
    pub fn supports(&self, revision: u32, dtype: DType) -> Result<bool, CapabilityError> {
        Ok(self.lookup(revision)?.supported.contains(dtype))
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    fn check_rows(rows: &[TableRow]) -> Result<(), CapabilityError> {
        for (i, row) in rows.iter().enumerate() {
            if row.revisions.first > row.revisions.last {
                return Err(CapabilityError::EmptyRange {
                    row: row.name.to_string(),
                    range: row.revisions,
                });
            }
            for other in &rows[i + 1..] {
                if row.revisions.overlaps(&other.revisions) {
                    return Err(CapabilityError::OverlappingRows {
                        first: row.name.to_string(),
                        first_range: row.revisions,
                        second: other.name.to_string(),
                        second_range: other.revisions,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for CapabilitySupportTable {
    fn default() -> Self {
        Self::representative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representative_rows_are_consistent() {
        CapabilitySupportTable::check_rows(REPRESENTATIVE_ROWS).unwrap();
    }

    #[test]
    fn test_family_shares_row() {
        let table = CapabilitySupportTable::representative();
        let a = table.lookup(revision::GEN2).unwrap();
        let b = table.lookup(revision::GEN2_REFRESH).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "gen2");
    }

    #[test]
    fn test_range_lookup_inside_family() {
        let table = CapabilitySupportTable::representative();
        assert_eq!(table.lookup(150).unwrap().name, "gen1");
        assert_eq!(table.lookup(199).unwrap().name, "gen1");
    }

    #[test]
    fn test_unknown_revision() {
        let table = CapabilitySupportTable::representative();
        assert!(matches!(
            table.lookup(250),
            Err(CapabilityError::UnknownRevision { revision: 250 })
        ));
        assert!(table.supports(999, DType::F32).is_err());
    }

    #[test]
    fn test_bf16_support_by_generation() {
        let table = CapabilitySupportTable::representative();
        assert!(!table.supports(revision::GEN1, DType::BF16).unwrap());
        assert!(table.supports(revision::GEN2, DType::BF16).unwrap());
        assert!(!table.supports(revision::GEN2, DType::Bool).unwrap());
        assert!(table.supports(revision::GEN3, DType::Bool).unwrap());
        assert!(!table.supports(revision::GEN3, DType::Complex64).unwrap());
    }

    #[test]
    fn test_new_rejects_overlap() {
        let rows = vec![
            TableRow::new("a", RevisionRange::new(1, 10), GEN1_DTYPES),
            TableRow::new("b", RevisionRange::new(10, 20), GEN2_DTYPES),
        ];
        assert!(matches!(
            CapabilitySupportTable::new(rows),
            Err(CapabilityError::OverlappingRows { .. })
        ));
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let rows = vec![TableRow::new("a", RevisionRange::new(10, 1), GEN1_DTYPES)];
        assert!(matches!(
            CapabilitySupportTable::new(rows),
            Err(CapabilityError::EmptyRange { .. })
        ));
    }

    #[test]
    fn test_custom_table() {
        let rows = vec![TableRow {
            name: Cow::Owned("lab".to_string()),
            revisions: RevisionRange::single(7),
            supported: DTypeSet::from_slice(&[DType::I8]),
        }];
        let table = CapabilitySupportTable::new(rows).unwrap();
        assert!(table.supports(7, DType::I8).unwrap());
        assert!(!table.supports(7, DType::F32).unwrap());
    }

    #[test]
    fn test_range_display() {
        assert_eq!(RevisionRange::single(3).to_string(), "[3]");
        assert_eq!(RevisionRange::new(1, 4).to_string(), "[1..=4]");
    }
}
