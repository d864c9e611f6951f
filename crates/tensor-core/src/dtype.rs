// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element data types and compact dtype sets.

use crate::TensorError;
use std::fmt;

/// Enumerates the element types an accelerator operand can carry.
///
/// The dispatcher uses `DType` to decide whether an operand can run on the
/// accelerated path, and the planner uses its size to align staging tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 16-bit IEEE 754 floating point.
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 64-bit IEEE 754 floating point.
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// One byte per element, `0` or `1`.
    Bool,
    /// Pair of `f32` (real, imaginary).
    Complex64,
}

impl DType {
    /// Every dtype, in declaration order.
    pub const ALL: [DType; 14] = [
        DType::F32,
        DType::F16,
        DType::BF16,
        DType::F64,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::U8,
        DType::U16,
        DType::U32,
        DType::U64,
        DType::Bool,
        DType::Complex64,
    ];

    /// Returns the size of a single element in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            DType::I8 | DType::U8 | DType::Bool => 1,
            DType::F16 | DType::BF16 | DType::I16 | DType::U16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 | DType::I64 | DType::U64 | DType::Complex64 => 8,
        }
    }

    /// Returns a human-readable label for this data type.
    pub const fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F64 => "f64",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::U8 => "u8",
            DType::U16 => "u16",
            DType::U32 => "u32",
            DType::U64 => "u64",
            DType::Bool => "bool",
            DType::Complex64 => "complex64",
        }
    }

    /// Stable numeric key selecting the per-dtype kernel entry point.
    ///
    /// Keys start at 1; 0 is reserved for "no accelerated entry point".
    pub const fn tiling_key(self) -> u32 {
        self as u32 + 1
    }

    /// Bit used for this dtype inside a [`DTypeSet`].
    const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Parses a dtype label such as `"f32"` or `"bf16"` (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, TensorError> {
        let lower = s.trim().to_ascii_lowercase();
        DType::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| TensorError::UnknownDType(s.to_string()))
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DType::parse(s)
    }
}

/// A set of dtypes packed into a bitmask.
///
/// Constructible in `const` context so support tables can live in statics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DTypeSet(u32);

impl DTypeSet {
    /// The empty set.
    pub const EMPTY: DTypeSet = DTypeSet(0);

    /// Builds a set from a slice of dtypes.
    pub const fn from_slice(dtypes: &[DType]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < dtypes.len() {
            bits |= dtypes[i].bit();
            i += 1;
        }
        DTypeSet(bits)
    }

    /// Returns a copy of this set with `dtype` added.
    pub const fn with(self, dtype: DType) -> Self {
        DTypeSet(self.0 | dtype.bit())
    }

    /// Returns the union of two sets.
    pub const fn union(self, other: DTypeSet) -> Self {
        DTypeSet(self.0 | other.0)
    }

    /// Returns `true` if `dtype` is a member.
    pub const fn contains(self, dtype: DType) -> bool {
        self.0 & dtype.bit() != 0
    }

    /// Number of dtypes in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = DType> {
        DType::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl fmt::Debug for DTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for DTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().map(DType::as_str).collect();
        write!(f, "{{{}}}", labels.join(", "))
    }
}

impl FromIterator<DType> for DTypeSet {
    fn from_iter<I: IntoIterator<Item = DType>>(iter: I) -> Self {
        iter.into_iter().fold(DTypeSet::EMPTY, DTypeSet::with)
    }
}

impl serde::Serialize for DTypeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes() {
        assert_eq!(DType::F32.size_bytes(), 4);
        assert_eq!(DType::BF16.size_bytes(), 2);
        assert_eq!(DType::Bool.size_bytes(), 1);
        assert_eq!(DType::Complex64.size_bytes(), 8);
    }

    #[test]
    fn test_parse() {
        assert_eq!(DType::parse("f32").unwrap(), DType::F32);
        assert_eq!(DType::parse(" BF16 ").unwrap(), DType::BF16);
        assert_eq!("complex64".parse::<DType>().unwrap(), DType::Complex64);
        assert!(matches!(DType::parse("f8"), Err(TensorError::UnknownDType(_))));
    }

    #[test]
    fn test_tiling_keys_are_unique_and_nonzero() {
        let mut keys: Vec<u32> = DType::ALL.iter().map(|d| d.tiling_key()).collect();
        assert!(keys.iter().all(|&k| k > 0));
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), DType::ALL.len());
    }

    #[test]
    fn test_dtype_set() {
        const SET: DTypeSet = DTypeSet::from_slice(&[DType::F32, DType::I32]);
        assert!(SET.contains(DType::F32));
        assert!(SET.contains(DType::I32));
        assert!(!SET.contains(DType::BF16));
        assert_eq!(SET.len(), 2);

        let wider = SET.with(DType::BF16);
        assert!(wider.contains(DType::BF16));
        assert_eq!(wider.union(DTypeSet::EMPTY), wider);
        assert!(DTypeSet::EMPTY.is_empty());
    }

    #[test]
    fn test_dtype_set_display_and_collect() {
        let set: DTypeSet = [DType::I8, DType::F32].into_iter().collect();
        assert_eq!(format!("{set}"), "{f32, i8}");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["f32","i8"]"#);
    }
}
