// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operand extents.

use crate::DType;
use std::fmt;

/// Per-dimension extents of an operand.
///
/// The tiling core only reads the flattened element count; extents are
/// carried through dispatch for callers and error messages.
///
/// ```
/// use tensor_core::Shape;
/// let s = Shape::new(vec![2, 3, 4]);
/// assert_eq!(s.num_elements(), 24);
/// assert_eq!(s.to_string(), "[2, 3, 4]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    extents: Vec<usize>,
}

impl Shape {
    pub fn new(extents: Vec<usize>) -> Self {
        Self { extents }
    }

    /// A flat run of `len` elements.
    pub fn vector(len: usize) -> Self {
        Self {
            extents: vec![len],
        }
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Product of the extents; 1 for a rank-0 shape.
    pub fn num_elements(&self) -> usize {
        self.extents.iter().product()
    }

    /// Bytes needed to hold every element as `dtype`.
    pub fn size_bytes(&self, dtype: DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.extents.iter().map(usize::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl From<Vec<usize>> for Shape {
    fn from(extents: Vec<usize>) -> Self {
        Self::new(extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_zero_is_one_element() {
        let s = Shape::new(Vec::new());
        assert_eq!(s.num_elements(), 1);
        assert_eq!(s.to_string(), "[]");
    }

    #[test]
    fn test_zero_extent_is_empty() {
        assert_eq!(Shape::new(vec![4, 0, 3]).num_elements(), 0);
        assert_eq!(Shape::vector(0).num_elements(), 0);
    }

    #[test]
    fn test_size_bytes_follows_dtype() {
        let s: Shape = vec![10, 20].into();
        assert_eq!(s.extents(), &[10, 20]);
        assert_eq!(s.size_bytes(DType::F32), 800);
        assert_eq!(s.size_bytes(DType::BF16), 400);
        assert_eq!(s.size_bytes(DType::U8), 200);
    }
}
