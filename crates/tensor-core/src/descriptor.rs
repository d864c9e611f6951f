// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operand descriptors handed to the dispatcher and planner.

use crate::{DType, Element, Shape, TensorError};
use std::fmt;

/// Memory layout tag of an operand.
///
/// The tag is carried through dispatch untouched; the element-wise tiling
/// core treats every operand as a flat, contiguous run of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Layout {
    /// Plain row-major, contiguous.
    #[default]
    #[serde(rename = "ND")]
    Nd,
    #[serde(rename = "NCHW")]
    Nchw,
    #[serde(rename = "NHWC")]
    Nhwc,
    /// Blocked fractal layout used by matrix units.
    #[serde(rename = "FRACTAL_NZ")]
    FractalNz,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Nd => "ND",
            Layout::Nchw => "NCHW",
            Layout::Nhwc => "NHWC",
            Layout::FractalNz => "FRACTAL_NZ",
        }
    }

    /// Parses a layout tag (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, TensorError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ND" => Ok(Layout::Nd),
            "NCHW" => Ok(Layout::Nchw),
            "NHWC" => Ok(Layout::Nhwc),
            "FRACTAL_NZ" | "NZ" => Ok(Layout::FractalNz),
            _ => Err(TensorError::UnknownLayout(s.to_string())),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one operand: extents, dtype and layout.
///
/// The descriptor is owned by the caller; dispatch and planning only
/// borrow it.
///
/// # Examples
/// ```
/// use tensor_core::{DType, Shape, TensorDescriptor};
/// let d = TensorDescriptor::new(Shape::new(vec![4, 25]), DType::F32);
/// assert_eq!(d.num_elements(), 100);
/// assert_eq!(d.size_bytes(), 400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TensorDescriptor {
    shape: Shape,
    dtype: DType,
    #[serde(default)]
    layout: Layout,
}

impl TensorDescriptor {
    /// Creates a row-major descriptor.
    pub fn new(shape: Shape, dtype: DType) -> Self {
        Self {
            shape,
            dtype,
            layout: Layout::Nd,
        }
    }

    /// Creates a flat 1-D descriptor of `len` elements.
    pub fn flat(len: usize, dtype: DType) -> Self {
        Self::new(Shape::vector(len), dtype)
    }

    /// Returns the same descriptor with a different layout tag.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Total element count across all extents.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Footprint of the operand in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }

    /// Checks that `data` can back this descriptor.
    pub fn check_data<T: Element>(&self, data: &[T]) -> Result<(), TensorError> {
        if T::DTYPE != self.dtype {
            return Err(TensorError::DTypeMismatch {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        if data.len() != self.num_elements() {
            return Err(TensorError::ElementCountMismatch {
                shape: self.shape.clone(),
                expected: self.num_elements(),
                actual: data.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} ({})", self.dtype, self.shape, self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_basics() {
        let d = TensorDescriptor::new(Shape::new(vec![2, 3, 4]), DType::F16)
            .with_layout(Layout::Nchw);
        assert_eq!(d.num_elements(), 24);
        assert_eq!(d.size_bytes(), 48);
        assert_eq!(d.layout(), Layout::Nchw);
        assert_eq!(format!("{d}"), "f16[2, 3, 4] (NCHW)");
    }

    #[test]
    fn test_check_data() {
        let d = TensorDescriptor::flat(3, DType::F32);
        d.check_data(&[1.0f32, 2.0, 3.0]).unwrap();
        assert!(matches!(
            d.check_data(&[1.0f32]),
            Err(TensorError::ElementCountMismatch { expected: 3, actual: 1, .. })
        ));
        assert!(matches!(
            d.check_data(&[1i32, 2, 3]),
            Err(TensorError::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!(Layout::parse("nd").unwrap(), Layout::Nd);
        assert_eq!(Layout::parse("NZ").unwrap(), Layout::FractalNz);
        assert!(Layout::parse("CHWN").is_err());
    }

    #[test]
    fn test_serde_default_layout() {
        let json = r#"{"shape":{"dims":[8]},"dtype":"i32"}"#;
        let d: TensorDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.layout(), Layout::Nd);
        assert_eq!(d.dtype(), DType::I32);
    }
}
