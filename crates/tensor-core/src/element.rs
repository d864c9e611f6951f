// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Binding between host scalar types and [`DType`].

use crate::DType;

/// A host scalar that can be staged through an accelerator pipeline.
///
/// Kernels and pipelines are generic over `Element`; the associated
/// [`DType`] lets runtime dispatch tables look kernels up by dtype.
pub trait Element: Copy + Default + PartialEq + PartialOrd + Send + Sync + std::fmt::Debug + 'static {
    /// The dtype this scalar represents.
    const DTYPE: DType;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for i8 {
    const DTYPE: DType = DType::I8;
}

impl Element for i16 {
    const DTYPE: DType = DType::I16;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
}

impl Element for u16 {
    const DTYPE: DType = DType::U16;
}

impl Element for u32 {
    const DTYPE: DType = DType::U32;
}

impl Element for u64 {
    const DTYPE: DType = DType::U64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_agree_with_dtype() {
        fn check<T: Element>() {
            assert_eq!(std::mem::size_of::<T>(), T::DTYPE.size_bytes(), "{}", T::DTYPE);
        }
        check::<f32>();
        check::<f64>();
        check::<i8>();
        check::<i16>();
        check::<i32>();
        check::<i64>();
        check::<u8>();
        check::<u16>();
        check::<u32>();
        check::<u64>();
    }
}
