// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Staging capacity configuration and parsing.
//!
//! A [`StagingCapacity`] is the number of elements one staging slot holds.
//! It parses human-readable counts so config files can say `"16K"`.

use crate::StagingError;
use std::fmt;

const K: usize = 1024;
const M: usize = 1024 * 1024;

/// Per-slot staging capacity, in elements.
///
/// # Parsing
/// - `"16K"` → 16 × 1024 elements
/// - `"1M"` → 1024² elements
/// - `"4000"` → 4000 elements
///
/// # Examples
/// ```
/// use staging::StagingCapacity;
///
/// let c = StagingCapacity::parse("16K").unwrap();
/// assert_eq!(c.elements(), 16 * 1024);
/// assert_eq!(c.to_string(), "16K");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StagingCapacity {
    elements: usize,
}

impl StagingCapacity {
    /// 16K elements.
    pub const DEFAULT: Self = Self { elements: 16 * K };

    /// Creates a capacity from an element count.
    pub fn from_elements(elements: usize) -> Result<Self, StagingError> {
        if elements == 0 {
            return Err(StagingError::InvalidCapacity(
                "capacity must be at least 1 element".into(),
            ));
        }
        Ok(Self { elements })
    }

    /// Returns the capacity in elements.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Parses a human-readable element count. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, StagingError> {
        let s = s.trim();
        let upper = s.to_uppercase();
        let (digits, multiplier) = if upper.ends_with('K') {
            (&s[..s.len() - 1], K)
        } else if upper.ends_with('M') {
            (&s[..s.len() - 1], M)
        } else {
            (s, 1)
        };

        let value: usize = digits.trim().parse().map_err(|_| {
            StagingError::InvalidCapacity(format!(
                "'{s}': expected an element count with an optional K or M suffix"
            ))
        })?;
        let elements = value
            .checked_mul(multiplier)
            .ok_or_else(|| StagingError::InvalidCapacity(format!("'{s}' overflows")))?;
        Self::from_elements(elements)
    }
}

impl Default for StagingCapacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StagingCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements % M == 0 {
            write!(f, "{}M", self.elements / M)
        } else if self.elements % K == 0 {
            write!(f, "{}K", self.elements / K)
        } else {
            write!(f, "{}", self.elements)
        }
    }
}

impl std::str::FromStr for StagingCapacity {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for StagingCapacity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for StagingCapacity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Config files may give either `"16K"` or a bare integer.
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(usize),
            Text(String),
        }

        let capacity = match Repr::deserialize(deserializer)? {
            Repr::Count(n) => Self::from_elements(n),
            Repr::Text(s) => Self::parse(&s),
        };
        capacity.map_err(serde::de::Error::custom)
    }
}
