// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for capability lookup and dispatch.

use crate::RevisionRange;

/// Configuration errors raised by the capability layer.
///
/// All of these are detected host-side before any device work is issued.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The hardware revision has no row in the support table.
    #[error("hardware revision {revision} is not present in the capability table")]
    UnknownRevision { revision: u32 },

    /// Dispatch was requested with no operands to inspect.
    #[error("capability query needs at least one operand")]
    NoOperands,

    /// Two table rows claim the same revision.
    #[error("capability rows '{first}' {first_range} and '{second}' {second_range} overlap")]
    OverlappingRows {
        first: String,
        first_range: RevisionRange,
        second: String,
        second_range: RevisionRange,
    },

    /// A row's range ends before it starts.
    #[error("capability row '{row}' has an empty revision range {range}")]
    EmptyRange { row: String, range: RevisionRange },

    /// A hardware profile field is out of range.
    #[error("invalid hardware profile: {0}")]
    InvalidProfile(String),
}
