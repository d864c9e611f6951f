// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # capability
//!
//! Decides, per invocation, whether operands can run on the accelerator's
//! core array or must go to the fallback co-processor.
//!
//! # Key Components
//!
//! - [`HardwareProfile`]: revision id, unit count and staging capacity of
//!   the active part. Threaded explicitly through every call.
//! - [`CapabilitySupportTable`]: read-only revision → dtype-set table with
//!   range rows, so a family of revisions shares one entry.
//! - [`CapabilityDispatcher`]: pure function from operands + profile to an
//!   [`ExecutionDecision`].
//!
//! ```text
//! operands ──┐
//!            ├──► CapabilityDispatcher ──► ExecutionDecision
//! profile ───┘         │                    { Accelerated | Fallback,
//!                      ▼                      entry point }
//!            CapabilitySupportTable
//! ```

mod dispatcher;
mod error;
mod profile;
mod table;

pub use dispatcher::{CapabilityDispatcher, EntryPointId, ExecutionDecision, ExecutionPath};
pub use error::CapabilityError;
pub use profile::{revision, HardwareProfile};
pub use table::{CapabilitySupportTable, RevisionRange, TableRow, REPRESENTATIVE_ROWS};
