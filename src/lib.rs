// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! irqarb: A priority interrupt arbitration core
//!
//! This crate models a clocked interrupt controller that aggregates N request
//! lines, grants one of them per arbitration round by programmable priority,
//! prevents starvation by aging waiting sources, and is configured through a
//! memory-mapped register file.
//!
//! # Architecture
//!
//! - [`core::interrupt`](crate::core::interrupt): arbitration units (RequestLatch, MaskUnit, PriorityTable,
//!   AgingMonitor, Arbiter, VectorTable, ServiceController)
//! - [`core::registers`](crate::core::registers): register map and staged configuration writes
//! - [`core::controller`](crate::core::controller): [`InterruptController`], config, save states and scenarios
//! - [`core::bus`](crate::core::bus): the [`IODevice`](crate::core::bus::IODevice) trait
//!
//! # Example
//!
//! ```
//! use irqarb::{ControllerConfig, InterruptController, TickInputs};
//!
//! let mut ic = InterruptController::new(ControllerConfig {
//!     sources: 2,
//!     mask: 0b11,
//!     priorities: vec![0, 7],
//!     ..Default::default()
//! })?;
//!
//! let out = ic.tick(TickInputs::requests(0b11));
//! assert_eq!(out.interrupt_id, 1);
//! # Ok::<(), irqarb::ControllerError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`](crate::core::error::Result) which is an alias for
//! `Result<T, ControllerError>`. Rejected register writes and spurious
//! acknowledgments are also recorded as diagnostics on the controller.

pub mod core;

// Re-export commonly used types
pub use crate::core::controller::{ControllerConfig, InterruptController, ResetKind, TickInputs};
pub use crate::core::error::{ControllerError, Result};
pub use crate::core::interrupt::{ServiceSignals, SourceId, SourceSet};
