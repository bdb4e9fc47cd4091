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

//! Priority Interrupt Arbitration Units
//!
//! The building blocks of the arbitration core, leaf first:
//!
//! ```text
//! raw requests ─▶ RequestLatch ─▶ MaskUnit ─▶ Arbiter ─▶ VectorTable ─▶ ServiceController ─▶ consumer
//!                                               ▲   ▲
//!                                 PriorityTable ┘   └ AgingMonitor
//! ```
//!
//! - [`RequestLatch`]: edge/level sampling into the pending set
//! - [`visible`]: mask filter (pure)
//! - [`PriorityTable`]: base priorities and the override slot
//! - [`AgingMonitor`]: wait counters and the pluggable [`AgingPolicy`]
//! - [`Arbiter`] / [`pick_winner`]: one grant per round, lowest id wins ties
//! - [`VectorTable`]: dispatch addresses, copied into the grant
//! - [`ServiceController`]: valid/id/vector outputs and acknowledgment
//!
//! The units are wired together and clocked by
//! [`InterruptController`](crate::core::controller::InterruptController).

mod aging;
mod arbiter;
mod diagnostics;
mod latch;
mod mask;
mod priority;
mod service;
mod source;
mod vector;

pub use aging::{AgingMonitor, AgingPolicy, AgingPolicyKind, LinearBoost, SourceIdBoost};
pub use arbiter::{pick_winner, ActiveService, Arbiter, ArbiterState};
pub use diagnostics::{Diagnostic, DiagnosticEvent, DiagnosticLog};
pub use latch::RequestLatch;
pub use mask::visible;
pub use priority::{PriorityOverride, PriorityTable, MAX_PRIORITY};
pub use service::{ServiceController, ServiceSignals, ServiceStats};
pub use source::{SourceId, SourceSet, MAX_SOURCES};
pub use vector::{VectorTable, VECTOR_MASK};
