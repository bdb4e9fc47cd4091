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

//! Diagnostic events
//!
//! Rejected operations never change controller state. Each one is recorded
//! here so a caller that ignored the returned error can still observe it.

use crate::core::error::ControllerError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Non-fatal condition detected by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    OutOfRangeSource {
        id: u32,
        sources: u8,
    },
    SpuriousAck {
        requested: Option<u8>,
        active: Option<u8>,
    },
    InvalidOperation {
        offset: u32,
        reason: String,
    },
}

impl Diagnostic {
    /// Diagnostic counterpart of a controller error, if it has one
    pub fn from_error(err: &ControllerError) -> Option<Self> {
        match err {
            ControllerError::OutOfRangeSource { id, sources } => Some(Diagnostic::OutOfRangeSource {
                id: *id,
                sources: *sources,
            }),
            ControllerError::SpuriousAck { requested, active } => Some(Diagnostic::SpuriousAck {
                requested: *requested,
                active: *active,
            }),
            ControllerError::InvalidOperation { offset, reason } => {
                Some(Diagnostic::InvalidOperation {
                    offset: *offset,
                    reason: (*reason).to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Diagnostic stamped with the tick it was raised in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub tick: u64,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Bounded FIFO of diagnostics; the oldest entry is dropped when full
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    events: VecDeque<DiagnosticEvent>,
    capacity: usize,
    dropped: u64,
}

impl DiagnosticLog {
    /// Create an empty log holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Record a diagnostic raised at `tick`
    pub fn push(&mut self, tick: u64, diagnostic: Diagnostic) {
        log::warn!("Diagnostic at tick {}: {:?}", tick, diagnostic);
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(DiagnosticEvent { tick, diagnostic });
    }

    /// Take every recorded event, oldest first
    pub fn drain(&mut self) -> Vec<DiagnosticEvent> {
        self.events.drain(..).collect()
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if no events are held
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events lost to overflow since construction
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
