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

//! Service controller
//!
//! Consumer-facing side of the arbiter. Translates the arbiter state into the
//! `interrupt_valid / interrupt_id / interrupt_vector` outputs and is the only
//! path through which acknowledgments reach the arbiter.

use super::aging::AgingMonitor;
use super::arbiter::{ActiveService, Arbiter, ArbiterState};
use super::latch::RequestLatch;
use super::source::{SourceId, SourceSet};
use super::vector::VectorTable;
use crate::core::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};

/// Signals presented to the consumer after a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSignals {
    /// A grant is waiting for acknowledgment
    pub interrupt_valid: bool,

    /// Granted source (CURRENT_ID when not valid)
    pub interrupt_id: u8,

    /// Vector latched at grant time (0 when not valid)
    pub interrupt_vector: u32,
}

/// Handshake counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub grants: u64,
    pub acks: u64,
    pub spurious_acks: u64,
}

/// Grant/acknowledge handshake with the consumer
#[derive(Debug, Clone, Default)]
pub struct ServiceController {
    arbiter: Arbiter,
    stats: ServiceStats,
}

impl ServiceController {
    /// Idle service controller with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer-visible outputs
    pub fn signals(&self) -> ServiceSignals {
        match self.arbiter.active() {
            Some(service) => ServiceSignals {
                interrupt_valid: true,
                interrupt_id: service.id.raw(),
                interrupt_vector: service.vector,
            },
            None => ServiceSignals {
                interrupt_valid: false,
                interrupt_id: self.arbiter.current_id(),
                interrupt_vector: 0,
            },
        }
    }

    /// Arbiter state
    pub fn state(&self) -> ArbiterState {
        self.arbiter.state()
    }

    /// Service in flight, if any
    pub fn active(&self) -> Option<ActiveService> {
        self.arbiter.active()
    }

    /// CURRENT_ID register value
    pub fn current_id(&self) -> u8 {
        self.arbiter.current_id()
    }

    /// Handshake counters
    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Run one arbitration round; see [`Arbiter::evaluate`]
    pub fn grant(
        &mut self,
        visible: SourceSet,
        effective: &[u8],
        vectors: &VectorTable,
        aging: &mut AgingMonitor,
    ) -> Option<ActiveService> {
        let granted = self.arbiter.evaluate(visible, effective, vectors, aging);
        if granted.is_some() {
            self.stats.grants += 1;
        }
        granted
    }

    /// Acknowledge a specific source
    ///
    /// # Errors
    ///
    /// `SpuriousAck` if idle or `id` is not the active source. State is untouched.
    pub fn acknowledge(
        &mut self,
        id: SourceId,
        latch: &mut RequestLatch,
        aging: &mut AgingMonitor,
    ) -> Result<ActiveService> {
        let result = self.arbiter.ack(id, latch, aging);
        self.count(&result);
        result
    }

    /// Acknowledge pin pulse: completes whatever `interrupt_id` currently shows
    ///
    /// # Errors
    ///
    /// `SpuriousAck` if nothing is being serviced.
    pub fn ack_pin(
        &mut self,
        latch: &mut RequestLatch,
        aging: &mut AgingMonitor,
    ) -> Result<ActiveService> {
        match self.arbiter.active() {
            Some(service) => {
                let result = self.arbiter.ack(service.id, latch, aging);
                self.count(&result);
                result
            }
            None => Err(self.reject_ack()),
        }
    }

    /// Count an ack pulse that arrived with nothing to acknowledge
    pub fn reject_ack(&mut self) -> ControllerError {
        self.stats.spurious_acks += 1;
        ControllerError::SpuriousAck {
            requested: None,
            active: None,
        }
    }

    fn count(&mut self, result: &Result<ActiveService>) {
        match result {
            Ok(_) => self.stats.acks += 1,
            Err(_) => self.stats.spurious_acks += 1,
        }
    }

    /// Drop the in-flight service (counters are kept)
    pub fn reset(&mut self) {
        self.arbiter.reset();
    }

    pub(crate) fn restore(&mut self, active: Option<ActiveService>, last_id: u8) {
        self.arbiter.restore(active, last_id);
    }
}
