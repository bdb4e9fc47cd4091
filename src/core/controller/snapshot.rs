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

//! Save states
//!
//! A [`Snapshot`] is the complete architectural state of a controller. Two
//! controllers with equal snapshots behave identically for any future input.
//! Service counters and the diagnostic log are bookkeeping and are not part
//! of it.

use super::InterruptController;
use crate::core::error::{ControllerError, Result};
use crate::core::interrupt::{ActiveService, SourceSet};
use crate::core::registers::Tables;
use serde::{Deserialize, Serialize};

/// Full architectural state of an [`InterruptController`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sources: u8,
    pub ticks: u64,
    pub pending: SourceSet,
    pub previous_requests: SourceSet,
    pub waits: Vec<u32>,
    pub active: Option<ActiveService>,
    pub current_id: u8,
    pub live: Tables,
    pub staged: Tables,
    pub priority_word: u32,
}

impl Snapshot {
    /// Every source id stored in the snapshot is below `sources`
    fn ids_fit(&self, sources: u8) -> bool {
        let override_fits = |tables: &Tables| {
            tables
                .priorities
                .active_override()
                .is_none_or(|ov| ov.id.raw() < sources)
        };

        self.active.is_none_or(|svc| svc.id.raw() < sources)
            && self.current_id < sources
            && override_fits(&self.live)
            && override_fits(&self.staged)
    }
}

impl InterruptController {
    /// Capture the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sources: self.sources(),
            ticks: self.ticks,
            pending: self.latch.pending(),
            previous_requests: self.latch.previous(),
            waits: self.aging.waits().to_vec(),
            active: self.service.active(),
            current_id: self.service.current_id(),
            live: self.live.clone(),
            staged: self.registers.staged().clone(),
            priority_word: self.registers.priority_word(),
        }
    }

    /// Restore a previously captured state
    ///
    /// # Errors
    ///
    /// `Snapshot` if it was taken from a controller with a different source
    /// count, or names a source id the controller does not have. The
    /// controller is unchanged in that case.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let sources = self.sources() as usize;
        if snapshot.sources != self.sources()
            || snapshot.waits.len() != sources
            || snapshot.live.priorities.len() != sources
            || snapshot.staged.priorities.len() != sources
            || snapshot.live.vectors.len() != sources
            || snapshot.staged.vectors.len() != sources
        {
            return Err(ControllerError::Snapshot(format!(
                "snapshot for {} sources does not fit a {}-source controller",
                snapshot.sources, sources
            )));
        }
        if !snapshot.ids_fit(snapshot.sources) {
            return Err(ControllerError::Snapshot(format!(
                "snapshot names a source id outside 0..{}",
                sources
            )));
        }

        self.ticks = snapshot.ticks;
        self.latch
            .restore(snapshot.pending, snapshot.previous_requests);
        self.aging.restore(&snapshot.waits);
        self.service.restore(snapshot.active, snapshot.current_id);
        self.live = snapshot.live.clone();
        self.registers
            .load(snapshot.staged.clone(), snapshot.priority_word);
        if snapshot.staged != snapshot.live {
            self.registers.mark_dirty();
        }

        log::debug!("InterruptController: restored state at tick {}", self.ticks);
        Ok(())
    }

    /// Encode the current state with bincode
    ///
    /// # Errors
    ///
    /// `Snapshot` if encoding fails.
    pub fn save_state(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self.snapshot(), bincode::config::standard())
            .map_err(|e| ControllerError::Snapshot(format!("failed to encode state: {}", e)))
    }

    /// Decode and restore a state produced by [`save_state`](Self::save_state)
    ///
    /// # Errors
    ///
    /// `Snapshot` if the bytes do not decode or do not fit this controller.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<()> {
        let (snapshot, _): (Snapshot, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| ControllerError::Snapshot(format!("failed to decode state: {}", e)))?;
        self.restore(&snapshot)
    }
}
