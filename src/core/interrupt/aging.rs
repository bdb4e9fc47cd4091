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

//! Aging monitor
//!
//! Counts how many arbitration rounds each pending source has waited and
//! converts that wait into a priority boost once it reaches the starvation
//! threshold.
//!
//! ## Counter Rules (per arbitration round)
//!
//! ```text
//! pending & unmasked      -> counter += 1
//! pending & masked        -> counter held
//! not pending             -> counter = 0
//! granted / acknowledged  -> counter = 0
//! ```
//!
//! ## Boost Policies
//!
//! The boost curve is pluggable through [`AgingPolicy`]:
//!
//! - [`SourceIdBoost`]: once the threshold is reached the boost equals the
//!   source id (`boost = wait >= T ? id : 0`). This is the reference curve.
//! - [`LinearBoost`]: the boost grows by one per round past the threshold
//!   (`boost = wait - T + 1`), which bounds starvation for every source,
//!   including source 0.

use super::source::{SourceId, SourceSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a source's wait time to a priority boost
///
/// Implementations must be pure: the same inputs always give the same boost.
/// The result is added to the base priority and the sum saturates at 15, so
/// policies need not clamp.
pub trait AgingPolicy: fmt::Debug {
    /// Boost for `id` after waiting `wait` rounds against `threshold`
    fn boost(&self, id: SourceId, wait: u32, threshold: u32) -> u8;

    /// Short name for logs and traces
    fn name(&self) -> &'static str;
}

/// Reference curve: boost by the source id once the threshold is reached
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceIdBoost;

impl AgingPolicy for SourceIdBoost {
    fn boost(&self, id: SourceId, wait: u32, threshold: u32) -> u8 {
        if wait >= threshold {
            id.raw()
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "source-id"
    }
}

/// One extra priority level per round past the threshold
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBoost;

impl AgingPolicy for LinearBoost {
    fn boost(&self, _id: SourceId, wait: u32, threshold: u32) -> u8 {
        if wait >= threshold {
            (wait - threshold).saturating_add(1).min(u8::MAX as u32) as u8
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Serializable selector for the built-in policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgingPolicyKind {
    #[default]
    SourceId,
    Linear,
}

impl AgingPolicyKind {
    /// Instantiate the policy
    pub fn build(self) -> Box<dyn AgingPolicy> {
        match self {
            AgingPolicyKind::SourceId => Box::new(SourceIdBoost),
            AgingPolicyKind::Linear => Box::new(LinearBoost),
        }
    }
}

/// Per-source wait counters plus the boost policy
#[derive(Debug)]
pub struct AgingMonitor {
    waits: Vec<u32>,
    threshold: u32,
    policy: Box<dyn AgingPolicy>,
}

impl AgingMonitor {
    /// Create a monitor with all counters at zero
    ///
    /// # Arguments
    ///
    /// * `sources` - Number of interrupt sources (N)
    /// * `threshold` - Rounds a source may wait before it is boosted
    /// * `policy` - Boost curve
    pub fn new(sources: u8, threshold: u32, policy: Box<dyn AgingPolicy>) -> Self {
        Self {
            waits: vec![0; sources as usize],
            threshold,
            policy,
        }
    }

    /// Advance every counter by one arbitration round
    ///
    /// # Arguments
    ///
    /// * `pending` - Raw pending set (masked or not)
    /// * `visible` - Pending sources that passed the mask
    pub fn tick(&mut self, pending: SourceSet, visible: SourceSet) {
        for (index, wait) in self.waits.iter_mut().enumerate() {
            let id = SourceId::from_index(index);
            if visible.contains(id) {
                *wait = wait.saturating_add(1);
                if *wait == self.threshold {
                    log::debug!("Aging: {} reached starvation threshold", id);
                }
            } else if !pending.contains(id) {
                *wait = 0;
            }
        }
    }

    /// Zero a counter (source granted or acknowledged)
    pub fn reset(&mut self, id: SourceId) {
        self.waits[id.index()] = 0;
    }

    /// Zero every counter
    pub fn reset_all(&mut self) {
        self.waits.iter_mut().for_each(|w| *w = 0);
    }

    /// Rounds `id` has waited
    pub fn wait(&self, id: SourceId) -> u32 {
        self.waits[id.index()]
    }

    /// Current boost for `id`
    pub fn boost(&self, id: SourceId) -> u8 {
        self.policy.boost(id, self.wait(id), self.threshold)
    }

    /// Starvation threshold in rounds
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Name of the active boost policy
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub(crate) fn waits(&self) -> &[u32] {
        &self.waits
    }

    pub(crate) fn restore(&mut self, waits: &[u32]) {
        for (dst, src) in self.waits.iter_mut().zip(waits) {
            *dst = *src;
        }
    }
}
