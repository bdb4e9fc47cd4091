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

//! Arbiter
//!
//! Picks one winner per arbitration round and owns the in-flight service.
//!
//! ## State Machine
//!
//! ```text
//!            visible pending != 0
//!   ┌──────┐ ─────────────────────▶ ┌───────────┐
//!   │ IDLE │                        │ SERVICING │
//!   └──────┘ ◀───────────────────── └───────────┘
//!             ack(id == active.id)
//! ```
//!
//! While SERVICING no new grant is evaluated. The grant latches a copy of the
//! winner's vector, so later vector-table writes only affect future grants.

use super::aging::AgingMonitor;
use super::latch::RequestLatch;
use super::source::{SourceId, SourceSet};
use super::vector::VectorTable;
use crate::core::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};

/// Source currently being serviced, with the vector latched at grant time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveService {
    pub id: SourceId,
    pub vector: u32,
}

/// Arbiter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Idle,
    Servicing,
}

/// Highest effective priority among `visible`, lowest id on ties
///
/// `effective` is indexed by source id.
///
/// # Example
///
/// ```
/// use irqarb::core::interrupt::{pick_winner, SourceSet};
///
/// let visible = SourceSet::from_bits(0b0110);
/// let effective = [9, 4, 4, 0];
/// assert_eq!(pick_winner(visible, &effective).map(|id| id.raw()), Some(1));
/// ```
pub fn pick_winner(visible: SourceSet, effective: &[u8]) -> Option<SourceId> {
    let mut best: Option<(SourceId, u8)> = None;
    for id in visible.iter() {
        let Some(&priority) = effective.get(id.index()) else {
            break;
        };
        match best {
            Some((_, top)) if priority <= top => {}
            _ => best = Some((id, priority)),
        }
    }
    best.map(|(id, _)| id)
}

/// Grant state machine
#[derive(Debug, Clone, Default)]
pub struct Arbiter {
    active: Option<ActiveService>,

    /// Id of the most recent grant (CURRENT_ID when idle)
    last_id: u8,
}

impl Arbiter {
    /// Idle arbiter with CURRENT_ID 0
    pub fn new() -> Self {
        Self::default()
    }

    /// IDLE or SERVICING
    pub fn state(&self) -> ArbiterState {
        if self.active.is_some() {
            ArbiterState::Servicing
        } else {
            ArbiterState::Idle
        }
    }

    /// Service in flight, if any
    pub fn active(&self) -> Option<ActiveService> {
        self.active
    }

    /// CURRENT_ID register value: active id, else the last granted id
    pub fn current_id(&self) -> u8 {
        self.active.map_or(self.last_id, |svc| svc.id.raw())
    }

    /// Run one arbitration round
    ///
    /// Does nothing while SERVICING. Otherwise grants the winner of
    /// `visible`, latches its vector and resets its wait counter.
    ///
    /// # Returns
    ///
    /// The new service if a grant was made this round
    pub fn evaluate(
        &mut self,
        visible: SourceSet,
        effective: &[u8],
        vectors: &VectorTable,
        aging: &mut AgingMonitor,
    ) -> Option<ActiveService> {
        if self.active.is_some() {
            return None;
        }

        let id = pick_winner(visible, effective)?;
        let service = ActiveService {
            id,
            vector: vectors.vector(id),
        };
        aging.reset(id);
        self.active = Some(service);
        self.last_id = id.raw();

        log::debug!(
            "Arbiter: granted {} (priority={}, vector=0x{:06X})",
            id,
            effective[id.index()],
            service.vector
        );
        Some(service)
    }

    /// Complete the active service
    ///
    /// Clears the source's pending bit and wait counter and returns to IDLE.
    ///
    /// # Errors
    ///
    /// Returns `SpuriousAck` with no state change if nothing is being
    /// serviced or `id` is not the active source.
    pub fn ack(
        &mut self,
        id: SourceId,
        latch: &mut RequestLatch,
        aging: &mut AgingMonitor,
    ) -> Result<ActiveService> {
        match self.active {
            Some(service) if service.id == id => {
                latch.clear(id);
                aging.reset(id);
                self.active = None;
                log::debug!("Arbiter: {} acknowledged", id);
                Ok(service)
            }
            active => Err(ControllerError::SpuriousAck {
                requested: Some(id.raw()),
                active: active.map(|svc| svc.id.raw()),
            }),
        }
    }

    /// Drop any in-flight service and forget the last grant
    pub fn reset(&mut self) {
        self.active = None;
        self.last_id = 0;
    }

    pub(crate) fn restore(&mut self, active: Option<ActiveService>, last_id: u8) {
        self.active = active;
        self.last_id = last_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interrupt::aging::AgingPolicyKind;

    fn id(i: usize) -> SourceId {
        SourceId::from_index(i)
    }

    fn setup(sources: u8) -> (Arbiter, RequestLatch, AgingMonitor, VectorTable) {
        let mut vectors = VectorTable::new(sources);
        for i in 0..sources as usize {
            vectors.set(id(i), 0x1000 + 0x10 * i as u32);
        }
        (
            Arbiter::new(),
            RequestLatch::new(sources),
            AgingMonitor::new(sources, 5, AgingPolicyKind::SourceId.build()),
            vectors,
        )
    }

    // ========================================================================
    // Winner Selection
    // ========================================================================

    #[test]
    fn test_pick_winner_empty() {
        assert_eq!(pick_winner(SourceSet::EMPTY, &[1, 2, 3]), None);
    }

    #[test]
    fn test_pick_winner_highest_priority() {
        let visible = SourceSet::from_bits(0b1111);
        assert_eq!(pick_winner(visible, &[3, 1, 2, 0]), Some(id(0)));
        assert_eq!(pick_winner(visible, &[0, 1, 7, 2]), Some(id(2)));
    }

    #[test]
    fn test_pick_winner_tie_lowest_id() {
        let visible = SourceSet::from_bits(0b1110);
        assert_eq!(pick_winner(visible, &[15, 4, 4, 4]), Some(id(1)));
    }

    #[test]
    fn test_pick_winner_ignores_invisible() {
        let visible = SourceSet::from_bits(0b1000);
        assert_eq!(pick_winner(visible, &[15, 15, 15, 0]), Some(id(3)));
    }

    #[test]
    fn test_pick_winner_all_zero_priority_still_grants() {
        let visible = SourceSet::from_bits(0b0100);
        assert_eq!(pick_winner(visible, &[0, 0, 0, 0]), Some(id(2)));
    }

    // ========================================================================
    // Grant / Ack Handshake
    // ========================================================================

    #[test]
    fn test_grant_latches_vector() {
        let (mut arbiter, _latch, mut aging, vectors) = setup(4);
        let svc = arbiter
            .evaluate(SourceSet::from_bits(0b0100), &[0; 4], &vectors, &mut aging)
            .unwrap();
        assert_eq!(svc.id, id(2));
        assert_eq!(svc.vector, 0x1020);
        assert_eq!(arbiter.state(), ArbiterState::Servicing);
        assert_eq!(arbiter.current_id(), 2);
    }

    #[test]
    fn test_no_grant_while_servicing() {
        let (mut arbiter, _latch, mut aging, vectors) = setup(4);
        arbiter.evaluate(SourceSet::from_bits(0b0001), &[0; 4], &vectors, &mut aging);
        let second = arbiter.evaluate(
            SourceSet::from_bits(0b0010),
            &[0, 15, 0, 0],
            &vectors,
            &mut aging,
        );
        assert!(second.is_none());
        assert_eq!(arbiter.active().unwrap().id, id(0));
    }

    #[test]
    fn test_grant_resets_winner_wait() {
        let (mut arbiter, _latch, mut aging, vectors) = setup(4);
        let set = SourceSet::from_bits(0b0011);
        aging.tick(set, set);
        aging.tick(set, set);
        arbiter.evaluate(set, &[5, 1, 0, 0], &vectors, &mut aging);
        assert_eq!(aging.wait(id(0)), 0);
        assert_eq!(aging.wait(id(1)), 2);
    }

    #[test]
    fn test_ack_returns_to_idle() {
        let (mut arbiter, mut latch, mut aging, vectors) = setup(4);
        latch.sample(SourceSet::from_bits(0b0001), SourceSet::EMPTY);
        arbiter.evaluate(latch.pending(), &[0; 4], &vectors, &mut aging);

        let done = arbiter.ack(id(0), &mut latch, &mut aging).unwrap();
        assert_eq!(done.id, id(0));
        assert_eq!(arbiter.state(), ArbiterState::Idle);
        assert!(latch.pending().is_empty());
        // CURRENT_ID keeps the last grant while idle
        assert_eq!(arbiter.current_id(), 0);
    }

    #[test]
    fn test_ack_wrong_id_is_spurious() {
        let (mut arbiter, mut latch, mut aging, vectors) = setup(4);
        latch.sample(SourceSet::from_bits(0b0011), SourceSet::EMPTY);
        arbiter.evaluate(latch.pending(), &[0; 4], &vectors, &mut aging);

        let err = arbiter.ack(id(1), &mut latch, &mut aging).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::SpuriousAck {
                requested: Some(1),
                active: Some(0)
            }
        ));
        // Nothing changed
        assert_eq!(arbiter.active().unwrap().id, id(0));
        assert_eq!(latch.pending().bits(), 0b0011);
    }

    #[test]
    fn test_ack_while_idle_is_spurious() {
        let (mut arbiter, mut latch, mut aging, _vectors) = setup(4);
        let err = arbiter.ack(id(0), &mut latch, &mut aging).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::SpuriousAck {
                requested: Some(0),
                active: None
            }
        ));
        assert_eq!(arbiter.state(), ArbiterState::Idle);
    }

    #[test]
    fn test_vector_rewrite_mid_service_not_seen() {
        let (mut arbiter, mut latch, mut aging, mut vectors) = setup(4);
        latch.sample(SourceSet::from_bits(0b0010), SourceSet::EMPTY);
        arbiter.evaluate(latch.pending(), &[0; 4], &vectors, &mut aging);

        vectors.set(id(1), 0xBEEF);
        assert_eq!(arbiter.active().unwrap().vector, 0x1010);

        arbiter.ack(id(1), &mut latch, &mut aging).unwrap();
        latch.sample(SourceSet::from_bits(0b0010), SourceSet::EMPTY);
        let next = arbiter
            .evaluate(latch.pending(), &[0; 4], &vectors, &mut aging)
            .unwrap();
        assert_eq!(next.vector, 0xBEEF);
    }

    #[test]
    fn test_reset_clears_service() {
        let (mut arbiter, _latch, mut aging, vectors) = setup(4);
        arbiter.evaluate(SourceSet::from_bits(0b1000), &[0; 4], &vectors, &mut aging);
        arbiter.reset();
        assert_eq!(arbiter.state(), ArbiterState::Idle);
        assert_eq!(arbiter.current_id(), 0);
    }
}
