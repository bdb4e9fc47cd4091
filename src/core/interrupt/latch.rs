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

//! Request latch
//!
//! Samples the raw request lines once per tick into the pending set.
//!
//! - **Edge mode**: a low-to-high transition of the raw line sets the pending
//!   bit once. Holding the line high does not re-arm it.
//! - **Level mode**: a high raw line sets the pending bit on every sample. After
//!   an acknowledgment clears it, the bit comes back on the next sample for as
//!   long as the line stays asserted.
//!
//! In both modes the pending bit is cleared only by acknowledgment or reset.

use super::source::{SourceId, SourceSet};

/// Pending-interrupt latch with per-source edge detection
#[derive(Debug, Clone)]
pub struct RequestLatch {
    /// Outstanding, unacknowledged requests
    pending: SourceSet,

    /// Raw line levels from the previous sample (edge detector history)
    previous: SourceSet,

    sources: u8,
}

impl RequestLatch {
    /// Create a latch with nothing pending
    pub fn new(sources: u8) -> Self {
        Self {
            pending: SourceSet::EMPTY,
            previous: SourceSet::EMPTY,
            sources,
        }
    }

    /// Sample the raw request lines
    ///
    /// # Arguments
    ///
    /// * `raw` - Current level of every request line (bits >= N ignored)
    /// * `edge_mode` - Bit set = source is edge-triggered
    pub fn sample(&mut self, raw: SourceSet, edge_mode: SourceSet) {
        let raw = raw.truncate(self.sources);
        let rising = raw & !self.previous;

        let latched = (rising & edge_mode) | (raw & !edge_mode);
        if !(latched & !self.pending).is_empty() {
            log::trace!(
                "Latch: new requests {} (raw={}, pending={})",
                latched & !self.pending,
                raw,
                self.pending | latched
            );
        }

        self.pending = self.pending | latched;
        self.previous = raw;
    }

    /// Current pending set, masked or not
    pub fn pending(&self) -> SourceSet {
        self.pending
    }

    /// Drop the pending bit of an acknowledged source
    pub fn clear(&mut self, id: SourceId) {
        self.pending.remove(id);
    }

    /// Clear all pending bits and the edge detector history
    pub fn reset(&mut self) {
        self.pending = SourceSet::EMPTY;
        self.previous = SourceSet::EMPTY;
    }

    pub(crate) fn restore(&mut self, pending: SourceSet, previous: SourceSet) {
        self.pending = pending.truncate(self.sources);
        self.previous = previous.truncate(self.sources);
    }

    pub(crate) fn previous(&self) -> SourceSet {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: SourceSet = SourceSet::EMPTY;

    fn id(i: usize) -> SourceId {
        SourceId::from_index(i)
    }

    #[test]
    fn test_level_request_latches() {
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0101), LEVEL);
        assert_eq!(latch.pending().bits(), 0b0101);
    }

    #[test]
    fn test_level_request_sticky_after_deassert() {
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0001), LEVEL);
        latch.sample(SourceSet::EMPTY, LEVEL);

        // Line dropped but nobody acknowledged
        assert_eq!(latch.pending().bits(), 0b0001);
    }

    #[test]
    fn test_level_request_rearms_while_held() {
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0001), LEVEL);
        latch.clear(id(0));
        assert!(latch.pending().is_empty());

        latch.sample(SourceSet::from_bits(0b0001), LEVEL);
        assert_eq!(latch.pending().bits(), 0b0001);
    }

    #[test]
    fn test_level_request_self_clears_once_deasserted_and_acked() {
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0001), LEVEL);
        latch.clear(id(0));
        latch.sample(SourceSet::EMPTY, LEVEL);
        assert!(latch.pending().is_empty());
    }

    #[test]
    fn test_edge_request_latches_once() {
        let edge = SourceSet::from_bits(0b0010);
        let mut latch = RequestLatch::new(4);

        latch.sample(SourceSet::from_bits(0b0010), edge);
        assert_eq!(latch.pending().bits(), 0b0010);

        latch.clear(id(1));
        // Still held high: no new edge
        latch.sample(SourceSet::from_bits(0b0010), edge);
        assert!(latch.pending().is_empty());

        // Drop and raise again
        latch.sample(SourceSet::EMPTY, edge);
        latch.sample(SourceSet::from_bits(0b0010), edge);
        assert_eq!(latch.pending().bits(), 0b0010);
    }

    #[test]
    fn test_edge_pulse_survives_deassert() {
        let edge = SourceSet::from_bits(0b0100);
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0100), edge);
        latch.sample(SourceSet::EMPTY, edge);
        assert_eq!(latch.pending().bits(), 0b0100);
    }

    #[test]
    fn test_mixed_modes() {
        let edge = SourceSet::from_bits(0b0001);
        let mut latch = RequestLatch::new(2);
        latch.sample(SourceSet::from_bits(0b11), edge);
        latch.clear(id(0));
        latch.clear(id(1));
        latch.sample(SourceSet::from_bits(0b11), edge);

        // Level source 1 re-arms, edge source 0 does not
        assert_eq!(latch.pending().bits(), 0b10);
    }

    #[test]
    fn test_raw_bits_beyond_width_ignored() {
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0xFFFF_FFF0), LEVEL);
        assert!(latch.pending().is_empty());
    }

    #[test]
    fn test_reset_clears_history() {
        let edge = SourceSet::from_bits(0b0001);
        let mut latch = RequestLatch::new(4);
        latch.sample(SourceSet::from_bits(0b0001), edge);
        latch.reset();
        assert!(latch.pending().is_empty());

        // Line still high after reset counts as a fresh edge
        latch.sample(SourceSet::from_bits(0b0001), edge);
        assert_eq!(latch.pending().bits(), 0b0001);
    }
}
