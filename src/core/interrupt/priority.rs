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

//! Priority table
//!
//! Holds the configured 4-bit base priority of every source and the single
//! priority override slot. Higher value = more urgent.
//!
//! ```text
//! effective[i] = override.value                 if override enabled for i
//!              = min(15, base[i] + boost[i])    otherwise
//! ```

use super::source::SourceId;
use serde::{Deserialize, Serialize};

/// Highest representable priority; all arithmetic saturates here
pub const MAX_PRIORITY: u8 = 15;

/// Transient priority forced onto one source while enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityOverride {
    pub id: SourceId,
    pub value: u8,
    pub enabled: bool,
}

/// Per-source base priorities plus the override slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTable {
    base: Vec<u8>,
    override_slot: Option<PriorityOverride>,
}

impl PriorityTable {
    /// Create a table with every source at priority 0
    pub fn new(sources: u8) -> Self {
        Self {
            base: vec![0; sources as usize],
            override_slot: None,
        }
    }

    /// Configured priority of a source
    pub fn base(&self, id: SourceId) -> u8 {
        self.base[id.index()]
    }

    /// Set the configured priority of a source, saturating at 15
    pub fn set_base(&mut self, id: SourceId, value: u8) {
        self.base[id.index()] = value.min(MAX_PRIORITY);
    }

    /// Install or clear the override
    ///
    /// An enabled override replaces whatever was in the slot. A disabled one
    /// clears the slot only if it names the source currently overridden, so a
    /// stray "disable" for another source leaves the active override alone.
    pub fn apply_override(&mut self, request: PriorityOverride) {
        if request.enabled {
            self.override_slot = Some(PriorityOverride {
                value: request.value.min(MAX_PRIORITY),
                ..request
            });
        } else if self
            .override_slot
            .is_some_and(|active| active.id == request.id)
        {
            self.override_slot = None;
        }
    }

    /// Active override, if any
    pub fn active_override(&self) -> Option<PriorityOverride> {
        self.override_slot
    }

    /// Priority used by the arbiter for `id` given its aging boost
    pub fn effective(&self, id: SourceId, boost: u8) -> u8 {
        match self.override_slot {
            Some(ov) if ov.enabled && ov.id == id => ov.value,
            _ => self.base(id).saturating_add(boost).min(MAX_PRIORITY),
        }
    }

    /// Number of sources
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Check if the table has no sources
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> SourceId {
        SourceId::from_index(i)
    }

    #[test]
    fn test_new_table_is_zero() {
        let table = PriorityTable::new(4);
        assert_eq!(table.len(), 4);
        assert!((0..4).all(|i| table.base(id(i)) == 0));
        assert!(table.active_override().is_none());
    }

    #[test]
    fn test_set_base_saturates() {
        let mut table = PriorityTable::new(4);
        table.set_base(id(2), 200);
        assert_eq!(table.base(id(2)), MAX_PRIORITY);
    }

    #[test]
    fn test_effective_adds_boost_and_saturates() {
        let mut table = PriorityTable::new(4);
        table.set_base(id(1), 10);
        assert_eq!(table.effective(id(1), 0), 10);
        assert_eq!(table.effective(id(1), 3), 13);
        assert_eq!(table.effective(id(1), 9), MAX_PRIORITY);
        assert_eq!(table.effective(id(1), u8::MAX), MAX_PRIORITY);
    }

    #[test]
    fn test_override_replaces_aging() {
        let mut table = PriorityTable::new(4);
        table.set_base(id(0), 2);
        table.apply_override(PriorityOverride {
            id: id(0),
            value: 9,
            enabled: true,
        });

        assert_eq!(table.effective(id(0), 5), 9);
        // Other sources unaffected
        assert_eq!(table.effective(id(1), 1), 1);
    }

    #[test]
    fn test_override_disable_reverts_to_base() {
        let mut table = PriorityTable::new(4);
        table.set_base(id(3), 4);
        table.apply_override(PriorityOverride {
            id: id(3),
            value: 15,
            enabled: true,
        });
        table.apply_override(PriorityOverride {
            id: id(3),
            value: 0,
            enabled: false,
        });

        assert!(table.active_override().is_none());
        assert_eq!(table.effective(id(3), 0), 4);
    }

    #[test]
    fn test_disable_for_other_source_keeps_override() {
        let mut table = PriorityTable::new(4);
        table.apply_override(PriorityOverride {
            id: id(1),
            value: 7,
            enabled: true,
        });
        table.apply_override(PriorityOverride {
            id: id(2),
            value: 0,
            enabled: false,
        });
        assert_eq!(table.effective(id(1), 0), 7);
    }

    #[test]
    fn test_override_value_saturates() {
        let mut table = PriorityTable::new(2);
        table.apply_override(PriorityOverride {
            id: id(0),
            value: 0xFF,
            enabled: true,
        });
        assert_eq!(table.effective(id(0), 0), MAX_PRIORITY);
    }
}
