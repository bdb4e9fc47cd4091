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

//! Source identifiers and source bitsets
//!
//! Every table in the controller is indexed by [`SourceId`]. A [`SourceSet`]
//! is one bit per source, packed in a 32-bit word the same way the MASK and
//! PENDING registers expose it.

use crate::core::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Largest number of interrupt sources a controller can be built with
pub const MAX_SOURCES: u8 = 32;

/// Index of one interrupt request line, always `< N` for the owning controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(u8);

impl SourceId {
    /// Validate a raw id against the controller's source count
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeSource` if `raw >= sources`.
    ///
    /// # Example
    ///
    /// ```
    /// use irqarb::core::interrupt::SourceId;
    ///
    /// let id = SourceId::new(3, 8).unwrap();
    /// assert_eq!(id.index(), 3);
    /// assert!(SourceId::new(8, 8).is_err());
    /// ```
    pub fn new(raw: u32, sources: u8) -> Result<Self> {
        if raw < sources as u32 {
            Ok(Self(raw as u8))
        } else {
            Err(ControllerError::OutOfRangeSource { id: raw, sources })
        }
    }

    /// Build an id from a table index the caller already bounds-checked
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u8)
    }

    /// Table index for this source
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw id as it appears in register fields
    pub const fn raw(self) -> u8 {
        self.0
    }

    const fn bit(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRQ{}", self.0)
    }
}

/// One bit per interrupt source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet(u32);

impl SourceSet {
    /// Set with no sources
    pub const EMPTY: SourceSet = SourceSet(0);

    /// Wrap a raw register word
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Every source of an `sources`-wide controller
    pub const fn all(sources: u8) -> Self {
        if sources >= MAX_SOURCES {
            Self(u32::MAX)
        } else {
            Self((1u32 << sources) - 1)
        }
    }

    /// Raw register word
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Drop bits at or above `sources`
    pub const fn truncate(self, sources: u8) -> Self {
        Self(self.0 & Self::all(sources).0)
    }

    /// Check if `id` is in the set
    ///
    /// # Example
    ///
    /// ```
    /// use irqarb::core::interrupt::{SourceId, SourceSet};
    ///
    /// let mut set = SourceSet::EMPTY;
    /// let id = SourceId::new(2, 4)?;
    /// set.insert(id);
    /// assert!(set.contains(id));
    /// assert_eq!(set.len(), 1);
    /// set.remove(id);
    /// assert!(set.is_empty());
    /// # Ok::<(), irqarb::core::error::ControllerError>(())
    /// ```
    pub const fn contains(self, id: SourceId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Add `id` to the set
    pub fn insert(&mut self, id: SourceId) {
        self.0 |= id.bit();
    }

    /// Remove `id` from the set
    pub fn remove(&mut self, id: SourceId) {
        self.0 &= !id.bit();
    }

    /// Check if no source is in the set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of sources in the set
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Member ids in ascending order
    pub fn iter(self) -> impl Iterator<Item = SourceId> {
        let bits = self.0;
        (0..MAX_SOURCES)
            .filter(move |i| bits & (1 << i) != 0)
            .map(SourceId)
    }
}

impl BitAnd for SourceSet {
    type Output = SourceSet;

    fn bitand(self, rhs: SourceSet) -> SourceSet {
        SourceSet(self.0 & rhs.0)
    }
}

impl BitOr for SourceSet {
    type Output = SourceSet;

    fn bitor(self, rhs: SourceSet) -> SourceSet {
        SourceSet(self.0 | rhs.0)
    }
}

impl Not for SourceSet {
    type Output = SourceSet;

    fn not(self) -> SourceSet {
        SourceSet(!self.0)
    }
}

impl FromIterator<SourceId> for SourceSet {
    fn from_iter<I: IntoIterator<Item = SourceId>>(iter: I) -> Self {
        let mut set = SourceSet::EMPTY;
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
