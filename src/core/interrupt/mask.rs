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

//! Mask unit
//!
//! Combinational filter between the request latch and the arbiter. Masking
//! hides a pending source from arbitration without touching its pending bit,
//! and never retracts a service that is already in flight.

use super::source::SourceSet;

/// Sources that may take part in this arbitration round
///
/// 1 = enabled in `mask`, 0 = hidden.
///
/// # Example
///
/// ```
/// use irqarb::core::interrupt::{visible, SourceSet};
///
/// let pending = SourceSet::from_bits(0b0111);
/// let mask = SourceSet::from_bits(0b0101);
/// assert_eq!(visible(pending, mask).bits(), 0b0101);
/// ```
pub fn visible(pending: SourceSet, mask: SourceSet) -> SourceSet {
    pending & mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_requires_both() {
        assert!(visible(SourceSet::from_bits(0b01), SourceSet::from_bits(0b10)).is_empty());
        assert!(visible(SourceSet::EMPTY, SourceSet::all(8)).is_empty());
        assert!(visible(SourceSet::all(8), SourceSet::EMPTY).is_empty());
    }

    #[test]
    fn test_visible_does_not_alter_inputs() {
        let pending = SourceSet::from_bits(0b1111);
        let mask = SourceSet::from_bits(0b0011);
        let _ = visible(pending, mask);
        assert_eq!(pending.bits(), 0b1111);
    }
}
