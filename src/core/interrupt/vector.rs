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

//! Vector table: per-source dispatch addresses handed to the consumer on grant

use super::source::SourceId;
use serde::{Deserialize, Serialize};

/// Dispatch addresses are 24 bits wide (VECTOR register bits 31:8)
pub const VECTOR_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorTable {
    vectors: Vec<u32>,
}

impl VectorTable {
    /// Create a table with every vector at 0
    pub fn new(sources: u8) -> Self {
        Self {
            vectors: vec![0; sources as usize],
        }
    }

    /// Dispatch address for `id`
    pub fn vector(&self, id: SourceId) -> u32 {
        self.vectors[id.index()]
    }

    /// Replace the dispatch address for `id` (truncated to 24 bits)
    ///
    /// Services already granted keep the address they latched at grant time.
    pub fn set(&mut self, id: SourceId, address: u32) {
        self.vectors[id.index()] = address & VECTOR_MASK;
    }

    /// Number of sources
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the table has no sources
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
