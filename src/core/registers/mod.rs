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

//! Register File
//!
//! Decodes 32-bit register accesses into configuration updates.
//!
//! ## Register Map
//!
//! ```text
//! Offset          | Name       | Access | Layout
//! ----------------|------------|--------|-----------------------------------------
//! 0x00            | PRIORITY   | R/W    | [15:8] priority, [7:0] source id
//! 0x04            | MASK       | R/W    | bit i = source i enabled
//! 0x08 + (id<<4)  | VECTOR     | R/W    | [31:8] vector, [7:0] source id (== id)
//! 0x0C            | CURRENT_ID | R      | active id, or last granted id when idle
//! 0x10            | OVERRIDE   | R/W    | [16] enable, [11:8] priority, [7:0] id
//! 0x14            | EDGE_MODE  | R/W    | bit i = source i edge-triggered
//! 0x1C            | PENDING    | R      | raw pending set
//! ```
//!
//! ## Write Staging
//!
//! Writes land in a staged copy of the configuration tables. Reads of
//! PRIORITY, MASK, VECTOR, OVERRIDE and EDGE_MODE return the staged values at
//! once, but the arbiter keeps using the live copy until the controller
//! commits at the end of the next tick, so no write ever takes effect halfway
//! through an arbitration round. Between a write and that commit a read shows
//! the value about to become live, not the one the arbiter is using this
//! tick. CURRENT_ID and PENDING always reflect the core as it is now.
//!
//! A rejected write (unmapped offset, read-only register, id >= N) leaves
//! every register unchanged.

use crate::core::error::{ControllerError, Result};
use crate::core::interrupt::{PriorityOverride, PriorityTable, SourceId, SourceSet, VectorTable};
use serde::{Deserialize, Serialize};

/// Register offsets
pub mod offsets {
    pub const PRIORITY: u32 = 0x00;
    pub const MASK: u32 = 0x04;
    pub const VECTOR_BASE: u32 = 0x08;
    pub const VECTOR_STRIDE: u32 = 0x10;
    pub const CURRENT_ID: u32 = 0x0C;
    pub const OVERRIDE: u32 = 0x10;
    pub const EDGE_MODE: u32 = 0x14;
    pub const PENDING: u32 = 0x1C;

    /// VECTOR register offset for a source
    pub const fn vector(id: u8) -> u32 {
        VECTOR_BASE + ((id as u32) << 4)
    }
}

/// OVERRIDE enable bit
const OVERRIDE_ENABLE: u32 = 1 << 16;

/// Configuration tables the register file writes and the arbiter reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub priorities: PriorityTable,
    pub mask: SourceSet,
    pub vectors: VectorTable,
    pub edge_mode: SourceSet,
}

impl Tables {
    /// Power-on tables: priority 0, all masked, vectors 0, level-triggered
    pub fn new(sources: u8) -> Self {
        Self {
            priorities: PriorityTable::new(sources),
            mask: SourceSet::EMPTY,
            vectors: VectorTable::new(sources),
            edge_mode: SourceSet::EMPTY,
        }
    }
}

/// Register selected by an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Priority,
    Mask,
    Vector(SourceId),
    CurrentId,
    Override,
    EdgeMode,
    Pending,
}

impl Register {
    /// Decode a device-relative offset
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` for misaligned or unmapped offsets
    /// - `OutOfRangeSource` for a VECTOR window beyond the last source
    pub fn decode(offset: u32, sources: u8) -> Result<Register> {
        if offset & 0x3 != 0 {
            return Err(ControllerError::InvalidOperation {
                offset,
                reason: "misaligned register access",
            });
        }

        match offset {
            offsets::PRIORITY => Ok(Register::Priority),
            offsets::MASK => Ok(Register::Mask),
            offsets::CURRENT_ID => Ok(Register::CurrentId),
            offsets::OVERRIDE => Ok(Register::Override),
            offsets::EDGE_MODE => Ok(Register::EdgeMode),
            offsets::PENDING => Ok(Register::Pending),
            _ if offset & 0xF == offsets::VECTOR_BASE => {
                let index = (offset - offsets::VECTOR_BASE) / offsets::VECTOR_STRIDE;
                SourceId::new(index, sources).map(Register::Vector)
            }
            _ => Err(ControllerError::InvalidOperation {
                offset,
                reason: "unmapped register offset",
            }),
        }
    }
}

/// A decoded, validated register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    Priority { id: SourceId, value: u8, raw: u32 },
    Mask(SourceSet),
    Vector { id: SourceId, address: u32 },
    Override(PriorityOverride),
    EdgeMode(SourceSet),
}

impl RegisterWrite {
    /// Decode and validate a write
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` for bad offsets, read-only registers, or a VECTOR
    ///   id field that does not match the window it was written to
    /// - `OutOfRangeSource` when an id field names a source >= N
    pub fn decode(offset: u32, value: u32, sources: u8) -> Result<RegisterWrite> {
        let id_field = value & 0xFF;

        match Register::decode(offset, sources)? {
            Register::Priority => Ok(RegisterWrite::Priority {
                id: SourceId::new(id_field, sources)?,
                value: ((value >> 8) & 0xFF) as u8,
                raw: value,
            }),
            Register::Mask => Ok(RegisterWrite::Mask(
                SourceSet::from_bits(value).truncate(sources),
            )),
            Register::Vector(id) => {
                let tagged = SourceId::new(id_field, sources)?;
                if tagged != id {
                    return Err(ControllerError::InvalidOperation {
                        offset,
                        reason: "vector id field does not match register window",
                    });
                }
                Ok(RegisterWrite::Vector {
                    id,
                    address: value >> 8,
                })
            }
            Register::Override => Ok(RegisterWrite::Override(PriorityOverride {
                id: SourceId::new(id_field, sources)?,
                value: ((value >> 8) & 0xF) as u8,
                enabled: value & OVERRIDE_ENABLE != 0,
            })),
            Register::EdgeMode => Ok(RegisterWrite::EdgeMode(
                SourceSet::from_bits(value).truncate(sources),
            )),
            Register::CurrentId | Register::Pending => Err(ControllerError::InvalidOperation {
                offset,
                reason: "register is read-only",
            }),
        }
    }
}

/// Core state the read-only registers reflect
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterStatus {
    pub current_id: u8,
    pub pending: SourceSet,
}

/// Staged configuration plus register read-back state
#[derive(Debug, Clone)]
pub struct RegisterFile {
    staged: Tables,

    /// Last accepted PRIORITY word (read-back value)
    priority_word: u32,

    /// Staged tables differ from what was last committed
    dirty: bool,

    sources: u8,
}

impl RegisterFile {
    /// Register file over `tables` for a `sources`-wide controller
    pub fn new(tables: Tables, sources: u8) -> Self {
        Self {
            staged: tables,
            priority_word: 0,
            dirty: false,
            sources,
        }
    }

    /// Decode a write and apply it to the staged tables
    ///
    /// # Errors
    ///
    /// See [`RegisterWrite::decode`]. Nothing is modified on error.
    pub fn write(&mut self, offset: u32, value: u32) -> Result<RegisterWrite> {
        let write = RegisterWrite::decode(offset, value, self.sources)?;

        match write {
            RegisterWrite::Priority { id, value, raw } => {
                self.staged.priorities.set_base(id, value);
                self.priority_word = raw;
            }
            RegisterWrite::Mask(mask) => self.staged.mask = mask,
            RegisterWrite::Vector { id, address } => self.staged.vectors.set(id, address),
            RegisterWrite::Override(request) => self.staged.priorities.apply_override(request),
            RegisterWrite::EdgeMode(edge) => self.staged.edge_mode = edge,
        }

        log::debug!(
            "RegisterFile: write 0x{:02X} <- 0x{:08X} ({:?})",
            offset,
            value,
            write
        );
        self.dirty = true;
        Ok(write)
    }

    /// Read a register
    ///
    /// Configuration registers read back the staged tables, so a value
    /// written this tick is visible here before the arbiter uses it.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` / `OutOfRangeSource` for offsets that do not decode.
    pub fn read(&self, offset: u32, status: RegisterStatus) -> Result<u32> {
        let value = match Register::decode(offset, self.sources)? {
            Register::Priority => self.priority_word,
            Register::Mask => self.staged.mask.bits(),
            Register::Vector(id) => (self.staged.vectors.vector(id) << 8) | id.raw() as u32,
            Register::CurrentId => status.current_id as u32,
            Register::Override => match self.staged.priorities.active_override() {
                Some(ov) => {
                    OVERRIDE_ENABLE | ((ov.value as u32) << 8) | ov.id.raw() as u32
                }
                None => 0,
            },
            Register::EdgeMode => self.staged.edge_mode.bits(),
            Register::Pending => status.pending.bits(),
        };
        Ok(value)
    }

    /// Staged tables (what register reads reflect)
    pub fn staged(&self) -> &Tables {
        &self.staged
    }

    /// Report and clear the pending-commit flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Replace staged tables wholesale (hard reset, save-state load)
    pub fn load(&mut self, tables: Tables, priority_word: u32) {
        self.staged = tables;
        self.priority_word = priority_word;
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Last accepted PRIORITY word
    pub fn priority_word(&self) -> u32 {
        self.priority_word
    }
}
