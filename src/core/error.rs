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

//! Error types for the interrupt arbitration core
//!
//! All errors are local and non-fatal: a rejected operation leaves the
//! controller state untouched and the caller decides whether to retry.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by the controller, the register file and their tooling
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A register write or API call named a source id outside `[0, N)`
    #[error("source id {id} out of range (controller has {sources} sources)")]
    OutOfRangeSource { id: u32, sources: u8 },

    /// Malformed register access (unknown offset, read-only target, misalignment)
    #[error("invalid register operation at offset 0x{offset:02X}: {reason}")]
    InvalidOperation { offset: u32, reason: &'static str },

    /// Acknowledgment while idle, or for an id that is not being serviced
    #[error("spurious acknowledge for {requested:?} (active: {active:?})")]
    SpuriousAck {
        requested: Option<u8>,
        active: Option<u8>,
    },

    /// Construction with an unsupported number of sources
    #[error("unsupported source count {count} (expected 1..=32)")]
    InvalidSourceCount { count: u32 },

    /// Configuration could not be parsed or failed validation
    #[error("configuration error: {0}")]
    Config(String),

    /// Save-state encoding or decoding failed
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Scenario file could not be parsed
    #[error("scenario error: {0}")]
    Scenario(String),

    /// File system failure while reading or writing configs, scenarios or traces
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
