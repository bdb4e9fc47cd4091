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

//! Scripted stimulus and per-tick trace records
//!
//! A scenario is a JSON list of steps. Each step applies its bus writes,
//! runs one or more ticks with the given inputs, then performs its bus reads:
//!
//! ```json
//! {
//!   "steps": [
//!     { "writes": [{ "addr": 4, "value": 15 }] },
//!     { "requests": 3 },
//!     { "requests": 2, "ack": true },
//!     { "requests": 2, "repeat": 4, "reads": [12] }
//!   ]
//! }
//! ```

use super::{InterruptController, TickInputs};
use crate::core::bus::IODevice;
use crate::core::error::{ControllerError, Result};
use crate::core::interrupt::{DiagnosticEvent, ServiceSignals, ServiceStats, SourceSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Register write issued before a step's ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusWrite {
    pub addr: u32,
    pub value: u32,
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    /// Raw request lines held for every tick of this step
    pub requests: u32,

    /// Ack pulse on the first tick of this step
    pub ack: bool,

    /// Reset pulse on the first tick of this step
    pub reset: bool,

    /// Number of ticks this step lasts
    pub repeat: u32,

    /// Register writes applied before the first tick
    pub writes: Vec<BusWrite>,

    /// Register addresses read after the last tick
    pub reads: Vec<u32>,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            requests: 0,
            ack: false,
            reset: false,
            repeat: 1,
            writes: Vec::new(),
            reads: Vec::new(),
        }
    }
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON text
    ///
    /// # Errors
    ///
    /// `Scenario` if the text is not a valid scenario.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ControllerError::Scenario(format!("failed to parse scenario: {}", e)))
    }

    /// Load a scenario from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Outcome of a register read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRead {
    pub addr: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything observable about one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub tick: u64,
    pub requests: u32,
    pub ack: bool,
    pub reset: bool,
    #[serde(flatten)]
    pub signals: ServiceSignals,
    pub pending: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub write_errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reads: Vec<BusRead>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<DiagnosticEvent>,
}

/// Totals after a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub stats: ServiceStats,
    pub diagnostics: usize,
}

/// Run a scenario, handing one trace record per tick to `sink`
///
/// Rejected register accesses do not stop the run; they appear in the
/// records and in the diagnostics.
///
/// # Errors
///
/// Only errors returned by `sink` abort the run.
pub fn run<F>(ic: &mut InterruptController, scenario: &Scenario, mut sink: F) -> Result<RunSummary>
where
    F: FnMut(&TraceRecord) -> Result<()>,
{
    let start = ic.ticks();
    let mut diagnostics = 0;

    for step in &scenario.steps {
        let mut write_errors = Vec::new();
        for write in &step.writes {
            if let Err(err) = bus_write(ic, *write) {
                write_errors.push(err.to_string());
            }
        }

        let ticks = step.repeat.max(1);
        for n in 0..ticks {
            let inputs = TickInputs {
                requests: SourceSet::from_bits(step.requests),
                ack: step.ack && n == 0,
                reset: step.reset && n == 0,
            };
            let tick = ic.ticks();
            let signals = ic.tick(inputs);

            let reads = if n + 1 == ticks {
                step.reads.iter().map(|&addr| bus_read(ic, addr)).collect()
            } else {
                Vec::new()
            };

            let events = ic.drain_diagnostics();
            diagnostics += events.len();

            let record = TraceRecord {
                tick,
                requests: step.requests,
                ack: inputs.ack,
                reset: inputs.reset,
                signals,
                pending: ic.pending().bits(),
                write_errors: std::mem::take(&mut write_errors),
                reads,
                diagnostics: events,
            };
            sink(&record)?;
        }
    }

    Ok(RunSummary {
        ticks: ic.ticks() - start,
        stats: ic.stats(),
        diagnostics,
    })
}

fn bus_write(ic: &mut InterruptController, write: BusWrite) -> Result<()> {
    let offset = ic.translate(write.addr).ok_or(ControllerError::InvalidOperation {
        offset: write.addr,
        reason: "address outside register window",
    })?;
    ic.write_register(offset, write.value)
}

fn bus_read(ic: &InterruptController, addr: u32) -> BusRead {
    let result = ic
        .translate(addr)
        .ok_or(ControllerError::InvalidOperation {
            offset: addr,
            reason: "address outside register window",
        })
        .and_then(|offset| ic.read_register(offset));

    match result {
        Ok(value) => BusRead {
            addr,
            value: Some(value),
            error: None,
        },
        Err(err) => BusRead {
            addr,
            value: None,
            error: Some(err.to_string()),
        },
    }
}
