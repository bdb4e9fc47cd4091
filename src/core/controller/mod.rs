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

//! Interrupt controller integration
//!
//! Wires the arbitration units together and clocks them one tick at a time.
//!
//! ## Tick Order
//!
//! ```text
//! 1. reset input   -> soft reset, outputs deasserted, tick ends
//! 2. sample        -> RequestLatch (live EDGE_MODE)
//! 3. mask          -> visible = pending & live MASK
//! 4. arbitrate     -> only if IDLE at tick start: age, pick winner, latch vector
//! 5. commit        -> ack pulse completes the service active at tick start,
//!                     staged register writes become live
//! ```
//!
//! `interrupt_valid` therefore drops in the tick that carries the ack pulse,
//! and the next grant is made in the following tick.

mod config;
pub mod scenario;
mod snapshot;

pub use config::ControllerConfig;
pub use snapshot::Snapshot;

use crate::core::bus::IODevice;
use crate::core::error::{ControllerError, Result};
use crate::core::interrupt::{
    visible, ActiveService, AgingMonitor, ArbiterState, Diagnostic, DiagnosticEvent,
    DiagnosticLog, RequestLatch, ServiceController, ServiceSignals, ServiceStats, SourceId,
    SourceSet,
};
use crate::core::registers::{RegisterFile, RegisterStatus, Tables};
use serde::{Deserialize, Serialize};

/// Inputs sampled by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInputs {
    /// Raw level of every request line
    pub requests: SourceSet,

    /// Acknowledge pulse for the interrupt currently presented
    pub ack: bool,

    /// Soft reset
    pub reset: bool,
}

impl TickInputs {
    /// Inputs with only request lines driven
    pub fn requests(bits: u32) -> Self {
        Self {
            requests: SourceSet::from_bits(bits),
            ..Self::default()
        }
    }

    /// Same inputs with the ack pulse asserted
    pub fn with_ack(self) -> Self {
        Self { ack: true, ..self }
    }
}

/// Reset flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Clear pending, wait counters, service state and CURRENT_ID; keep configuration
    Soft,
    /// Soft reset plus restore the construction-time configuration tables
    Hard,
}

/// Priority interrupt controller
///
/// # Example
///
/// ```
/// use irqarb::core::controller::{ControllerConfig, InterruptController, TickInputs};
///
/// let config = ControllerConfig {
///     sources: 4,
///     priorities: vec![3, 1, 2, 0],
///     mask: 0xF,
///     ..Default::default()
/// };
/// let mut ic = InterruptController::new(config)?;
///
/// // Sources 0 and 1 request together: 0 has the higher priority
/// let out = ic.tick(TickInputs::requests(0b0011));
/// assert!(out.interrupt_valid);
/// assert_eq!(out.interrupt_id, 0);
///
/// // Acknowledge, then source 1 is granted on the next tick
/// let out = ic.tick(TickInputs::requests(0b0010).with_ack());
/// assert!(!out.interrupt_valid);
/// let out = ic.tick(TickInputs::requests(0b0010));
/// assert_eq!(out.interrupt_id, 1);
/// # Ok::<(), irqarb::core::error::ControllerError>(())
/// ```
pub struct InterruptController {
    /// Construction-time configuration (hard reset target)
    config: ControllerConfig,

    /// Tables the arbiter reads this tick
    live: Tables,

    /// Register file holding staged tables
    registers: RegisterFile,

    latch: RequestLatch,
    aging: AgingMonitor,
    service: ServiceController,
    diagnostics: DiagnosticLog,

    /// Effective priority per source, rebuilt every arbitration round
    effective: Vec<u8>,

    /// Ticks executed so far
    ticks: u64,
}

impl InterruptController {
    /// Build a controller from a configuration
    ///
    /// # Errors
    ///
    /// Returns the [`ControllerConfig::validate`] error if the configuration is unusable.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let sources = config.sources;
        let tables = config.tables();
        log::info!(
            "InterruptController: {} sources, threshold {}, aging policy {:?}",
            sources,
            config.starvation_threshold,
            config.aging_policy
        );

        Ok(Self {
            live: tables.clone(),
            registers: RegisterFile::new(tables, sources),
            latch: RequestLatch::new(sources),
            aging: AgingMonitor::new(
                sources,
                config.starvation_threshold,
                config.aging_policy.build(),
            ),
            service: ServiceController::new(),
            diagnostics: DiagnosticLog::new(config.diagnostic_capacity),
            effective: vec![0; sources as usize],
            ticks: 0,
            config,
        })
    }

    /// Controller with default configuration and `sources` sources
    pub fn with_sources(sources: u8) -> Result<Self> {
        Self::new(ControllerConfig::with_sources(sources))
    }

    /// Advance one tick
    ///
    /// # Arguments
    ///
    /// * `inputs` - Request lines, ack pulse and reset for this tick
    ///
    /// # Returns
    ///
    /// Consumer-visible signals at the end of the tick
    pub fn tick(&mut self, inputs: TickInputs) -> ServiceSignals {
        let tick = self.ticks;
        self.ticks += 1;

        if inputs.reset {
            self.reset(ResetKind::Soft);
            return self.signals();
        }

        let idle_at_start = self.service.state() == ArbiterState::Idle;

        self.latch.sample(inputs.requests, self.live.edge_mode);

        let pending = self.latch.pending();
        let visible = visible(pending, self.live.mask);

        if idle_at_start {
            self.aging.tick(pending, visible);
            self.refresh_effective();
            self.service.grant(
                visible,
                &self.effective,
                &self.live.vectors,
                &mut self.aging,
            );
        }

        if inputs.ack {
            if idle_at_start {
                let err = self.service.reject_ack();
                self.report(tick, &err);
            } else if let Err(err) = self.service.ack_pin(&mut self.latch, &mut self.aging) {
                self.report(tick, &err);
            }
        }

        self.commit();

        log::trace!(
            "Tick {}: pending={} visible={} signals={:?}",
            tick,
            pending,
            visible,
            self.service.signals()
        );
        self.signals()
    }

    /// Acknowledge a specific source immediately
    ///
    /// This is the id-checked counterpart of the ack pulse. It takes effect
    /// at once rather than at the next commit.
    ///
    /// # Errors
    ///
    /// `SpuriousAck` if idle or `id` is not being serviced. Nothing changes;
    /// the event is also recorded as a diagnostic.
    pub fn acknowledge(&mut self, id: SourceId) -> Result<ActiveService> {
        let result = self
            .service
            .acknowledge(id, &mut self.latch, &mut self.aging);
        if let Err(err) = &result {
            self.report(self.ticks, err);
        }
        result
    }

    /// Reset the controller
    pub fn reset(&mut self, kind: ResetKind) {
        self.latch.reset();
        self.aging.reset_all();
        self.service.reset();

        if kind == ResetKind::Hard {
            let tables = self.config.tables();
            self.registers.load(tables.clone(), 0);
            self.live = tables;
        }
        log::debug!("InterruptController: {:?} reset", kind);
    }

    /// Consumer-visible signals
    pub fn signals(&self) -> ServiceSignals {
        self.service.signals()
    }

    /// Validate a raw source id against this controller
    ///
    /// # Errors
    ///
    /// `OutOfRangeSource` if `raw >= N`.
    pub fn source(&self, raw: u32) -> Result<SourceId> {
        SourceId::new(raw, self.sources())
    }

    /// Number of sources (N)
    pub fn sources(&self) -> u8 {
        self.config.sources
    }

    /// Construction-time configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Arbiter state
    pub fn state(&self) -> ArbiterState {
        self.service.state()
    }

    /// Service in flight, if any
    pub fn active(&self) -> Option<ActiveService> {
        self.service.active()
    }

    /// Handshake counters
    pub fn stats(&self) -> ServiceStats {
        self.service.stats()
    }

    /// Raw pending set (masked sources included)
    pub fn pending(&self) -> SourceSet {
        self.latch.pending()
    }

    /// Tables the arbiter is currently using
    pub fn live_tables(&self) -> &Tables {
        &self.live
    }

    /// Tables as written through the register file, not yet committed
    pub fn staged_tables(&self) -> &Tables {
        self.registers.staged()
    }

    /// Rounds `id` has been waiting
    pub fn wait(&self, id: SourceId) -> u32 {
        self.aging.wait(id)
    }

    /// Priority `id` would arbitrate with right now
    pub fn effective_priority(&self, id: SourceId) -> u8 {
        self.live.priorities.effective(id, self.aging.boost(id))
    }

    /// Take all recorded diagnostics, oldest first
    pub fn drain_diagnostics(&mut self) -> Vec<DiagnosticEvent> {
        self.diagnostics.drain()
    }

    /// Diagnostics lost to log overflow
    pub fn diagnostics_dropped(&self) -> u64 {
        self.diagnostics.dropped()
    }

    fn refresh_effective(&mut self) {
        for (index, slot) in self.effective.iter_mut().enumerate() {
            let id = SourceId::from_index(index);
            *slot = self.live.priorities.effective(id, self.aging.boost(id));
        }
    }

    fn commit(&mut self) {
        if self.registers.take_dirty() {
            self.live = self.registers.staged().clone();
            log::debug!("InterruptController: staged configuration committed");
        }
    }

    fn report(&mut self, tick: u64, err: &ControllerError) {
        if let Some(diagnostic) = Diagnostic::from_error(err) {
            self.diagnostics.push(tick, diagnostic);
        }
    }
}

impl IODevice for InterruptController {
    fn address_range(&self) -> (u32, u32) {
        let base = self.config.base_address;
        (base, base + config::register_window(self.sources()))
    }

    fn read_register(&self, offset: u32) -> Result<u32> {
        self.registers.read(
            offset,
            RegisterStatus {
                current_id: self.service.current_id(),
                pending: self.latch.pending(),
            },
        )
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        match self.registers.write(offset, value) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.report(self.ticks, &err);
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        "Priority Interrupt Controller"
    }
}
