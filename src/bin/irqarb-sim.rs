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

//! irqarb-sim entry point
//!
//! Runs a JSON scenario against a controller built from a TOML config and
//! writes one JSON line per tick.

use clap::Parser;
use irqarb::core::controller::scenario::{self, Scenario, Step};
use irqarb::{ControllerConfig, ControllerError, InterruptController};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Priority interrupt controller simulator")]
struct Opts {
    /// Controller configuration (TOML); defaults are used when omitted
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stimulus scenario (JSON)
    #[arg(long, short, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Trace output (JSON lines); stdout when omitted
    #[arg(long, short, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Idle ticks to run after the scenario
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    dump_config: Option<PathBuf>,

    /// Write a save state after the run
    #[arg(long, value_name = "FILE")]
    save_state: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => {
            log::info!("Config: {}", path.display());
            ControllerConfig::load(path)?
        }
        None => ControllerConfig::default(),
    };

    if let Some(path) = &opts.dump_config {
        config.save(path)?;
        log::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let mut scenario = match &opts.scenario {
        Some(path) => {
            log::info!("Scenario: {}", path.display());
            Scenario::load(path)?
        }
        None => Scenario::default(),
    };
    if opts.ticks > 0 {
        scenario.steps.push(Step {
            repeat: opts.ticks,
            ..Step::default()
        });
    }

    let mut ic = InterruptController::new(config)?;

    let mut out: Box<dyn Write> = match &opts.trace {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = scenario::run(&mut ic, &scenario, |record| {
        serde_json::to_writer(&mut out, record)
            .map_err(|e| ControllerError::Scenario(format!("failed to write trace: {}", e)))?;
        out.write_all(b"\n")?;
        Ok(())
    })?;
    out.flush()?;

    log::info!(
        "Ran {} ticks: {} grants, {} acks, {} spurious acks, {} diagnostics",
        summary.ticks,
        summary.stats.grants,
        summary.stats.acks,
        summary.stats.spurious_acks,
        summary.diagnostics
    );

    if let Some(path) = &opts.save_state {
        std::fs::write(path, ic.save_state()?)?;
        log::info!("Save state written to {}", path.display());
    }

    Ok(())
}
