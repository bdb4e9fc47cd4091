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

//! Controller configuration
//!
//! Construction-time parameters and the power-on contents of the
//! configuration tables, loadable from TOML:
//!
//! ```toml
//! sources = 4
//! starvation_threshold = 5
//! aging_policy = "linear"
//! priorities = [3, 1, 2, 0]
//! mask = 0xF
//! vectors = [0x1000, 0x1100, 0x1200, 0x1300]
//! ```

use crate::core::error::{ControllerError, Result};
use crate::core::interrupt::{AgingPolicyKind, SourceId, SourceSet, MAX_SOURCES};
use crate::core::registers::Tables;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Number of interrupt sources (N), 1..=32
    pub sources: u8,

    /// Rounds a pending source waits before aging boosts it
    pub starvation_threshold: u32,

    /// Boost curve
    pub aging_policy: AgingPolicyKind,

    /// Base priorities by source id (missing entries are 0)
    pub priorities: Vec<u8>,

    /// Initial MASK (bit i = source i enabled)
    pub mask: u32,

    /// Dispatch addresses by source id (missing entries are 0)
    pub vectors: Vec<u32>,

    /// Initial EDGE_MODE (bit i = source i edge-triggered)
    pub edge_mode: u32,

    /// Physical address the register file is mapped at
    pub base_address: u32,

    /// Diagnostic events retained before the oldest are dropped
    pub diagnostic_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sources: 8,
            starvation_threshold: 5,
            aging_policy: AgingPolicyKind::default(),
            priorities: Vec::new(),
            mask: 0,
            vectors: Vec::new(),
            edge_mode: 0,
            base_address: 0,
            diagnostic_capacity: 64,
        }
    }
}

impl ControllerConfig {
    /// Default configuration for `sources` sources
    pub fn with_sources(sources: u8) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Config` if it does not parse or fails
    /// [`validate`](Self::validate).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: ControllerConfig = toml::from_str(&contents).map_err(|e| {
            ControllerError::Config(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ControllerError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check the configuration is buildable
    ///
    /// # Errors
    ///
    /// - `InvalidSourceCount` if `sources` is 0 or above 32
    /// - `Config` if a table has more entries than there are sources, or the
    ///   base address leaves no room for the register window
    pub fn validate(&self) -> Result<()> {
        if self.sources == 0 || self.sources > MAX_SOURCES {
            return Err(ControllerError::InvalidSourceCount {
                count: self.sources as u32,
            });
        }
        if self.priorities.len() > self.sources as usize {
            return Err(ControllerError::Config(format!(
                "{} priorities given for {} sources",
                self.priorities.len(),
                self.sources
            )));
        }
        if self.vectors.len() > self.sources as usize {
            return Err(ControllerError::Config(format!(
                "{} vectors given for {} sources",
                self.vectors.len(),
                self.sources
            )));
        }
        if self
            .base_address
            .checked_add(register_window(self.sources))
            .is_none()
        {
            return Err(ControllerError::Config(format!(
                "base address 0x{:08X} overflows the register window",
                self.base_address
            )));
        }
        Ok(())
    }

    /// Power-on configuration tables
    pub fn tables(&self) -> Tables {
        let mut tables = Tables::new(self.sources);
        for (index, &priority) in self.priorities.iter().enumerate() {
            tables
                .priorities
                .set_base(SourceId::from_index(index), priority);
        }
        for (index, &vector) in self.vectors.iter().enumerate() {
            tables.vectors.set(SourceId::from_index(index), vector);
        }
        tables.mask = SourceSet::from_bits(self.mask).truncate(self.sources);
        tables.edge_mode = SourceSet::from_bits(self.edge_mode).truncate(self.sources);
        tables
    }
}

/// Size in bytes of the register window minus one (last VECTOR word)
pub(crate) const fn register_window(sources: u8) -> u32 {
    // Last VECTOR window is 0x08 + ((N - 1) << 4); PENDING at 0x1C may lie beyond it
    let last_vector = 0x08 + (((sources as u32).saturating_sub(1)) << 4) + 3;
    if last_vector > 0x1F {
        last_vector
    } else {
        0x1F
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sources, 8);
        assert_eq!(config.starvation_threshold, 5);
    }

    #[test]
    fn test_validate_source_count() {
        assert!(matches!(
            ControllerConfig::with_sources(0).validate(),
            Err(ControllerError::InvalidSourceCount { count: 0 })
        ));
        assert!(matches!(
            ControllerConfig::with_sources(33).validate(),
            Err(ControllerError::InvalidSourceCount { count: 33 })
        ));
        assert!(ControllerConfig::with_sources(32).validate().is_ok());
    }

    #[test]
    fn test_validate_table_lengths() {
        let config = ControllerConfig {
            sources: 2,
            priorities: vec![1, 2, 3],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));

        let config = ControllerConfig {
            sources: 2,
            vectors: vec![0; 3],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_validate_base_address_overflow() {
        let config = ControllerConfig {
            base_address: u32::MAX - 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_tables_from_config() {
        let config = ControllerConfig {
            sources: 4,
            priorities: vec![3, 1, 20],
            vectors: vec![0x100, 0x200],
            mask: 0xFF,
            edge_mode: 0b10,
            ..Default::default()
        };
        let tables = config.tables();
        assert_eq!(tables.priorities.base(SourceId::from_index(0)), 3);
        assert_eq!(tables.priorities.base(SourceId::from_index(2)), 15);
        assert_eq!(tables.priorities.base(SourceId::from_index(3)), 0);
        assert_eq!(tables.vectors.vector(SourceId::from_index(1)), 0x200);
        assert_eq!(tables.mask.bits(), 0xF);
        assert_eq!(tables.edge_mode.bits(), 0b10);
    }

    #[test]
    fn test_register_window() {
        assert_eq!(register_window(1), 0x1F);
        assert_eq!(register_window(4), 0x3B);
        assert_eq!(register_window(32), 0x1FB);
    }

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let config: ControllerConfig =
            toml::from_str("sources = 4\naging_policy = \"linear\"\nmask = 15\n").unwrap();
        assert_eq!(config.sources, 4);
        assert_eq!(config.aging_policy, AgingPolicyKind::Linear);
        assert_eq!(config.mask, 0xF);
        assert_eq!(config.diagnostic_capacity, 64);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let config = ControllerConfig {
            sources: 4,
            priorities: vec![3, 1, 2, 0],
            vectors: vec![0x1000, 0x1100, 0x1200, 0x1300],
            mask: 0xF,
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();

        let loaded = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "sources = 0\n").unwrap();
        assert!(matches!(
            ControllerConfig::load(file.path()),
            Err(ControllerError::InvalidSourceCount { .. })
        ));

        std::fs::write(file.path(), "sources = \"many\"\n").unwrap();
        assert!(matches!(
            ControllerConfig::load(file.path()),
            Err(ControllerError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ControllerConfig::load("/nonexistent/irqarb.toml"),
            Err(ControllerError::Io(_))
        ));
    }
}
