//! Engine configuration, loadable from TOML.
//!
//! Every section falls back to its defaults, so a partial file only needs to
//! name what it overrides:
//!
//! ```toml
//! [trust]
//! max = 12
//!
//! [gravity.sympathetic]
//! attracted = ["building"]
//! repelled = ["helping"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RulesError;
use crate::patterns::{GravityTable, PatternTable};

/// Trust bounds and whether the mutator enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub min: i32,
    pub max: i32,
    /// Clamp trust into `min..=max` whenever a delta is applied.
    pub clamp: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            min: 0,
            max: 10,
            clamp: true,
        }
    }
}

impl TrustConfig {
    pub fn apply(&self, trust: i32) -> i32 {
        if self.clamp {
            trust.clamp(self.min, self.max)
        } else {
            trust
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// How many recently shown variants to remember per node.
    pub recent_history_len: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            recent_history_len: 3,
        }
    }
}

/// Display-order algorithm for choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingVariant {
    DeterministicShuffle,
    GravityStrict,
    #[default]
    GravityBucketShuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    pub variant: OrderingVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub save_key: String,
    pub backup_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_key: "crossroads_save".to_string(),
            backup_key: "crossroads_save_backup".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub trust: TrustConfig,
    pub content: ContentConfig,
    pub ordering: OrderingConfig,
    pub persistence: PersistenceConfig,
    pub patterns: PatternTable,
    pub gravity: GravityTable,
}

impl NarrativeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, RulesError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.trust.min > self.trust.max {
            return Err(RulesError::InvalidTable(format!(
                "trust.min ({}) exceeds trust.max ({})",
                self.trust.min, self.trust.max
            )));
        }
        if self.persistence.save_key == self.persistence.backup_key {
            return Err(RulesError::InvalidTable(
                "persistence.save_key and persistence.backup_key must differ".to_string(),
            ));
        }
        self.patterns.validate()
    }
}
