//! Pattern labels and unlock thresholds.

use serde::{Deserialize, Serialize};

use super::PatternType;
use crate::error::RulesError;

/// Unlock thresholds for one pattern, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternThresholds {
    pub emerging: i32,
    pub developing: i32,
    pub flourishing: i32,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            emerging: 3,
            developing: 6,
            flourishing: 9,
        }
    }
}

/// How far a pattern has developed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLevel {
    Dormant,
    Emerging,
    Developing,
    Flourishing,
}

/// Display metadata for one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternInfo {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thresholds: PatternThresholds,
}

impl PatternInfo {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            thresholds: PatternThresholds::default(),
        }
    }

    pub fn level(&self, value: i32) -> PatternLevel {
        let t = &self.thresholds;
        if value >= t.flourishing {
            PatternLevel::Flourishing
        } else if value >= t.developing {
            PatternLevel::Developing
        } else if value >= t.emerging {
            PatternLevel::Emerging
        } else {
            PatternLevel::Dormant
        }
    }
}

/// Read-only metadata for all five patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTable {
    pub analytical: PatternInfo,
    pub patience: PatternInfo,
    pub exploring: PatternInfo,
    pub helping: PatternInfo,
    pub building: PatternInfo,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self {
            analytical: PatternInfo::new("Analytical", "Breaks problems down before acting"),
            patience: PatternInfo::new("Patience", "Lets situations unfold before responding"),
            exploring: PatternInfo::new("Exploring", "Follows curiosity into the unknown"),
            helping: PatternInfo::new("Helping", "Puts other people's needs first"),
            building: PatternInfo::new("Building", "Turns ideas into working things"),
        }
    }
}

impl PatternTable {
    pub fn info(&self, pattern: PatternType) -> &PatternInfo {
        match pattern {
            PatternType::Analytical => &self.analytical,
            PatternType::Patience => &self.patience,
            PatternType::Exploring => &self.exploring,
            PatternType::Helping => &self.helping,
            PatternType::Building => &self.building,
        }
    }

    pub fn label(&self, pattern: PatternType) -> &str {
        &self.info(pattern).label
    }

    pub fn level(&self, pattern: PatternType, value: i32) -> PatternLevel {
        self.info(pattern).level(value)
    }

    /// Highest threshold for a pattern; the display clamp ceiling.
    pub fn max_threshold(&self, pattern: PatternType) -> i32 {
        self.info(pattern).thresholds.flourishing
    }

    /// Check every pattern's thresholds are ascending.
    pub fn validate(&self) -> Result<(), RulesError> {
        for pattern in PatternType::ALL {
            let t = self.info(pattern).thresholds;
            if !(t.emerging <= t.developing && t.developing <= t.flourishing) {
                return Err(RulesError::InvalidTable(format!(
                    "thresholds for {} are not ascending",
                    pattern
                )));
            }
        }
        Ok(())
    }
}
