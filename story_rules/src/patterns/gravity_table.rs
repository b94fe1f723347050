//! The fixed nervous-system-state table behind narrative gravity.

use serde::{Deserialize, Serialize};

use super::PatternType;
use crate::characters::NervousSystemState;

/// Weight applied to a choice whose pattern the character is drawn toward.
pub const ATTRACT_WEIGHT: f32 = 1.5;
/// Weight applied to a choice whose pattern the character pulls away from.
pub const REPEL_WEIGHT: f32 = 0.6;
/// Weight for everything else.
pub const NEUTRAL_WEIGHT: f32 = 1.0;

/// How a choice's pattern interacts with a character's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityEffect {
    Attract,
    Repel,
    Neutral,
}

impl GravityEffect {
    pub fn weight(&self) -> f32 {
        match self {
            GravityEffect::Attract => ATTRACT_WEIGHT,
            GravityEffect::Repel => REPEL_WEIGHT,
            GravityEffect::Neutral => NEUTRAL_WEIGHT,
        }
    }
}

/// Attracted and repelled patterns for one nervous-system state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityRule {
    pub attracted: Vec<PatternType>,
    pub repelled: Vec<PatternType>,
}

impl GravityRule {
    pub fn new(attracted: &[PatternType], repelled: &[PatternType]) -> Self {
        Self {
            attracted: attracted.to_vec(),
            repelled: repelled.to_vec(),
        }
    }

    /// Attraction wins if a pattern is listed on both sides.
    pub fn effect(&self, pattern: PatternType) -> GravityEffect {
        if self.attracted.contains(&pattern) {
            GravityEffect::Attract
        } else if self.repelled.contains(&pattern) {
            GravityEffect::Repel
        } else {
            GravityEffect::Neutral
        }
    }
}

/// State -> rule table, one row per nervous-system state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityTable {
    pub ventral_vagal: GravityRule,
    pub sympathetic: GravityRule,
    pub dorsal_vagal: GravityRule,
}

impl Default for GravityTable {
    fn default() -> Self {
        use PatternType::*;
        Self {
            ventral_vagal: GravityRule::new(&[Exploring, Helping], &[]),
            sympathetic: GravityRule::new(&[Analytical, Building], &[Helping, Patience]),
            dorsal_vagal: GravityRule::new(&[Patience, Helping], &[Exploring, Analytical]),
        }
    }
}

impl GravityTable {
    pub fn rule(&self, state: NervousSystemState) -> &GravityRule {
        match state {
            NervousSystemState::VentralVagal => &self.ventral_vagal,
            NervousSystemState::Sympathetic => &self.sympathetic,
            NervousSystemState::DorsalVagal => &self.dorsal_vagal,
        }
    }

    pub fn effect(&self, state: NervousSystemState, pattern: PatternType) -> GravityEffect {
        self.rule(state).effect(pattern)
    }
}
