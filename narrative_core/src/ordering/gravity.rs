//! Narrative gravity - biases choice order by a character's nervous-system state.

use serde::{Deserialize, Serialize};
use story_rules::{GravityEffect, GravityTable, PatternType, PlayerState, NEUTRAL_WEIGHT};
use tracing::debug;

use crate::conditions::EvaluatedChoice;

/// Display weight for a choice and the effect that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravity {
    pub weight: f32,
    pub effect: GravityEffect,
}

impl Gravity {
    pub fn neutral() -> Self {
        Self {
            weight: NEUTRAL_WEIGHT,
            effect: GravityEffect::Neutral,
        }
    }

    pub fn from_effect(effect: GravityEffect) -> Self {
        Self {
            weight: effect.weight(),
            effect,
        }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Looks up gravity in a fixed state table. Pure and O(1).
#[derive(Debug, Clone, Default)]
pub struct NarrativeGravity {
    table: GravityTable,
}

impl NarrativeGravity {
    pub fn new(table: GravityTable) -> Self {
        Self { table }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &GravityTable {
        &self.table
    }

    /// Gravity of `pattern` for `character_id` in `state`.
    ///
    /// Untagged choices and unknown characters are neutral.
    pub fn calculate_gravity(
        &self,
        pattern: Option<PatternType>,
        state: &PlayerState,
        character_id: &str,
    ) -> Gravity {
        let Some(pattern) = pattern else {
            return Gravity::neutral();
        };
        match state.character(character_id) {
            Some(character) => {
                Gravity::from_effect(self.table.effect(character.nervous_system_state, pattern))
            }
            None => {
                debug!(character_id, "no character for gravity; using neutral weight");
                Gravity::neutral()
            }
        }
    }

    /// Fill in gravity for each evaluated choice.
    pub fn weigh_choices(
        &self,
        choices: &mut [EvaluatedChoice<'_>],
        state: &PlayerState,
        character_id: &str,
    ) {
        for choice in choices {
            choice.gravity = self.calculate_gravity(choice.choice.pattern, state, character_id);
        }
    }
}
