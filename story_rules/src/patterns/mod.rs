//! Decision-style pattern accumulators and the tables that describe them.

mod gravity_table;
mod metadata;

pub use gravity_table::*;
pub use metadata::*;

use serde::{Deserialize, Serialize};

/// The five decision-style tendencies tracked across a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Analytical,
    Patience,
    Exploring,
    Helping,
    Building,
}

impl PatternType {
    /// Canonical order, also used to break ties.
    pub const ALL: [PatternType; 5] = [
        PatternType::Analytical,
        PatternType::Patience,
        PatternType::Exploring,
        PatternType::Helping,
        PatternType::Building,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Analytical => "analytical",
            PatternType::Patience => "patience",
            PatternType::Exploring => "exploring",
            PatternType::Helping => "helping",
            PatternType::Building => "building",
        }
    }

    /// Parse a canonical pattern key.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == key)
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated value for each pattern. Unbounded; clamp only for display.
///
/// Serialized as a map with exactly the five canonical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternScores {
    pub analytical: i32,
    pub patience: i32,
    pub exploring: i32,
    pub helping: i32,
    pub building: i32,
}

impl PatternScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pattern: PatternType) -> i32 {
        match pattern {
            PatternType::Analytical => self.analytical,
            PatternType::Patience => self.patience,
            PatternType::Exploring => self.exploring,
            PatternType::Helping => self.helping,
            PatternType::Building => self.building,
        }
    }

    pub fn get_mut(&mut self, pattern: PatternType) -> &mut i32 {
        match pattern {
            PatternType::Analytical => &mut self.analytical,
            PatternType::Patience => &mut self.patience,
            PatternType::Exploring => &mut self.exploring,
            PatternType::Helping => &mut self.helping,
            PatternType::Building => &mut self.building,
        }
    }

    pub fn with(mut self, pattern: PatternType, value: i32) -> Self {
        *self.get_mut(pattern) = value;
        self
    }

    /// Add a signed delta to one accumulator.
    pub fn add(&mut self, pattern: PatternType, delta: i32) {
        let value = self.get_mut(pattern);
        *value = value.saturating_add(delta);
    }

    /// Value clamped to `0..=max` for display purposes.
    pub fn display_value(&self, pattern: PatternType, max: i32) -> i32 {
        self.get(pattern).clamp(0, max.max(0))
    }

    /// The strongest tendency, or `None` while every accumulator is at or below zero.
    /// Ties go to the earlier pattern in canonical order.
    pub fn dominant(&self) -> Option<PatternType> {
        let mut best: Option<(PatternType, i32)> = None;
        for pattern in PatternType::ALL {
            let value = self.get(pattern);
            if value <= 0 {
                continue;
            }
            match best {
                Some((_, best_value)) if best_value >= value => {}
                _ => best = Some((pattern, value)),
            }
        }
        best.map(|(pattern, _)| pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternType, i32)> + '_ {
        PatternType::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}
