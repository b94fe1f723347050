//! Access conditions - a conjunction of independent predicate groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::characters::RelationshipStatus;
use crate::patterns::PatternType;

/// Inclusive numeric range. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl ValueRange {
    pub fn at_least(min: i32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: i32) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: i32, max: i32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// How far `value` sits outside the range (0 when inside).
    pub fn distance(&self, value: i32) -> u32 {
        let gap = match (self.min, self.max) {
            (Some(min), _) if value < min => i64::from(min) - i64::from(value),
            (_, Some(max)) if value > max => i64::from(value) - i64::from(max),
            _ => 0,
        };
        u32::try_from(gap).unwrap_or(u32::MAX)
    }
}

/// An authored access condition.
///
/// Every group is optional; an absent (or empty) group is vacuously satisfied.
/// All present groups must hold. There is no disjunction: alternatives are
/// expressed as separate graph edges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<ValueRange>,

    /// Relationship status must be one of these.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationship_status: Vec<RelationshipStatus>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lacks_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lacks_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub patterns: BTreeMap<PatternType, ValueRange>,

    /// Mystery key -> required resolution value.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mysteries: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_combos: Vec<String>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trust(mut self, range: ValueRange) -> Self {
        self.trust = Some(range);
        self
    }

    pub fn trust_at_least(self, min: i32) -> Self {
        self.with_trust(ValueRange::at_least(min))
    }

    pub fn with_relationship(mut self, status: RelationshipStatus) -> Self {
        self.relationship_status.push(status);
        self
    }

    pub fn with_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.has_knowledge_flags.push(flag.into());
        self
    }

    pub fn without_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.lacks_knowledge_flags.push(flag.into());
        self
    }

    pub fn with_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.has_global_flags.push(flag.into());
        self
    }

    pub fn without_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.lacks_global_flags.push(flag.into());
        self
    }

    pub fn with_pattern(mut self, pattern: PatternType, range: ValueRange) -> Self {
        self.patterns.insert(pattern, range);
        self
    }

    pub fn with_mystery(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.mysteries.insert(key.into(), value.into());
        self
    }

    pub fn with_combo(mut self, combo_id: impl Into<String>) -> Self {
        self.required_combos.push(combo_id.into());
        self
    }

    /// Whether any group needs a character to evaluate against.
    pub fn is_character_scoped(&self) -> bool {
        self.trust.is_some()
            || !self.relationship_status.is_empty()
            || !self.has_knowledge_flags.is_empty()
            || !self.lacks_knowledge_flags.is_empty()
    }

    /// No groups at all; always satisfied.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
