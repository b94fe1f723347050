//! Descriptions of why a condition did not hold.

use story_rules::{PatternType, RelationshipStatus, ValueRange};

/// The first predicate group that failed during evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionFailure {
    /// A character-scoped group was present but no character could be resolved.
    UnknownCharacter(Option<String>),
    Trust {
        range: ValueRange,
        actual: i32,
    },
    Relationship {
        allowed: Vec<RelationshipStatus>,
        actual: RelationshipStatus,
    },
    MissingKnowledge(String),
    ForbiddenKnowledge(String),
    MissingGlobalFlag(String),
    ForbiddenGlobalFlag(String),
    Pattern {
        pattern: PatternType,
        range: ValueRange,
        actual: i32,
    },
    Mystery {
        key: String,
        expected: String,
        actual: Option<String>,
    },
    MissingCombo(String),
    PatternLock {
        pattern: PatternType,
        threshold: i32,
        actual: i32,
    },
}

impl ConditionFailure {
    /// Player-facing reason a choice is locked.
    pub fn describe(&self) -> String {
        match self {
            ConditionFailure::UnknownCharacter(_) => "Not available right now".to_string(),
            ConditionFailure::Trust { range, actual } => match (range.min, range.max) {
                (Some(min), _) if *actual < min => format!("Requires more trust ({}+)", min),
                (_, Some(max)) => format!("Only available at trust {} or below", max),
                _ => "Requires a different level of trust".to_string(),
            },
            ConditionFailure::Relationship { allowed, .. } => {
                let names: Vec<_> = allowed.iter().map(|s| s.as_str()).collect();
                format!("Requires relationship: {}", names.join(" or "))
            }
            ConditionFailure::MissingKnowledge(_) => "You need to learn more first".to_string(),
            ConditionFailure::ForbiddenKnowledge(_) => {
                "No longer relevant after what you learned".to_string()
            }
            ConditionFailure::MissingGlobalFlag(_) => "Something needs to happen first".to_string(),
            ConditionFailure::ForbiddenGlobalFlag(_) => "No longer available".to_string(),
            ConditionFailure::Pattern {
                pattern,
                range,
                actual,
            } => match (range.min, range.max) {
                (Some(min), _) if *actual < min => format!("Requires {} {}+", pattern, min),
                _ => format!("Requires less {}", pattern),
            },
            ConditionFailure::Mystery { .. } => "The mystery has not unfolded that way".to_string(),
            ConditionFailure::MissingCombo(combo) => format!("Requires combo: {}", combo),
            ConditionFailure::PatternLock {
                pattern,
                threshold,
                actual,
            } => format!("Requires {} {} ({}/{})", pattern, threshold, actual, threshold),
        }
    }

    /// Rough effort needed to clear this failure; used to pick the easiest
    /// locked choice.
    pub fn deficit(&self) -> u32 {
        match self {
            ConditionFailure::UnknownCharacter(_) => 1_000,
            ConditionFailure::Trust { range, actual } => range.distance(*actual),
            ConditionFailure::Pattern { range, actual, .. } => range.distance(*actual),
            ConditionFailure::PatternLock {
                threshold, actual, ..
            } => ValueRange::at_least(*threshold).distance(*actual),
            _ => 1,
        }
    }
}

impl std::fmt::Display for ConditionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
