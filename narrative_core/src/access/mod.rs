//! Simulation Access - staged gates with partial-progress reporting.
//!
//! Checks run in a fixed order and stop at the first failure:
//! trust minimum, previous stage, pattern minimum, knowledge flags, global flags.

use serde::{Deserialize, Serialize};
use story_rules::{PatternType, PlayerState};

/// A minimum value for one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRequirement {
    pub pattern: PatternType,
    pub min: i32,
}

/// Requirements for entering one stage of gated content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessRequirements {
    pub trust_min: Option<i32>,
    /// Global flag set when the prior stage was completed.
    pub previous_stage_flag: Option<String>,
    pub pattern_min: Option<PatternRequirement>,
    pub required_knowledge_flags: Vec<String>,
    pub required_global_flags: Vec<String>,
}

impl AccessRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trust_at_least(mut self, min: i32) -> Self {
        self.trust_min = Some(min);
        self
    }

    pub fn after_stage(mut self, flag: impl Into<String>) -> Self {
        self.previous_stage_flag = Some(flag.into());
        self
    }

    pub fn pattern_at_least(mut self, pattern: PatternType, min: i32) -> Self {
        self.pattern_min = Some(PatternRequirement { pattern, min });
        self
    }

    pub fn with_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.required_knowledge_flags.push(flag.into());
        self
    }

    pub fn with_global_flag(mut self, flag: impl Into<String>) -> Self {
        self.required_global_flags.push(flag.into());
        self
    }

    fn needs_character(&self) -> bool {
        self.trust_min.is_some() || !self.required_knowledge_flags.is_empty()
    }
}

/// Which check denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenial {
    UnknownCharacter,
    InsufficientTrust,
    PreviousStageIncomplete,
    PatternTooLow,
    MissingKnowledge,
    MissingGlobalFlags,
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessResult {
    pub can_access: bool,
    pub reason: Option<AccessDenial>,
    pub message: Option<String>,
    /// 0.0-1.0 progress toward the failing check; 1.0 when granted.
    pub progress: f32,
}

impl AccessResult {
    fn granted() -> Self {
        Self {
            can_access: true,
            reason: None,
            message: None,
            progress: 1.0,
        }
    }

    fn denied(reason: AccessDenial, message: String, progress: f32) -> Self {
        Self {
            can_access: false,
            reason: Some(reason),
            message: Some(message),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

fn ratio(have: i32, need: i32) -> f32 {
    if need <= 0 {
        1.0
    } else {
        have.max(0) as f32 / need as f32
    }
}

fn held_fraction<'a>(required: &'a [String], held: impl Fn(&str) -> bool) -> (Vec<&'a str>, f32) {
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|flag| !held(*flag))
        .collect();
    let fraction = (required.len() - missing.len()) as f32 / required.len().max(1) as f32;
    (missing, fraction)
}

/// Check staged requirements for `character_id`.
pub fn evaluate_access(
    requirements: &AccessRequirements,
    state: &PlayerState,
    character_id: &str,
) -> AccessResult {
    let character = state.character(character_id);
    if requirements.needs_character() && character.is_none() {
        return AccessResult::denied(
            AccessDenial::UnknownCharacter,
            format!("Unknown character '{}'", character_id),
            0.0,
        );
    }

    if let (Some(min), Some(character)) = (requirements.trust_min, character) {
        if character.trust < min {
            return AccessResult::denied(
                AccessDenial::InsufficientTrust,
                format!("Requires trust {} (currently {})", min, character.trust),
                ratio(character.trust, min),
            );
        }
    }

    if let Some(flag) = &requirements.previous_stage_flag {
        if !state.has_global_flag(flag) {
            return AccessResult::denied(
                AccessDenial::PreviousStageIncomplete,
                "Complete the previous stage first".to_string(),
                0.0,
            );
        }
    }

    if let Some(req) = requirements.pattern_min {
        let value = state.pattern(req.pattern);
        if value < req.min {
            return AccessResult::denied(
                AccessDenial::PatternTooLow,
                format!("Requires {} {} (currently {})", req.pattern, req.min, value),
                ratio(value, req.min),
            );
        }
    }

    if let Some(character) = character {
        let (missing, fraction) =
            held_fraction(&requirements.required_knowledge_flags, |f| character.knows(f));
        if !missing.is_empty() {
            return AccessResult::denied(
                AccessDenial::MissingKnowledge,
                format!("Still need to learn: {}", missing.join(", ")),
                fraction,
            );
        }
    }

    let (missing, fraction) =
        held_fraction(&requirements.required_global_flags, |f| state.has_global_flag(f));
    if !missing.is_empty() {
        return AccessResult::denied(
            AccessDenial::MissingGlobalFlags,
            format!("Still need: {}", missing.join(", ")),
            fraction,
        );
    }

    AccessResult::granted()
}
