//! Condition Evaluator - decides whether authored access conditions hold.
//!
//! Two failure policies coexist on purpose:
//! - A single predicate that needs a character it cannot resolve **fails closed**.
//! - A choice set that would show nothing **fails open** and shows everything.

mod failure;

pub use failure::*;

use rand::seq::SliceRandom;
use rand::Rng;
use story_rules::{Choice, Condition, DialogueNode, PlayerState};
use tracing::{info, warn};

use crate::ordering::{DisplayOrdered, Gravity};

/// Check a condition against a state. `character_id` is required only when the
/// condition has character-scoped groups.
pub fn evaluate(condition: &Condition, state: &PlayerState, character_id: Option<&str>) -> bool {
    first_failure(condition, state, character_id).is_none()
}

/// Like [`evaluate`], treating an absent condition as satisfied.
pub fn evaluate_optional(
    condition: Option<&Condition>,
    state: &PlayerState,
    character_id: Option<&str>,
) -> bool {
    condition.map_or(true, |c| evaluate(c, state, character_id))
}

/// The first failing predicate group, in evaluation order.
pub fn first_failure(
    condition: &Condition,
    state: &PlayerState,
    character_id: Option<&str>,
) -> Option<ConditionFailure> {
    check(condition, state, character_id, true).into_iter().next()
}

/// Human-readable reason for the first failing predicate group, if any.
pub fn describe_first_failure(
    condition: &Condition,
    state: &PlayerState,
    character_id: Option<&str>,
) -> Option<String> {
    first_failure(condition, state, character_id).map(|f| f.describe())
}

/// Every failing predicate group.
pub fn all_failures(
    condition: &Condition,
    state: &PlayerState,
    character_id: Option<&str>,
) -> Vec<ConditionFailure> {
    check(condition, state, character_id, false)
}

struct Failures {
    items: Vec<ConditionFailure>,
    first_only: bool,
}

impl Failures {
    /// Record a failure; returns true when evaluation should stop.
    fn push(&mut self, failure: ConditionFailure) -> bool {
        self.items.push(failure);
        self.first_only
    }
}

fn check(
    condition: &Condition,
    state: &PlayerState,
    character_id: Option<&str>,
    first_only: bool,
) -> Vec<ConditionFailure> {
    let mut failures = Failures {
        items: Vec::new(),
        first_only,
    };

    if condition.is_character_scoped() {
        let Some(character) = character_id.and_then(|id| state.character(id)) else {
            warn!(
                character_id = character_id.unwrap_or("<none>"),
                "character-scoped condition without a resolvable character; failing closed"
            );
            failures.push(ConditionFailure::UnknownCharacter(
                character_id.map(str::to_string),
            ));
            return failures.items;
        };

        if let Some(range) = condition.trust {
            if !range.contains(character.trust)
                && failures.push(ConditionFailure::Trust {
                    range,
                    actual: character.trust,
                })
            {
                return failures.items;
            }
        }

        if !condition.relationship_status.is_empty()
            && !condition
                .relationship_status
                .contains(&character.relationship_status)
            && failures.push(ConditionFailure::Relationship {
                allowed: condition.relationship_status.clone(),
                actual: character.relationship_status,
            })
        {
            return failures.items;
        }

        for flag in &condition.has_knowledge_flags {
            if !character.knows(flag)
                && failures.push(ConditionFailure::MissingKnowledge(flag.clone()))
            {
                return failures.items;
            }
        }

        for flag in &condition.lacks_knowledge_flags {
            if character.knows(flag)
                && failures.push(ConditionFailure::ForbiddenKnowledge(flag.clone()))
            {
                return failures.items;
            }
        }
    }

    for flag in &condition.has_global_flags {
        if !state.has_global_flag(flag)
            && failures.push(ConditionFailure::MissingGlobalFlag(flag.clone()))
        {
            return failures.items;
        }
    }

    for flag in &condition.lacks_global_flags {
        if state.has_global_flag(flag)
            && failures.push(ConditionFailure::ForbiddenGlobalFlag(flag.clone()))
        {
            return failures.items;
        }
    }

    for (pattern, range) in &condition.patterns {
        let actual = state.pattern(*pattern);
        if !range.contains(actual)
            && failures.push(ConditionFailure::Pattern {
                pattern: *pattern,
                range: *range,
                actual,
            })
        {
            return failures.items;
        }
    }

    for (key, expected) in &condition.mysteries {
        let actual = state.mystery(key);
        if actual != Some(expected.as_str())
            && failures.push(ConditionFailure::Mystery {
                key: key.clone(),
                expected: expected.clone(),
                actual: actual.map(str::to_string),
            })
        {
            return failures.items;
        }
    }

    for combo in &condition.required_combos {
        if !state.has_combo(combo) && failures.push(ConditionFailure::MissingCombo(combo.clone())) {
            return failures.items;
        }
    }

    failures.items
}

/// A choice together with its visibility and enablement for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedChoice<'a> {
    pub choice: &'a Choice,
    pub visible: bool,
    /// Always false when not visible.
    pub enabled: bool,
    /// Why a visible choice is locked.
    pub locked_reason: Option<String>,
    pub gravity: Gravity,
    /// Enabled by the mercy fallback rather than by its own conditions.
    pub mercy_unlocked: bool,
}

impl<'a> EvaluatedChoice<'a> {
    pub fn key(&self) -> &'a str {
        self.choice.stable_key()
    }

    pub fn is_selectable(&self) -> bool {
        self.visible && self.enabled
    }
}

impl DisplayOrdered for EvaluatedChoice<'_> {
    fn ordering_key(&self) -> &str {
        self.choice.stable_key()
    }

    fn tie_breaker(&self) -> &str {
        &self.choice.next_node_id
    }

    fn gravity_weight(&self) -> f32 {
        self.gravity.weight
    }
}

/// Everything standing between a visible choice and it being enabled.
pub fn enablement_failures(
    choice: &Choice,
    state: &PlayerState,
    character_id: Option<&str>,
) -> Vec<ConditionFailure> {
    let mut failures = choice
        .enabled_condition
        .as_ref()
        .map(|c| all_failures(c, state, character_id))
        .unwrap_or_default();

    if let Some(lock) = choice.pattern_lock {
        let actual = state.pattern(lock.pattern);
        if actual < lock.threshold {
            failures.push(ConditionFailure::PatternLock {
                pattern: lock.pattern,
                threshold: lock.threshold,
                actual,
            });
        }
    }
    failures
}

fn evaluate_choice<'a>(
    choice: &'a Choice,
    state: &PlayerState,
    character_id: Option<&str>,
) -> EvaluatedChoice<'a> {
    let visible = evaluate_optional(choice.visible_condition.as_ref(), state, character_id);

    let blocker = if visible {
        choice
            .enabled_condition
            .as_ref()
            .and_then(|c| first_failure(c, state, character_id))
            .or_else(|| {
                choice.pattern_lock.and_then(|lock| {
                    let actual = state.pattern(lock.pattern);
                    (actual < lock.threshold).then_some(ConditionFailure::PatternLock {
                        pattern: lock.pattern,
                        threshold: lock.threshold,
                        actual,
                    })
                })
            })
    } else {
        None
    };

    EvaluatedChoice {
        choice,
        visible,
        enabled: visible && blocker.is_none(),
        locked_reason: blocker.map(|f| f.describe()),
        gravity: Gravity::neutral(),
        mercy_unlocked: false,
    }
}

/// Evaluate every choice on a node.
///
/// If the node has choices but none are visible, all of them are returned
/// visible and enabled: a dead end is worse than over-exposed content.
pub fn evaluate_choices<'a>(
    node: &'a DialogueNode,
    state: &PlayerState,
    character_id: Option<&str>,
) -> Vec<EvaluatedChoice<'a>> {
    let mut evaluated: Vec<_> = node
        .choices
        .iter()
        .map(|choice| evaluate_choice(choice, state, character_id))
        .collect();

    if !evaluated.is_empty() && evaluated.iter().all(|c| !c.visible) {
        warn!(
            target: "content_qa",
            node_id = %node.node_id,
            choice_count = evaluated.len(),
            "no visible choices; exposing every choice to avoid a dead end"
        );
        for choice in &mut evaluated {
            choice.visible = true;
            choice.enabled = true;
            choice.locked_reason = None;
        }
    }

    evaluated
}

/// When every visible choice is locked, enable the easiest one to satisfy.
///
/// Returns the index of the unlocked choice. Ties are broken at random.
pub fn mercy_unlock(
    choices: &mut [EvaluatedChoice<'_>],
    state: &PlayerState,
    character_id: Option<&str>,
) -> Option<usize> {
    mercy_unlock_with_rng(choices, state, character_id, &mut rand::thread_rng())
}

pub fn mercy_unlock_with_rng<R: Rng + ?Sized>(
    choices: &mut [EvaluatedChoice<'_>],
    state: &PlayerState,
    character_id: Option<&str>,
    rng: &mut R,
) -> Option<usize> {
    let visible: Vec<usize> = (0..choices.len()).filter(|&i| choices[i].visible).collect();
    if visible.is_empty() || visible.iter().any(|&i| choices[i].enabled) {
        return None;
    }

    let scored: Vec<(usize, u32)> = visible
        .into_iter()
        .map(|i| {
            let deficit = enablement_failures(choices[i].choice, state, character_id)
                .iter()
                .map(ConditionFailure::deficit)
                .fold(0u32, u32::saturating_add);
            (i, deficit)
        })
        .collect();

    let min = scored.iter().map(|(_, d)| *d).min()?;
    let easiest: Vec<usize> = scored
        .iter()
        .filter(|(_, d)| *d == min)
        .map(|(i, _)| *i)
        .collect();
    let index = *easiest.choose(rng)?;

    let unlocked = &mut choices[index];
    unlocked.enabled = true;
    unlocked.locked_reason = None;
    unlocked.mercy_unlocked = true;
    info!(choice = unlocked.key(), deficit = min, "mercy unlock");

    Some(index)
}
