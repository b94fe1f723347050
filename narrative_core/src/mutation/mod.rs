//! State Mutator - applies authored consequences to produce new snapshots.
//!
//! The input snapshot is never modified. Collections a change does not touch
//! are shared with the input by `Arc`; touched ones are rebuilt.

use std::sync::Arc;
use story_rules::{CharacterId, ConversationRecord, PlayerState, StateChange, TrustConfig};
use tracing::warn;

/// Applies [`StateChange`]s, enforcing the configured trust bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMutator {
    trust: TrustConfig,
}

impl StateMutator {
    pub fn new(trust: TrustConfig) -> Self {
        Self { trust }
    }

    /// Default bounds: trust clamped to 0..=10.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Produce the snapshot that results from applying `change` to `state`.
    pub fn apply(&self, state: &PlayerState, change: &StateChange) -> PlayerState {
        let mut next = state.clone();

        if change.touches_character() {
            self.apply_character_change(&mut next, change);
        }

        if change.touches_global_flags() {
            let flags = Arc::make_mut(&mut next.global_flags);
            flags.extend(change.add_global_flags.iter().cloned());
            for flag in &change.remove_global_flags {
                flags.remove(flag);
            }
        }

        if change.touches_patterns() {
            let patterns = Arc::make_mut(&mut next.patterns);
            for (pattern, delta) in &change.pattern_changes {
                patterns.add(*pattern, *delta);
            }
        }

        if change.touches_mysteries() {
            Arc::make_mut(&mut next.mysteries).extend(
                change
                    .set_mysteries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }

        next
    }

    fn apply_character_change(&self, next: &mut PlayerState, change: &StateChange) {
        let Some(id) = change.character_id.as_ref() else {
            warn!("character-scoped change without a character id; skipping character part");
            return;
        };
        if !next.has_character(id.as_str()) {
            warn!(
                character_id = %id,
                "change targets an unknown character; skipping character part"
            );
            return;
        }

        let characters = Arc::make_mut(&mut next.characters);
        let Some(entry) = characters.get_mut(id) else {
            return;
        };
        let character = Arc::make_mut(entry);

        if let Some(delta) = change.trust_change {
            character.trust = self.trust.apply(character.trust.saturating_add(delta));
        }
        if let Some(status) = change.set_relationship_status {
            character.relationship_status = status;
        }
        character
            .knowledge_flags
            .extend(change.add_knowledge_flags.iter().cloned());
        for flag in &change.remove_knowledge_flags {
            character.knowledge_flags.remove(flag);
        }
        if let Some(nervous) = change.set_nervous_system_state {
            character.nervous_system_state = nervous;
        }
    }
}

/// Apply a change with the default trust bounds.
pub fn apply_state_change(state: &PlayerState, change: &StateChange) -> PlayerState {
    StateMutator::with_defaults().apply(state, change)
}

/// Append to a character's conversation history. Unknown characters are skipped.
pub fn record_conversation(
    state: &PlayerState,
    character_id: &CharacterId,
    record: ConversationRecord,
) -> PlayerState {
    let mut next = state.clone();
    if !next.has_character(character_id.as_str()) {
        warn!(character_id = %character_id, "cannot record conversation for unknown character");
        return next;
    }
    if let Some(entry) = Arc::make_mut(&mut next.characters).get_mut(character_id) {
        Arc::make_mut(entry).conversation_history.push(record);
    }
    next
}

/// Count one more pause/resume boundary.
pub fn cross_session_boundary(state: &PlayerState) -> PlayerState {
    let mut next = state.clone();
    next.session.boundaries_crossed = next.session.boundaries_crossed.saturating_add(1);
    next
}
