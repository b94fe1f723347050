//! Authored consequences - the input to the state mutator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::characters::{CharacterId, NervousSystemState, RelationshipStatus};
use crate::patterns::PatternType;

/// A consequence to apply to a player state.
///
/// Character-scoped parts (trust, relationship, knowledge, nervous system)
/// apply to `character_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,

    /// Signed trust delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_change: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_relationship_status: Option<RelationshipStatus>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_knowledge_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_global_flags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_global_flags: Vec<String>,

    /// Signed deltas per pattern.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_changes: BTreeMap<PatternType, i32>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set_mysteries: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_nervous_system_state: Option<NervousSystemState>,
}

impl StateChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change scoped to one character.
    pub fn for_character(id: impl Into<CharacterId>) -> Self {
        Self {
            character_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn trust(mut self, delta: i32) -> Self {
        self.trust_change = Some(delta);
        self
    }

    pub fn relationship(mut self, status: RelationshipStatus) -> Self {
        self.set_relationship_status = Some(status);
        self
    }

    pub fn learn(mut self, flag: impl Into<String>) -> Self {
        self.add_knowledge_flags.push(flag.into());
        self
    }

    pub fn forget(mut self, flag: impl Into<String>) -> Self {
        self.remove_knowledge_flags.push(flag.into());
        self
    }

    pub fn set_flag(mut self, flag: impl Into<String>) -> Self {
        self.add_global_flags.push(flag.into());
        self
    }

    pub fn clear_flag(mut self, flag: impl Into<String>) -> Self {
        self.remove_global_flags.push(flag.into());
        self
    }

    /// Accumulates if the pattern is already listed.
    pub fn pattern(mut self, pattern: PatternType, delta: i32) -> Self {
        *self.pattern_changes.entry(pattern).or_default() += delta;
        self
    }

    pub fn mystery(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_mysteries.insert(key.into(), value.into());
        self
    }

    pub fn nervous_system(mut self, state: NervousSystemState) -> Self {
        self.set_nervous_system_state = Some(state);
        self
    }

    pub fn touches_character(&self) -> bool {
        self.trust_change.is_some()
            || self.set_relationship_status.is_some()
            || !self.add_knowledge_flags.is_empty()
            || !self.remove_knowledge_flags.is_empty()
            || self.set_nervous_system_state.is_some()
    }

    pub fn touches_global_flags(&self) -> bool {
        !self.add_global_flags.is_empty() || !self.remove_global_flags.is_empty()
    }

    pub fn touches_patterns(&self) -> bool {
        !self.pattern_changes.is_empty()
    }

    pub fn touches_mysteries(&self) -> bool {
        !self.set_mysteries.is_empty()
    }
}
