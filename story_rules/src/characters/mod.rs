//! Character definitions and per-character relationship state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical identifier for a story character (e.g. `"maya"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    /// Create a character ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CharacterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for CharacterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How well the player and a character know each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Stranger,
    Acquaintance,
    Confidant,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Stranger => "stranger",
            RelationshipStatus::Acquaintance => "acquaintance",
            RelationshipStatus::Confidant => "confidant",
        }
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulated physiological state of a character, used only for narrative gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NervousSystemState {
    /// Safe and socially engaged.
    #[default]
    VentralVagal,
    /// Mobilized, anxious, fight-or-flight.
    Sympathetic,
    /// Shut down, withdrawn.
    DorsalVagal,
}

impl NervousSystemState {
    pub const ALL: [NervousSystemState; 3] = [
        NervousSystemState::VentralVagal,
        NervousSystemState::Sympathetic,
        NervousSystemState::DorsalVagal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NervousSystemState::VentralVagal => "ventral_vagal",
            NervousSystemState::Sympathetic => "sympathetic",
            NervousSystemState::DorsalVagal => "dorsal_vagal",
        }
    }
}

/// One entry in a character's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<String>,
}

impl ConversationRecord {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            choice_id: None,
        }
    }

    pub fn with_choice(mut self, choice_id: impl Into<String>) -> Self {
        self.choice_id = Some(choice_id.into());
        self
    }
}

/// Everything the player has built up with a single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterState {
    pub character_id: CharacterId,

    /// Conventionally 0-10. Gates content.
    pub trust: i32,

    pub relationship_status: RelationshipStatus,

    /// Character-scoped facts the player has learned.
    pub knowledge_flags: HashSet<String>,

    /// Append-only record of visited nodes.
    pub conversation_history: Vec<ConversationRecord>,

    pub nervous_system_state: NervousSystemState,
}

impl CharacterState {
    /// Create a fresh character state: zero trust, stranger, no knowledge.
    pub fn new(character_id: impl Into<CharacterId>) -> Self {
        Self {
            character_id: character_id.into(),
            trust: 0,
            relationship_status: RelationshipStatus::default(),
            knowledge_flags: HashSet::new(),
            conversation_history: Vec::new(),
            nervous_system_state: NervousSystemState::default(),
        }
    }

    pub fn with_trust(mut self, trust: i32) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_relationship(mut self, status: RelationshipStatus) -> Self {
        self.relationship_status = status;
        self
    }

    pub fn with_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.knowledge_flags.insert(flag.into());
        self
    }

    pub fn with_nervous_system(mut self, state: NervousSystemState) -> Self {
        self.nervous_system_state = state;
        self
    }

    pub fn knows(&self, flag: &str) -> bool {
        self.knowledge_flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character_state() {
        let maya = CharacterState::new("maya");
        assert_eq!(maya.character_id.as_str(), "maya");
        assert_eq!(maya.trust, 0);
        assert_eq!(maya.relationship_status, RelationshipStatus::Stranger);
        assert!(maya.knowledge_flags.is_empty());
        assert_eq!(maya.nervous_system_state, NervousSystemState::VentralVagal);
    }

    #[test]
    fn test_knowledge_is_idempotent() {
        let maya = CharacterState::new("maya")
            .with_knowledge("knows_robotics")
            .with_knowledge("knows_robotics");
        assert_eq!(maya.knowledge_flags.len(), 1);
        assert!(maya.knows("knows_robotics"));
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&RelationshipStatus::Confidant).unwrap();
        assert_eq!(json, "\"confidant\"");

        let parsed: NervousSystemState = serde_json::from_str("\"sympathetic\"").unwrap();
        assert_eq!(parsed, NervousSystemState::Sympathetic);
    }
}
