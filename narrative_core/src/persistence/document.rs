//! The versioned save document and its migrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use story_rules::{
    CharacterId, CharacterState, ConversationRecord, NervousSystemState, PatternScores,
    PlayerState, RelationshipStatus, SessionInfo, SAVE_VERSION,
};

use super::PersistError;

/// One character as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDocument {
    pub character_id: CharacterId,
    pub trust: i32,
    pub relationship_status: RelationshipStatus,
    pub knowledge_flags: Vec<String>,
    pub conversation_history: Vec<ConversationRecord>,
    pub nervous_system_state: NervousSystemState,
}

/// The full persisted form of a [`PlayerState`].
///
/// Sets are written as sorted arrays so identical states produce identical text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub player_id: String,
    pub save_version: u32,
    pub characters: Vec<CharacterDocument>,
    pub global_flags: Vec<String>,
    pub patterns: PatternScores,
    pub mysteries: BTreeMap<String, String>,
    pub session_start_time: DateTime<Utc>,
    pub session_boundaries_crossed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn sorted<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut items: Vec<String> = items.into_iter().cloned().collect();
    items.sort();
    items
}

impl SaveDocument {
    pub fn from_state(state: &PlayerState) -> Self {
        let characters = state
            .character_ids()
            .into_iter()
            .filter_map(|id| state.character(id.as_str()))
            .map(|c| CharacterDocument {
                character_id: c.character_id.clone(),
                trust: c.trust,
                relationship_status: c.relationship_status,
                knowledge_flags: sorted(&c.knowledge_flags),
                conversation_history: c.conversation_history.clone(),
                nervous_system_state: c.nervous_system_state,
            })
            .collect();

        Self {
            player_id: state.player_id.clone(),
            save_version: SAVE_VERSION,
            characters,
            global_flags: sorted(state.global_flags.iter()),
            patterns: *state.patterns,
            mysteries: state
                .mysteries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            session_start_time: state.session.start_time,
            session_boundaries_crossed: state.session.boundaries_crossed,
            saved_at: None,
        }
    }

    /// Reject documents that could not be loaded back.
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.player_id.trim().is_empty() {
            return Err(PersistError::Invalid("empty playerId".to_string()));
        }

        let mut seen = HashSet::with_capacity(self.characters.len());
        for doc in &self.characters {
            if doc.character_id.as_str().is_empty() {
                return Err(PersistError::Invalid("empty characterId".to_string()));
            }
            if !seen.insert(&doc.character_id) {
                return Err(PersistError::Invalid(format!(
                    "duplicate character '{}'",
                    doc.character_id
                )));
            }
        }
        Ok(())
    }

    /// Validate and rebuild the in-memory state.
    pub fn into_state(self) -> Result<PlayerState, PersistError> {
        self.validate()?;

        let characters: HashMap<_, _> = self
            .characters
            .into_iter()
            .map(|doc| {
                let character = CharacterState {
                    character_id: doc.character_id.clone(),
                    trust: doc.trust,
                    relationship_status: doc.relationship_status,
                    knowledge_flags: doc.knowledge_flags.into_iter().collect(),
                    conversation_history: doc.conversation_history,
                    nervous_system_state: doc.nervous_system_state,
                };
                (doc.character_id, Arc::new(character))
            })
            .collect();

        let mut state = PlayerState::new(self.player_id).with_session(SessionInfo {
            start_time: self.session_start_time,
            boundaries_crossed: self.session_boundaries_crossed,
        });
        state.characters = Arc::new(characters);
        state.global_flags = Arc::new(self.global_flags.into_iter().collect::<HashSet<_>>());
        state.patterns = Arc::new(self.patterns);
        state.mysteries = Arc::new(self.mysteries.into_iter().collect());
        Ok(state)
    }
}

/// Bring a raw document up to [`SAVE_VERSION`].
///
/// A missing `saveVersion` is read as version 1.
pub fn migrate(mut value: Value) -> Result<Value, PersistError> {
    let mut version = match value.get("saveVersion") {
        None => 1,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| PersistError::Invalid("saveVersion is not a number".to_string()))?,
    };

    if version > SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: version,
            supported: SAVE_VERSION,
        });
    }

    while version < SAVE_VERSION {
        match version {
            1 => migrate_v1_to_v2(&mut value)?,
            other => {
                return Err(PersistError::UnsupportedVersion {
                    found: other,
                    supported: SAVE_VERSION,
                })
            }
        }
        version += 1;
    }

    let root = value
        .as_object_mut()
        .ok_or_else(|| PersistError::Invalid("document is not an object".to_string()))?;
    root.insert("saveVersion".to_string(), Value::from(SAVE_VERSION));
    Ok(value)
}

/// v1 had no nervous-system state and no session boundary counter.
fn migrate_v1_to_v2(value: &mut Value) -> Result<(), PersistError> {
    let root = value
        .as_object_mut()
        .ok_or_else(|| PersistError::Invalid("document is not an object".to_string()))?;

    root.entry("sessionBoundariesCrossed")
        .or_insert_with(|| Value::from(0));

    if let Some(characters) = root.get_mut("characters").and_then(Value::as_array_mut) {
        for character in characters.iter_mut().filter_map(Value::as_object_mut) {
            character
                .entry("nervousSystemState")
                .or_insert_with(|| Value::from(NervousSystemState::default().as_str()));
        }
    }
    Ok(())
}

/// Serialize a state to a save document string.
pub fn encode(state: &PlayerState) -> Result<String, PersistError> {
    let mut doc = SaveDocument::from_state(state);
    doc.validate()?;
    doc.saved_at = Some(Utc::now());
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Parse, migrate, and validate a save document string.
pub fn decode(raw: &str) -> Result<PlayerState, PersistError> {
    let value: Value = serde_json::from_str(raw)?;
    let value = migrate(value)?;
    let doc: SaveDocument = serde_json::from_value(value)?;
    doc.into_state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_rules::PatternType;

    fn test_state() -> PlayerState {
        PlayerState::new("p1")
            .with_character(
                CharacterState::new("maya")
                    .with_trust(3)
                    .with_knowledge("b_flag")
                    .with_knowledge("a_flag")
                    .with_nervous_system(NervousSystemState::Sympathetic),
            )
            .with_character(CharacterState::new("devon"))
            .with_global_flag("z")
            .with_global_flag("a")
            .with_pattern(PatternType::Exploring, 7)
            .with_mystery("letter_sender", "samuel")
    }

    #[test]
    fn test_document_shape() {
        let raw = encode(&test_state()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["playerId"], "p1");
        assert_eq!(value["saveVersion"], SAVE_VERSION);
        assert_eq!(value["globalFlags"], serde_json::json!(["a", "z"]));
        assert_eq!(value["patterns"]["exploring"], 7);
        assert_eq!(value["characters"][0]["characterId"], "devon");
        assert_eq!(
            value["characters"][1]["knowledgeFlags"],
            serde_json::json!(["a_flag", "b_flag"])
        );
        assert_eq!(value["characters"][1]["nervousSystemState"], "sympathetic");
        assert_eq!(value["mysteries"]["letter_sender"], "samuel");
        assert!(value["sessionStartTime"].is_string());
        assert_eq!(value["sessionBoundariesCrossed"], 0);
    }

    #[test]
    fn test_current_documents_skip_migration() {
        let state = test_state();
        let value: Value = serde_json::from_str(&encode(&state).unwrap()).unwrap();
        assert_eq!(value["saveVersion"], state.save_version());
        assert_eq!(migrate(value.clone()).unwrap(), value);
    }

    #[test]
    fn test_encode_decode() {
        let state = test_state();
        let restored = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_migrates_v1() {
        let v1 = r#"{
            "playerId": "old_player",
            "saveVersion": 1,
            "characters": [{
                "characterId": "maya",
                "trust": 4,
                "relationshipStatus": "acquaintance",
                "knowledgeFlags": ["met"],
                "conversationHistory": [{"nodeId": "intro"}]
            }],
            "globalFlags": [],
            "patterns": {"analytical": 0, "patience": 1, "exploring": 0, "helping": 2, "building": 0},
            "mysteries": {},
            "sessionStartTime": "2025-01-01T00:00:00Z"
        }"#;

        let state = decode(v1).unwrap();
        assert_eq!(state.save_version(), SAVE_VERSION);
        assert_eq!(state.session.boundaries_crossed, 0);
        let maya = state.character("maya").unwrap();
        assert_eq!(maya.nervous_system_state, NervousSystemState::VentralVagal);
        assert_eq!(maya.trust, 4);
    }

    #[test]
    fn test_missing_version_is_v1() {
        let value = serde_json::json!({"playerId": "p", "characters": [{"characterId": "maya"}]});
        let migrated = migrate(value).unwrap();
        assert_eq!(migrated["saveVersion"], SAVE_VERSION);
        assert_eq!(migrated["characters"][0]["nervousSystemState"], "ventral_vagal");
    }

    #[test]
    fn test_future_version_rejected() {
        let value = serde_json::json!({"saveVersion": SAVE_VERSION + 1});
        assert!(matches!(
            migrate(value),
            Err(PersistError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(decode("not json").is_err());
        assert!(decode("[1, 2, 3]").is_err());
        assert!(decode(r#"{"saveVersion": "two"}"#).is_err());

        let mut doc = SaveDocument::from_state(&test_state());
        doc.characters.push(doc.characters[0].clone());
        assert!(matches!(doc.into_state(), Err(PersistError::Invalid(_))));

        let mut doc = SaveDocument::from_state(&test_state());
        doc.player_id = "  ".to_string();
        assert!(doc.into_state().is_err());
    }
}
