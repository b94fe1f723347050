//! Player save data - the root of all story state.
//!
//! A `PlayerState` is an immutable snapshot. Its collections sit behind `Arc`
//! so a new snapshot can share every collection it did not touch with the
//! snapshot it was derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::characters::{CharacterId, CharacterState};
use crate::patterns::{PatternScores, PatternType};

/// Current save-format version written by this build.
pub const SAVE_VERSION: u32 = 2;

/// Prefix for global flags that mark an unlocked combo.
pub const COMBO_FLAG_PREFIX: &str = "combo:";

/// Character ID -> that character's state.
pub type CharacterMap = HashMap<CharacterId, Arc<CharacterState>>;

/// Session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub start_time: DateTime<Utc>,
    /// How many session boundaries (pause/resume points) the player has crossed.
    pub boundaries_crossed: u32,
}

impl SessionInfo {
    pub fn starting_now() -> Self {
        Self {
            start_time: Utc::now(),
            boundaries_crossed: 0,
        }
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::starting_now()
    }
}

/// The player's complete save data at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub player_id: String,

    /// Always [`SAVE_VERSION`]: older saves are migrated on load.
    save_version: u32,

    /// Per-character relationship state.
    pub characters: Arc<CharacterMap>,

    /// Session-wide boolean facts.
    pub global_flags: Arc<HashSet<String>>,

    /// The five pattern accumulators.
    pub patterns: Arc<PatternScores>,

    /// Mystery key -> resolution value.
    pub mysteries: Arc<HashMap<String, String>>,

    pub session: SessionInfo,
}

impl PlayerState {
    /// Create an empty state for the given player.
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            save_version: SAVE_VERSION,
            characters: Arc::new(HashMap::new()),
            global_flags: Arc::new(HashSet::new()),
            patterns: Arc::new(PatternScores::default()),
            mysteries: Arc::new(HashMap::new()),
            session: SessionInfo::starting_now(),
        }
    }

    /// Save-format version this snapshot conforms to.
    pub fn save_version(&self) -> u32 {
        self.save_version
    }

    /// Create a state for a brand new game with a fresh player ID and the given cast.
    pub fn new_game<I, C>(roster: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CharacterId>,
    {
        roster.into_iter().fold(
            Self::new(format!("player_{}", Uuid::new_v4().simple())),
            |state, id| state.with_character(CharacterState::new(id)),
        )
    }

    /// Add or replace a character. Builder use only; live snapshots are
    /// replaced through the state mutator.
    pub fn with_character(mut self, character: CharacterState) -> Self {
        Arc::make_mut(&mut self.characters)
            .insert(character.character_id.clone(), Arc::new(character));
        self
    }

    pub fn with_global_flag(mut self, flag: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.global_flags).insert(flag.into());
        self
    }

    pub fn with_pattern(mut self, pattern: PatternType, value: i32) -> Self {
        *Arc::make_mut(&mut self.patterns).get_mut(pattern) = value;
        self
    }

    pub fn with_mystery(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.mysteries).insert(key.into(), value.into());
        self
    }

    pub fn with_session(mut self, session: SessionInfo) -> Self {
        self.session = session;
        self
    }

    /// Get character state by ID.
    pub fn character(&self, id: &str) -> Option<&CharacterState> {
        self.characters.get(id).map(|c| c.as_ref())
    }

    pub fn has_character(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    pub fn has_global_flag(&self, flag: &str) -> bool {
        self.global_flags.contains(flag)
    }

    pub fn pattern(&self, pattern: PatternType) -> i32 {
        self.patterns.get(pattern)
    }

    pub fn mystery(&self, key: &str) -> Option<&str> {
        self.mysteries.get(key).map(String::as_str)
    }

    /// Whether a combo has been unlocked (held as a `combo:<id>` global flag).
    pub fn has_combo(&self, combo_id: &str) -> bool {
        self.global_flags
            .contains(&format!("{}{}", COMBO_FLAG_PREFIX, combo_id))
    }

    /// Character IDs in sorted order.
    pub fn character_ids(&self) -> Vec<&CharacterId> {
        let mut ids: Vec<_> = self.characters.keys().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_roster() {
        let state = PlayerState::new_game(["maya", "devon", "samuel"]);
        assert!(state.player_id.starts_with("player_"));
        assert_eq!(state.save_version(), SAVE_VERSION);
        assert_eq!(state.character_ids().len(), 3);
        assert_eq!(state.character("devon").map(|c| c.trust), Some(0));
        assert!(state.character("nobody").is_none());
    }

    #[test]
    fn test_global_flags_idempotent() {
        let state = PlayerState::new("p1")
            .with_global_flag("met_maya")
            .with_global_flag("met_maya");
        assert_eq!(state.global_flags.len(), 1);
        assert!(state.has_global_flag("met_maya"));
    }

    #[test]
    fn test_combo_flags() {
        let state = PlayerState::new("p1").with_global_flag("combo:deep_trust");
        assert!(state.has_combo("deep_trust"));
        assert!(!state.has_combo("other"));
    }

    #[test]
    fn test_clone_shares_collections() {
        let state = PlayerState::new_game(["maya"]).with_mystery("letter_sender", "unknown");
        let copy = state.clone();
        assert!(Arc::ptr_eq(&state.characters, &copy.characters));
        assert!(Arc::ptr_eq(&state.mysteries, &copy.mysteries));
        assert_eq!(state, copy);
    }
}
