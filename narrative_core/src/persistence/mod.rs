//! Persistence - save/load with a rolling backup, plus blob export/import.
//!
//! The plain operations (`save`, `load`, `export_blob`, `import_blob`) never
//! fail loudly: problems are logged and reported as `false`/`None`, which
//! callers treat as "no save available". The `try_*` twins expose the cause.

mod document;
mod storage;

pub use document::*;
pub use storage::*;

use story_rules::{PersistenceConfig, PlayerState};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported save version {found} (this build supports up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid save document: {0}")]
    Invalid(String),

    #[error("no save available")]
    NoSave,
}

/// Reads and writes player state through a [`StorageBackend`].
#[derive(Debug)]
pub struct SaveManager<S: StorageBackend> {
    storage: S,
    config: PersistenceConfig,
}

impl<S: StorageBackend> SaveManager<S> {
    pub fn new(storage: S, config: PersistenceConfig) -> Self {
        Self { storage, config }
    }

    pub fn with_defaults(storage: S) -> Self {
        Self::new(storage, PersistenceConfig::default())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Write `state`, keeping the previous document as the backup.
    pub fn try_save(&mut self, state: &PlayerState) -> Result<(), PersistError> {
        let encoded = encode(state)?;
        if let Some(previous) = self.storage.read(&self.config.save_key)? {
            self.storage.write(&self.config.backup_key, &previous)?;
        }
        self.storage.write(&self.config.save_key, &encoded)?;
        Ok(())
    }

    pub fn save(&mut self, state: &PlayerState) -> bool {
        match self.try_save(state) {
            Ok(()) => true,
            Err(e) => {
                warn!(player_id = %state.player_id, error = %e, "save failed");
                false
            }
        }
    }

    /// Read the primary save. `Ok(None)` when nothing has been saved.
    pub fn try_load(&self) -> Result<Option<PlayerState>, PersistError> {
        self.storage
            .read(&self.config.save_key)?
            .map(|raw| decode(&raw))
            .transpose()
    }

    /// Load the primary save, falling back to the backup if it is unreadable.
    pub fn load(&mut self) -> Option<PlayerState> {
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "primary save unreadable; trying backup");
                self.restore_backup()
            }
        }
    }

    /// Promote a valid backup to the primary slot.
    pub fn restore_backup(&mut self) -> Option<PlayerState> {
        let raw = match self.storage.read(&self.config.backup_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "backup unreadable");
                return None;
            }
        };

        match decode(&raw) {
            Ok(state) => {
                if let Err(e) = self.storage.write(&self.config.save_key, &raw) {
                    warn!(error = %e, "could not write restored backup to the primary slot");
                }
                info!(player_id = %state.player_id, "restored save from backup");
                Some(state)
            }
            Err(e) => {
                warn!(error = %e, "backup is corrupt too");
                None
            }
        }
    }

    pub fn has_save(&self) -> bool {
        matches!(self.storage.read(&self.config.save_key), Ok(Some(_)))
    }

    /// Remove both the save and its backup.
    pub fn delete_save(&mut self) -> bool {
        let primary = self.storage.remove(&self.config.save_key);
        let backup = self.storage.remove(&self.config.backup_key);
        match primary.and(backup) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to delete save");
                false
            }
        }
    }

    /// The current save as a portable string, validated before it is handed out.
    pub fn try_export_blob(&self) -> Result<String, PersistError> {
        let raw = self
            .storage
            .read(&self.config.save_key)?
            .ok_or(PersistError::NoSave)?;
        decode(&raw)?;
        Ok(raw)
    }

    pub fn export_blob(&self) -> Option<String> {
        self.try_export_blob()
            .map_err(|e| warn!(error = %e, "export failed"))
            .ok()
    }

    /// Validate a blob completely, then save it. Nothing is written on failure.
    pub fn try_import_blob(&mut self, blob: &str) -> Result<PlayerState, PersistError> {
        let state = decode(blob)?;
        self.try_save(&state)?;
        Ok(state)
    }

    pub fn import_blob(&mut self, blob: &str) -> bool {
        match self.try_import_blob(blob) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "import rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use story_rules::{CharacterId, CharacterState, PatternType};

    fn test_state(trust: i32) -> PlayerState {
        PlayerState::new("p1")
            .with_character(CharacterState::new("maya").with_trust(trust))
            .with_global_flag("met_maya")
            .with_pattern(PatternType::Helping, 2)
    }

    fn manager() -> SaveManager<MemoryStorage> {
        SaveManager::with_defaults(MemoryStorage::new())
    }

    #[test]
    fn test_save_and_load() {
        let mut saves = manager();
        assert!(saves.load().is_none());
        assert!(!saves.has_save());

        let state = test_state(3);
        assert!(saves.save(&state));
        assert!(saves.has_save());
        assert_eq!(saves.load(), Some(state));
    }

    #[test]
    fn test_previous_save_becomes_backup() {
        let mut saves = manager();
        saves.save(&test_state(1));
        saves.save(&test_state(2));

        let backup = saves
            .storage()
            .read(&PersistenceConfig::default().backup_key)
            .unwrap()
            .unwrap();
        assert_eq!(decode(&backup).unwrap().character("maya").unwrap().trust, 1);
    }

    #[test]
    fn test_corrupt_primary_restores_backup() {
        let config = PersistenceConfig::default();
        let mut saves = manager();
        saves.save(&test_state(1));
        saves.save(&test_state(2));

        let mut storage = saves.into_storage();
        storage.write(&config.save_key, "{ corrupted").unwrap();
        let mut saves = SaveManager::with_defaults(storage);

        assert!(saves.try_load().is_err());
        let restored = saves.load().unwrap();
        assert_eq!(restored.character("maya").unwrap().trust, 1);
        assert!(saves.try_load().unwrap().is_some());
    }

    #[test]
    fn test_corrupt_everything_is_absent() {
        let config = PersistenceConfig::default();
        let mut storage = MemoryStorage::new();
        storage.write(&config.save_key, "garbage").unwrap();
        storage.write(&config.backup_key, "more garbage").unwrap();

        let mut saves = SaveManager::with_defaults(storage);
        assert!(saves.load().is_none());
    }

    #[test]
    fn test_export_import() {
        let mut source = manager();
        assert!(source.export_blob().is_none());

        let state = test_state(6);
        source.save(&state);
        let blob = source.export_blob().unwrap();

        let mut target = manager();
        assert!(target.import_blob(&blob));
        assert_eq!(target.load(), Some(state));
    }

    #[test]
    fn test_import_rejects_without_side_effects() {
        let mut saves = manager();
        saves.save(&test_state(4));
        let before = saves.export_blob().unwrap();

        assert!(!saves.import_blob("{\"playerId\": \"x\"}"));
        assert!(!saves.import_blob("not even json"));
        assert!(matches!(
            saves.try_import_blob(r#"{"saveVersion": 99}"#),
            Err(PersistError::UnsupportedVersion { found: 99, .. })
        ));

        assert_eq!(saves.export_blob().unwrap(), before);
    }

    #[test]
    fn test_unloadable_state_is_not_saved() {
        let mut saves = manager();
        let good = test_state(5);
        assert!(saves.save(&good));

        assert!(!saves.save(&PlayerState::new("   ")));
        assert!(matches!(
            saves.try_save(&PlayerState::new("")),
            Err(PersistError::Invalid(_))
        ));

        let mut clash = test_state(1);
        Arc::make_mut(&mut clash.characters)
            .insert(CharacterId::new("devon"), Arc::new(CharacterState::new("maya")));
        assert!(!saves.save(&clash));

        assert_eq!(saves.load(), Some(good));
        let backup = saves
            .storage()
            .read(&PersistenceConfig::default().backup_key)
            .unwrap();
        assert!(backup.is_none());
    }

    #[test]
    fn test_delete_save() {
        let mut saves = manager();
        saves.save(&test_state(1));
        saves.save(&test_state(2));
        assert!(saves.delete_save());
        assert!(!saves.has_save());
        assert!(saves.load().is_none());
    }
}
