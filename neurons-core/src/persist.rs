//! Game persistence.
//!
//! The session talks to a [`Persistence`] service it is handed at
//! construction. [`SaveManager`] writes one pretty-printed JSON file per
//! save; the testing module provides an in-memory store.

use crate::world::GameState;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Current save file version.
pub const SAVE_VERSION: u32 = 1;

pub const DEFAULT_SAVE_DIR: &str = "saves";
pub const DEFAULT_SAVE_PREFIX: &str = "save";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Identifies one stored save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveHandle(pub String);

impl fmt::Display for SaveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable storage for game states.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Store a full snapshot of the state.
    async fn save(&self, state: &GameState) -> Result<SaveHandle, PersistError>;

    /// Load a specific save, or the newest one for `None`.
    ///
    /// `Ok(None)` means there is no usable save: nothing stored, a missing
    /// file, malformed JSON or an unsupported version.
    async fn load(&self, handle: Option<&SaveHandle>) -> Result<Option<GameState>, PersistError>;
}

// ============================================================================
// Save format
// ============================================================================

/// A saved game with the state needed to resume play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// RFC 3339 UTC timestamp.
    pub saved_at: String,

    pub metadata: SaveMetadata,

    pub state: GameState,
}

/// Summary shown when listing saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub character_name: String,
    pub level: u32,
    pub location: String,
    pub scene_type: String,
}

impl SavedGame {
    pub fn new(state: GameState, saved_at: DateTime<Utc>) -> Self {
        let metadata = SaveMetadata {
            character_name: state.player.name.clone(),
            level: state.player.level.level(),
            location: state.world.location.clone(),
            scene_type: state.scene_type.clone(),
        };
        Self {
            version: SAVE_VERSION,
            saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            metadata,
            state,
        }
    }

    /// Parse a save and check its version.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        #[derive(Deserialize)]
        struct Version {
            version: u32,
        }

        let Version { version } = serde_json::from_str(content)?;
        if version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: version,
            });
        }
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A listed save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub handle: SaveHandle,
    pub path: PathBuf,
    pub saved_at: String,
    pub metadata: SaveMetadata,
}

// ============================================================================
// JSON files
// ============================================================================

/// Saves games as `<prefix>_<YYYY-MM-DD_HH-MM-SS.mmm>.json` files.
#[derive(Debug, Clone)]
pub struct SaveManager {
    dir: PathBuf,
    prefix: String,
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl SaveManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_SAVE_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, at: DateTime<Utc>) -> String {
        format!("{}_{}.json", self.prefix, at.format("%Y-%m-%d_%H-%M-%S%.3f"))
    }

    fn is_save_file(&self, name: &str) -> bool {
        name.starts_with(&format!("{}_", self.prefix)) && name.ends_with(".json")
    }

    /// Save file names, newest first.
    ///
    /// Timestamps are fixed-width, so name order is time order.
    pub async fn save_files(&self) -> Result<Vec<String>, PersistError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if self.is_save_file(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Readable saves with their metadata, newest first.
    pub async fn list_saves(&self) -> Result<Vec<SaveInfo>, PersistError> {
        let mut saves = Vec::new();
        for name in self.save_files().await? {
            let path = self.dir.join(&name);
            match read_save(&path).await {
                Ok(saved) => saves.push(SaveInfo {
                    handle: SaveHandle(name),
                    path,
                    saved_at: saved.saved_at,
                    metadata: saved.metadata,
                }),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable save"),
            }
        }
        Ok(saves)
    }

    pub async fn latest(&self) -> Result<Option<SaveHandle>, PersistError> {
        Ok(self.save_files().await?.into_iter().next().map(SaveHandle))
    }
}

async fn read_save(path: &Path) -> Result<SavedGame, PersistError> {
    let content = fs::read_to_string(path).await?;
    SavedGame::from_json(&content)
}

#[async_trait]
impl Persistence for SaveManager {
    async fn save(&self, state: &GameState) -> Result<SaveHandle, PersistError> {
        fs::create_dir_all(&self.dir).await?;

        // Never overwrite: step forward a millisecond until the name is free
        let mut at = Utc::now();
        let mut name = self.file_name(at);
        while fs::try_exists(self.dir.join(&name)).await? {
            at += Duration::milliseconds(1);
            name = self.file_name(at);
        }

        let saved = SavedGame::new(state.clone(), at);
        let path = self.dir.join(&name);
        fs::write(&path, saved.to_json()?).await?;
        tracing::info!(path = %path.display(), "game saved");
        Ok(SaveHandle(name))
    }

    async fn load(&self, handle: Option<&SaveHandle>) -> Result<Option<GameState>, PersistError> {
        let handle = match handle {
            Some(handle) => handle.clone(),
            None => match self.latest().await? {
                Some(handle) => handle,
                None => return Ok(None),
            },
        };

        let path = self.dir.join(&handle.0);
        match read_save(&path).await {
            Ok(saved) => {
                tracing::info!(path = %path.display(), "game loaded");
                Ok(Some(saved.state))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "no usable save");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let manager = SaveManager::new("saves");
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(manager.file_name(at), "save_2024-03-09_07-05-02.000.json");
        assert_eq!(
            manager.with_prefix("slot").file_name(at),
            "slot_2024-03-09_07-05-02.000.json"
        );
    }

    #[test]
    fn test_save_file_filter() {
        let manager = SaveManager::new("saves");
        assert!(manager.is_save_file("save_2024-03-09_07-05-02.000.json"));
        assert!(!manager.is_save_file("save_2024.txt"));
        assert!(!manager.is_save_file("notes.json"));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let json = r#"{"version": 99, "saved_at": "", "metadata": {}, "state": {}}"#;
        assert!(matches!(
            SavedGame::from_json(json),
            Err(PersistError::VersionMismatch { expected: 1, found: 99 })
        ));
        assert!(matches!(
            SavedGame::from_json("not json"),
            Err(PersistError::Json(_))
        ));
    }
}
