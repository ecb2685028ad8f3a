/// Player persistence — get/set of one snapshot per player key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

use crate::schema::player::PlayerSnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player store lock was poisoned")]
    LockPoisoned,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("player store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of player snapshots. The engine treats every call as
/// atomic and never assumes anything about the transport behind it.
pub trait PlayerStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, StoreError>;

    /// Persist `snapshot` and return what was stored.
    fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Keeps snapshots in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: RwLock<HashMap<String, PlayerSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(key: &str, snapshot: PlayerSnapshot) -> Self {
        Self {
            players: RwLock::new(HashMap::from([(key.to_string(), snapshot)])),
        }
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        let players = self.players.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(players.get(key).cloned())
    }

    fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, StoreError> {
        let mut players = self.players.write().map_err(|_| StoreError::LockPoisoned)?;
        players.insert(key.to_string(), snapshot.clone());
        Ok(snapshot.clone())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut players = self.players.write().map_err(|_| StoreError::LockPoisoned)?;
        players.remove(key);
        Ok(())
    }
}

/// Stores each player as `player_{key}.ron` inside a directory.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn player_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("player_{}.ron", safe))
    }
}

impl PlayerStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        let path = self.player_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let snapshot: PlayerSnapshot = ron::from_str(&contents)?;
        tracing::debug!("Loaded player '{}' from {}", key, path.display());
        Ok(Some(snapshot))
    }

    fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, StoreError> {
        let path = self.player_path(key);
        let temp_path = path.with_extension("ron.tmp");

        let text = ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&temp_path, text)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved player '{}' to {}", key, path.display());
        Ok(snapshot.clone())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.player_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted player '{}'", key);
        }
        Ok(())
    }
}
