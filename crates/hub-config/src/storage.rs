//! Durable local storage for the persisted workspace selection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Key under which the selected workspace id is persisted.
pub const WORKSPACE_KEY: &str = "workspace_id";

/// Key/value storage that survives restarts.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
    fn remove(&self, key: &str) -> Result<(), ConfigError>;
}

/// On-disk layout of the local state file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LocalState {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl LocalState {
    /// Load state from a path. A missing file is an empty state.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Read(e)),
        }
    }

    /// Save state to a path, creating parent directories as needed.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self)?)?;
        Ok(())
    }
}

/// JSON-file backed storage (default `~/.hustle-hub/state.json`).
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles from this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage at the default path.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Get default state path (~/.hustle-hub/state.json)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".hustle-hub")
            .join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, f: impl FnOnce(&mut LocalState)) -> Result<(), ConfigError> {
        let _guard = self.lock.lock().map_err(|_| ConfigError::Poisoned)?;
        let mut state = LocalState::load_from(&self.path)?;
        f(&mut state);
        state.save_to(&self.path)
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let _guard = self.lock.lock().map_err(|_| ConfigError::Poisoned)?;
        Ok(LocalState::load_from(&self.path)?.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(|state| {
            state.values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        self.update(|state| {
            state.values.remove(key);
        })
    }
}

/// Process-local storage, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let values = self.values.lock().map_err(|_| ConfigError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = self.values.lock().map_err(|_| ConfigError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        let mut values = self.values.lock().map_err(|_| ConfigError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}
