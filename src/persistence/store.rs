//! String key/value backends

use std::collections::BTreeMap;

use super::PersistError;

/// Minimal LocalStorage-shaped interface
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// In-process store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file holding every key (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    entries: BTreeMap<String, String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Open a store file; a missing or unreadable file starts empty
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt store {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    fn flush(&self) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        // tmp → target
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|source| PersistError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| PersistError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Browser LocalStorage, falling back to sessionStorage when writes fail
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn local() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    fn session() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let storage = Self::local()
            .ok_or_else(|| PersistError::Unavailable("localStorage".to_string()))?;
        storage
            .get_item(key)
            .map_err(|_| PersistError::Unavailable(format!("read {key}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        if let Some(storage) = Self::local() {
            if storage.set_item(key, value).is_ok() {
                return Ok(());
            }
        }
        log::warn!("localStorage write failed for {key}, trying sessionStorage");
        let storage = Self::session()
            .ok_or_else(|| PersistError::Unavailable("sessionStorage".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|_| PersistError::Unavailable(format!("write {key}")))
    }
}
