//! Permanent progression and key-value storage
//!
//! Features:
//! - `PermanentStats`: the small record that outlives any single run
//! - `KeyValueStore`: string key/value backend (memory, file, LocalStorage)
//! - Corrupt or missing data resets to defaults instead of failing

mod store;

pub use store::{KeyValueStore, MemoryStore};

#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;

#[cfg(target_arch = "wasm32")]
pub use store::LocalStore;

use serde::{Deserialize, Serialize};

/// Storage failures
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Progression carried across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermanentStats {
    /// Levels gained across every finished session
    pub total_levels_gained: u32,
    /// Whether the boss has ever been beaten (unlocks hard mode)
    pub has_won: bool,
    /// Best score of any session
    pub highest_score: u64,
}

impl PermanentStats {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "permanentStats";

    /// Record a score; returns true if it beat the previous best
    pub fn update_highest_score(&mut self, score: u64) -> bool {
        if score > self.highest_score {
            self.highest_score = score;
            true
        } else {
            false
        }
    }

    pub fn add_levels(&mut self, levels: u32) {
        self.total_levels_gained = self.total_levels_gained.saturating_add(levels);
    }

    pub fn mark_won(&mut self) {
        self.has_won = true;
    }

    /// Hard mode unlocks after the first win
    pub fn hard_mode_unlocked(&self) -> bool {
        self.has_won
    }

    /// Load from a store, falling back to zeroed stats on missing or bad data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Self>(&json) {
                Ok(stats) => {
                    log::info!(
                        "Loaded permanent stats: {} levels, won: {}, best: {}",
                        stats.total_levels_gained,
                        stats.has_won,
                        stats.highest_score
                    );
                    stats
                }
                Err(e) => {
                    log::warn!("Corrupt permanent stats ({e}), starting fresh");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("No saved permanent stats found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read permanent stats ({e}), starting fresh");
                Self::default()
            }
        }
    }

    /// Save to a store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!(
            "Saved permanent stats: {} levels, won: {}, best: {}",
            self.total_levels_gained,
            self.has_won,
            self.highest_score
        );
        Ok(())
    }
}
