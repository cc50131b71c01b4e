//! Audio preferences
//!
//! Persisted separately from progression, one key per flag, stored as the
//! strings `"true"` / `"false"`.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, PersistError};

/// Player preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Music muted
    pub mute_music: bool,
    /// Sound effects muted
    pub mute_sound_effects: bool,
}

impl Settings {
    /// Storage keys
    const MUSIC_KEY: &'static str = "muteMusic";
    const SOUND_KEY: &'static str = "muteSoundEffects";

    /// Load from a store; absent or unreadable flags default to unmuted
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let settings = Self {
            mute_music: read_flag(store, Self::MUSIC_KEY),
            mute_sound_effects: read_flag(store, Self::SOUND_KEY),
        };
        log::info!(
            "Audio settings: music muted {}, effects muted {}",
            settings.mute_music,
            settings.mute_sound_effects
        );
        settings
    }

    /// Save both flags
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistError> {
        store.set(Self::MUSIC_KEY, bool_str(self.mute_music))?;
        store.set(Self::SOUND_KEY, bool_str(self.mute_sound_effects))?;
        log::info!("Settings saved");
        Ok(())
    }
}

fn read_flag(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.get(key) {
        Ok(Some(value)) => value == "true",
        Ok(None) => false,
        Err(e) => {
            log::warn!("Could not read {key}: {e}");
            false
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
