//! Runtime simulation configuration.
//!
//! [`SimConfig`] carries the arena size and clock tuning a session is built
//! with. Every field has a default, so a JSON document only needs the keys it
//! wants to override:
//!
//! ```json
//! { "arena_width": 1920, "arena_height": 1080, "seed": 42 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::PersistError;

/// Arena and clock configuration for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Arena width in world units
    pub arena_width: f32,
    /// Arena height in world units
    pub arena_height: f32,
    /// Per-frame movement step cap in seconds
    pub max_frame_dt: f32,
    /// The boss starts its entrance on its own this long after spawning if
    /// the host never reports its music starting (ms)
    pub boss_intro_timeout_ms: f64,
    /// Fixed RNG seed; `None` draws a fresh one per session
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_width: BASE_ARENA_WIDTH,
            arena_height: BASE_ARENA_HEIGHT,
            max_frame_dt: MAX_FRAME_DT,
            boss_intro_timeout_ms: 8000.0,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Parse from JSON; missing keys fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded config from {} ({}x{})",
            path.display(),
            config.arena_width,
            config.arena_height
        );
        Ok(config)
    }

    /// Movement/radius scale relative to the nominal arena
    pub fn scale(&self) -> f32 {
        crate::scale_factor(self.arena_width, self.arena_height)
    }

    /// Replace nonsensical values with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.arena_width > 0.0) || !(self.arena_height > 0.0) {
            log::warn!(
                "Invalid arena size {}x{}, using defaults",
                self.arena_width,
                self.arena_height
            );
            self.arena_width = defaults.arena_width;
            self.arena_height = defaults.arena_height;
        }
        if !(self.max_frame_dt > 0.0) {
            self.max_frame_dt = defaults.max_frame_dt;
        }
        if !(self.boss_intro_timeout_ms >= 0.0) {
            self.boss_intro_timeout_ms = defaults.boss_intro_timeout_ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.arena_width, BASE_ARENA_WIDTH);
        assert_eq!(config.max_frame_dt, MAX_FRAME_DT);
    }

    #[test]
    fn test_invalid_arena_is_replaced() {
        let config = SimConfig::from_json(r#"{ "arena_width": -5, "arena_height": 0 }"#).unwrap();
        assert_eq!(config.arena_width, BASE_ARENA_WIDTH);
        assert_eq!(config.arena_height, BASE_ARENA_HEIGHT);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(SimConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_scale() {
        let config = SimConfig {
            arena_width: 2400.0,
            arena_height: 1600.0,
            ..Default::default()
        };
        assert!((config.scale() - 2.0).abs() < 1e-6);
    }
}
