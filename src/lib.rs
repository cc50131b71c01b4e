//! Swarm Survivor - simulation core for a top-down survival action game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, combat, progression, session)
//! - `persistence`: Permanent progression record and key-value storage
//! - `settings`: Mute flags
//! - `audio`: Sound/music catalog and track sequencing
//! - `platform`: Browser/native clock and storage selection
//! - `config`: Arena and clock tuning
//! - `host`: Frame driver tying a session to audio and storage

pub mod audio;
pub mod config;
pub mod host;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use config::SimConfig;
pub use host::GameHost;
pub use persistence::PermanentStats;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal arena size all speeds and radii are tuned against
    pub const BASE_ARENA_WIDTH: f32 = 1200.0;
    pub const BASE_ARENA_HEIGHT: f32 = 800.0;

    /// Largest movement step per frame (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Entities further than this outside the arena are culled
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    /// Boss arrives after this much game time (seconds)
    pub const BOSS_SPAWN_SECS: u32 = 300;
    /// Endless difficulty rises every this many seconds past the boss mark
    pub const ENDLESS_STEP_SECS: u32 = 30;

    /// Highest level any weapon can reach
    pub const MAX_WEAPON_LEVEL: u32 = 5;
    /// Run upgrade caps
    pub const MAX_ARMOR_LEVEL: u32 = 3;
    pub const MAX_HASTE_LEVEL: u32 = 5;
    pub const MAX_FRENZY_LEVEL: u32 = 5;

    /// Options offered per level-up
    pub const UPGRADE_CHOICES: usize = 3;
    /// Rerolls every session starts with, before permanent bonuses
    pub const BASE_REROLLS: f32 = 3.0;
    pub const REROLLS_PER_PERMANENT_LEVEL: f32 = 0.05;

    /// XP needed for the first level-up
    pub const BASE_XP_NEEDED: u32 = 10;
    pub const HARD_BASE_XP_NEEDED: u32 = 20;

    /// Score bonus for beating the boss (doubled in hard mode)
    pub const WIN_SCORE_BONUS: u64 = 1000;

    /// Flame damage-over-time
    pub const FLAME_TICK_MS: f64 = 200.0;
    pub const FLAME_DAMAGE_PER_TICK: f32 = 3.0;

    /// Enemy projectiles die after this long inside pools (ms)
    pub const POOL_DISSOLVE_MS: f64 = 5000.0;
}

/// Uniform factor mapping nominal speeds/radii onto the actual arena size
#[inline]
pub fn scale_factor(width: f32, height: f32) -> f32 {
    ((width * height) / (consts::BASE_ARENA_WIDTH * consts::BASE_ARENA_HEIGHT)).sqrt()
}

/// Unit vector for an angle in radians
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the ray from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Move `pos` toward `target` by `step`, returning the distance before the move.
///
/// Does nothing when already on top of the target.
#[inline]
pub fn seek(pos: &mut Vec2, target: Vec2, step: f32) -> f32 {
    let delta = target - *pos;
    let distance = delta.length();
    if distance > 0.0 {
        *pos += delta / distance * step;
    }
    distance
}

/// Circle-circle overlap (strict)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_nominal() {
        assert!((scale_factor(1200.0, 800.0) - 1.0).abs() < 1e-6);
        assert!((scale_factor(2400.0, 1600.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_seek_moves_toward_target() {
        let mut pos = Vec2::ZERO;
        let d = seek(&mut pos, Vec2::new(10.0, 0.0), 4.0);
        assert_eq!(d, 10.0);
        assert!((pos.x - 4.0).abs() < 1e-6);
        assert_eq!(pos.y, 0.0);

        // No movement when already there
        let mut pos = Vec2::new(3.0, 3.0);
        seek(&mut pos, Vec2::new(3.0, 3.0), 5.0);
        assert_eq!(pos, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    }
}
