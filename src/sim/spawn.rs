//! Enemy spawning: rate curve, kind mix and tier rolls

use glam::Vec2;

use super::enemy::{Enemy, EnemyKind, Tier};
use super::scaling::tier_chances;
use super::state::SessionState;
use crate::consts::*;

/// Extra spawn chance per frenzy level
const FRENZY_EXTRA_CHANCE: f32 = 0.25;
/// Distance outside the arena edge new enemies appear at
const EDGE_OFFSET: f32 = 50.0;

/// Frames between spawns at 60 fps
pub fn spawn_rate(game_time: u32, endless: bool, endless_level: u32, frenzy: u32) -> f32 {
    let base = if endless {
        (30.0 - endless_level as f32).max(10.0)
    } else {
        let d = (game_time / 20) as f32;
        (120.0 - 7.5 * d).max(30.0)
    };
    base * 0.9f32.powi(frenzy as i32)
}

/// Endless difficulty for a game time
pub fn endless_level_at(game_time: u32) -> u32 {
    game_time.saturating_sub(BOSS_SPAWN_SECS) / ENDLESS_STEP_SECS
}

/// `(charger, shooter)` odds for a game time
pub fn kind_odds(game_time: u32, endless: bool, endless_level: u32) -> (f32, f32) {
    let t = if endless { game_time.max(180) } else { game_time };
    if t >= 180 {
        if endless && endless_level > 0 {
            let lvl = endless_level as f32;
            ((0.25 + 0.01 * lvl).min(0.5), (0.25 + 0.005 * lvl).min(0.4))
        } else {
            (0.25, 0.25)
        }
    } else if t >= 60 {
        (0.0, 0.3)
    } else {
        (0.0, 0.0)
    }
}

/// Roll for this tick's spawns
pub fn spawn_enemies(state: &mut SessionState, dt: f32) {
    if state.boss_spawned && !state.endless {
        return;
    }
    if state.endless {
        state.endless_level = endless_level_at(state.game_time);
    }
    let rate = spawn_rate(
        state.game_time,
        state.endless,
        state.endless_level,
        state.upgrades.frenzy,
    );
    let chance = (dt * 60.0 / rate).min(1.0);
    if !state.rng.chance(chance) {
        return;
    }
    spawn_one(state);
    for _ in 0..state.upgrades.frenzy {
        if state.rng.chance(FRENZY_EXTRA_CHANCE) {
            spawn_one(state);
        }
    }
}

fn spawn_one(state: &mut SessionState) {
    let (charger, shooter) = kind_odds(state.game_time, state.endless, state.endless_level);
    let roll = state.rng.unit();
    let kind = if roll < charger {
        EnemyKind::Charger
    } else if roll < charger + shooter {
        EnemyKind::Shooter
    } else {
        EnemyKind::Swarmer
    };

    let difficulty = state.difficulty();
    let (super_elite, elite) = tier_chances(&difficulty);
    let tier = if state.rng.chance(super_elite) {
        Tier::SuperElite
    } else if state.rng.chance(elite) {
        Tier::Elite
    } else {
        Tier::Normal
    };

    let pos = edge_position(state);
    let id = state.next_entity_id();
    state
        .enemies
        .push(Enemy::spawn(id, kind, tier, pos, &difficulty, state.scale, state.now));
}

/// Random point just outside one of the four arena edges
fn edge_position(state: &mut SessionState) -> Vec2 {
    let arena = state.arena();
    let offset = EDGE_OFFSET;
    let side = state.rng.below(4);
    let along = state.rng.unit();
    match side {
        0 => Vec2::new(along * arena.x, -offset),
        1 => Vec2::new(arena.x + offset, along * arena.y),
        2 => Vec2::new(along * arena.x, arena.y + offset),
        _ => Vec2::new(-offset, along * arena.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::state::GamePhase;
    use proptest::prelude::*;

    fn playing_state() -> SessionState {
        let mut state = SessionState::new(SimConfig::default(), PermanentStats::default(), 11);
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_rate_curve() {
        assert_eq!(spawn_rate(0, false, 0, 0), 120.0);
        assert_eq!(spawn_rate(45, false, 0, 0), 105.0);
        assert_eq!(spawn_rate(299, false, 0, 0), 30.0);
        assert_eq!(spawn_rate(400, true, 3, 0), 27.0);
        assert_eq!(spawn_rate(2000, true, 50, 0), 10.0);
        assert!((spawn_rate(0, false, 0, 2) - 120.0 * 0.81).abs() < 1e-3);
    }

    #[test]
    fn test_endless_level_steps() {
        assert_eq!(endless_level_at(100), 0);
        assert_eq!(endless_level_at(329), 0);
        assert_eq!(endless_level_at(330), 1);
        assert_eq!(endless_level_at(420), 4);
    }

    #[test]
    fn test_kind_mix_by_time() {
        assert_eq!(kind_odds(30, false, 0), (0.0, 0.0));
        assert_eq!(kind_odds(90, false, 0), (0.0, 0.3));
        assert_eq!(kind_odds(200, false, 0), (0.25, 0.25));
        let (charger, shooter) = kind_odds(1000, true, 100);
        assert_eq!(charger, 0.5);
        assert_eq!(shooter, 0.4);
    }

    #[test]
    fn test_no_spawn_on_zero_dt() {
        let mut state = playing_state();
        spawn_enemies(&mut state, 0.0);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_boss_stops_spawns_outside_endless() {
        let mut state = playing_state();
        state.boss_spawned = true;
        for _ in 0..200 {
            spawn_enemies(&mut state, 1.0);
        }
        assert!(state.enemies.is_empty());

        state.endless = true;
        state.game_time = 400;
        spawn_enemies(&mut state, 1.0);
        assert!(!state.enemies.is_empty());
        assert_eq!(state.endless_level, 3);
    }

    #[test]
    fn test_spawns_outside_arena() {
        let mut state = playing_state();
        for _ in 0..50 {
            spawn_enemies(&mut state, 2.0);
        }
        assert_eq!(state.enemies.len(), 50);
        for enemy in &state.enemies {
            let p = enemy.pos;
            let outside = p.x < 0.0 || p.y < 0.0 || p.x > 1200.0 || p.y > 800.0;
            assert!(outside, "{p:?} inside the arena");
            assert_eq!(enemy.kind, EnemyKind::Swarmer);
        }
    }

    proptest! {
        #[test]
        fn test_rate_respects_floors(t in 0u32..5000, lvl in 0u32..500, frenzy in 0u32..=5) {
            prop_assert!(spawn_rate(t, false, 0, frenzy) >= 30.0 * 0.9f32.powi(5) - 1e-3);
            prop_assert!(spawn_rate(t, true, lvl, frenzy) >= 10.0 * 0.9f32.powi(5) - 1e-3);
        }
    }
}
