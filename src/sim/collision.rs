//! Hit bookkeeping and target selection
//!
//! Everything in the arena is a circle, so overlap itself is a one-liner
//! ([`crate::circles_overlap`]). What lives here is the part around it:
//! - which target a weapon aims at (nearest, or highest health)
//! - per-target hit cooldowns for lingering hitboxes (strikes, auras)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Something a player weapon can damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetId {
    Enemy(u32),
    Boss,
}

/// Last hit time per target, with a minimum gap between hits on the same one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitCooldowns {
    window: f64,
    hits: Vec<(TargetId, f64)>,
}

impl HitCooldowns {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            hits: Vec::new(),
        }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn set_window(&mut self, window: f64) {
        self.window = window;
    }

    /// Record a hit on `target` if its cooldown has elapsed
    pub fn try_hit(&mut self, target: TargetId, now: f64) -> bool {
        let window = self.window;
        self.hits.retain(|&(_, at)| now - at < window);
        if self.hits.iter().any(|&(id, _)| id == target) {
            return false;
        }
        self.hits.push((target, now));
        true
    }

    pub fn forget(&mut self, target: TargetId) {
        self.hits.retain(|&(id, _)| id != target);
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Position of the closest enemy or exposed boss to `from`
pub fn nearest_target(state: &SessionState, from: Vec2) -> Option<(Vec2, f32)> {
    let mut best: Option<(Vec2, f32)> = None;
    let mut consider = |pos: Vec2| {
        let d = from.distance(pos);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((pos, d));
        }
    };
    for enemy in &state.enemies {
        consider(enemy.pos);
    }
    if let Some(boss) = state.boss.as_ref().filter(|b| b.is_targetable(state.now)) {
        consider(boss.pos);
    }
    best
}

/// Aim point for an absorbing shot: the nearest enemy or boss, replaced by
/// the nearest enemy projectile when one is strictly closer
pub fn nearest_target_or_shot(state: &SessionState, from: Vec2) -> Option<Vec2> {
    let mut best = nearest_target(state, from);
    for shot in &state.enemy_projectiles {
        let d = from.distance(shot.pos);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((shot.pos, d));
        }
    }
    best.map(|(pos, _)| pos)
}

/// Position of the target with the most health; the closer one wins ties
pub fn strongest_target(state: &SessionState, from: Vec2) -> Option<Vec2> {
    let mut best: Option<(Vec2, f32, f32)> = None;
    let mut consider = |pos: Vec2, health: f32| {
        let d = from.distance(pos);
        let better = match best {
            None => true,
            Some((_, bh, bd)) => health > bh || (health == bh && d < bd),
        };
        if better {
            best = Some((pos, health, d));
        }
    };
    for enemy in &state.enemies {
        consider(enemy.pos, enemy.health);
    }
    if let Some(boss) = state.boss.as_ref().filter(|b| b.is_targetable(state.now)) {
        consider(boss.pos, boss.health);
    }
    best.map(|(pos, _, _)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::enemy::{Enemy, EnemyKind, Tier};
    use crate::sim::projectile::{EnemyProjectile, ShotLimit, ShotShape};

    fn state_with_enemies(spots: &[(Vec2, f32)]) -> SessionState {
        let mut state = SessionState::new(SimConfig::default(), PermanentStats::default(), 1);
        for &(pos, health) in spots {
            let id = state.next_entity_id();
            let mut enemy = Enemy::spawn(
                id,
                EnemyKind::Swarmer,
                Tier::Normal,
                pos,
                &state.difficulty(),
                state.scale,
                0.0,
            );
            enemy.health = health;
            state.enemies.push(enemy);
        }
        state
    }

    #[test]
    fn test_hit_cooldown_window() {
        let mut hits = HitCooldowns::new(300.0);
        assert!(hits.try_hit(TargetId::Enemy(1), 0.0));
        assert!(!hits.try_hit(TargetId::Enemy(1), 299.0));
        assert!(hits.try_hit(TargetId::Enemy(2), 299.0));
        assert!(hits.try_hit(TargetId::Enemy(1), 300.0));
        assert!(hits.try_hit(TargetId::Boss, 300.0));
        hits.forget(TargetId::Boss);
        assert!(hits.try_hit(TargetId::Boss, 301.0));
    }

    #[test]
    fn test_hit_cooldowns_prune_old_entries() {
        let mut hits = HitCooldowns::new(100.0);
        for id in 0..10 {
            hits.try_hit(TargetId::Enemy(id), 0.0);
        }
        assert_eq!(hits.len(), 10);
        hits.try_hit(TargetId::Boss, 500.0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_nearest_target() {
        let state = state_with_enemies(&[
            (Vec2::new(900.0, 400.0), 20.0),
            (Vec2::new(500.0, 400.0), 20.0),
        ]);
        let (pos, d) = nearest_target(&state, state.player.pos).unwrap();
        assert_eq!(pos, Vec2::new(500.0, 400.0));
        assert_eq!(d, 100.0);
    }

    #[test]
    fn test_shot_replaces_target_only_when_strictly_closer() {
        let mut state = state_with_enemies(&[(Vec2::new(500.0, 400.0), 20.0)]);
        let id = state.next_entity_id();
        state.enemy_projectiles.push(EnemyProjectile::new(
            id,
            Vec2::new(600.0, 300.0),
            0.0,
            0.0,
            0.0,
            ShotShape::Aimed,
            Tier::Normal,
            ShotLimit::Unbounded,
            1.0,
            0.0,
        ));
        // Equal distance keeps the enemy
        assert_eq!(
            nearest_target_or_shot(&state, state.player.pos),
            Some(Vec2::new(500.0, 400.0))
        );
        state.enemy_projectiles[0].pos = Vec2::new(600.0, 350.0);
        assert_eq!(
            nearest_target_or_shot(&state, state.player.pos),
            Some(Vec2::new(600.0, 350.0))
        );
    }

    #[test]
    fn test_strongest_target_breaks_ties_by_distance() {
        let state = state_with_enemies(&[
            (Vec2::new(900.0, 400.0), 50.0),
            (Vec2::new(700.0, 400.0), 50.0),
            (Vec2::new(100.0, 400.0), 40.0),
        ]);
        assert_eq!(
            strongest_target(&state, state.player.pos),
            Some(Vec2::new(700.0, 400.0))
        );
    }

    #[test]
    fn test_no_targets() {
        let state = state_with_enemies(&[]);
        assert!(nearest_target(&state, state.player.pos).is_none());
        assert!(strongest_target(&state, state.player.pos).is_none());
    }
}
