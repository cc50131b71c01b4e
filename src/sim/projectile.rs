//! Player and enemy projectiles
//!
//! Player shots come in two families: the absorbing plug, which also eats
//! enemy shots, and the wand's flame, which ignites whatever it hits. Both
//! are consumed by the first enemy or boss they touch.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::combat::{damage_boss, hurt_player, strike_enemy};
use super::enemy::Tier;
use super::state::SessionState;
use crate::consts::*;
use crate::{circles_overlap, heading};

/// Family-specific projectile data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Absorbs up to `budget` enemy shots
    Plug { budget: u32, absorbed: u32, size: f32 },
    /// Ignites on hit
    Flame { level: u32, size: f32 },
}

impl ProjectileKind {
    /// Hit radius before arena scaling
    pub fn hit_radius(&self) -> f32 {
        match *self {
            ProjectileKind::Plug { size, .. } => 12.0 * size,
            ProjectileKind::Flame { level, size } => {
                4.8 * (1.0 + level.saturating_sub(1) as f32 * 0.1) * size
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Weapon credited with the damage
    pub weapon: u32,
    pub pos: Vec2,
    pub angle: f32,
    /// Nominal units per second
    pub speed: f32,
    pub damage: f32,
    pub opacity: f32,
    created: f64,
    /// `None` for shots that live until they hit or leave the arena
    lifetime: Option<f64>,
    pub kind: ProjectileKind,
}

impl Projectile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        weapon: u32,
        pos: Vec2,
        angle: f32,
        speed: f32,
        damage: f32,
        opacity: f32,
        lifetime: Option<f64>,
        kind: ProjectileKind,
        now: f64,
    ) -> Self {
        Self {
            id,
            weapon,
            pos,
            angle,
            speed,
            damage,
            opacity,
            created: now,
            lifetime,
            kind,
        }
    }

    pub fn radius(&self, scale: f32) -> f32 {
        self.kind.hit_radius() * scale
    }

    /// Move and resolve hits; false once the shot is spent
    fn update(&mut self, state: &mut SessionState, dt: f32) -> bool {
        self.pos += heading(self.angle) * self.speed * state.scale * dt;
        if out_of_bounds(self.pos, state.arena())
            || self.lifetime.is_some_and(|ms| state.now - self.created > ms)
        {
            return false;
        }

        let radius = self.radius(state.scale);
        let hit = (0..state.enemies.len()).rev().find(|&i| {
            let enemy = &state.enemies[i];
            circles_overlap(self.pos, radius, enemy.pos, enemy.radius)
        });
        if let Some(index) = hit {
            if matches!(self.kind, ProjectileKind::Flame { .. }) {
                state.enemies[index].flame.ignite(self.weapon);
            }
            strike_enemy(state, index, self.damage, self.weapon);
            return false;
        }

        if let Some(boss) = state.boss.as_mut()
            && boss.is_exposed()
            && !boss.is_dying()
            && circles_overlap(self.pos, radius, boss.pos, boss.radius)
        {
            if matches!(self.kind, ProjectileKind::Flame { .. }) {
                boss.flame.ignite(self.weapon);
            }
            damage_boss(state, self.damage, self.weapon);
            return false;
        }

        if let ProjectileKind::Plug {
            budget, absorbed, ..
        } = &mut self.kind
        {
            let pos = self.pos;
            state.enemy_projectiles.retain(|shot| {
                if *absorbed >= *budget || !circles_overlap(pos, radius, shot.pos, shot.radius) {
                    return true;
                }
                *absorbed += 1;
                false
            });
            if *absorbed >= *budget {
                return false;
            }
        }
        true
    }
}

/// Hitbox shape of an enemy shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotShape {
    Aimed,
    Burst,
}

impl ShotShape {
    pub fn base_radius(self) -> f32 {
        match self {
            ShotShape::Aimed => 4.0,
            ShotShape::Burst => 6.0,
        }
    }
}

/// When an enemy shot expires on its own
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShotLimit {
    /// Session milliseconds since firing
    Lifetime(f64),
    /// Nominal units travelled from the muzzle
    Distance(f32),
    Unbounded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub id: u32,
    pub pos: Vec2,
    start: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub limit: ShotLimit,
    created: f64,
    /// Time spent inside pools (ms)
    pool_ms: f64,
    pub shape: ShotShape,
    pub tier: Tier,
}

impl EnemyProjectile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        pos: Vec2,
        angle: f32,
        speed: f32,
        damage: f32,
        shape: ShotShape,
        tier: Tier,
        limit: ShotLimit,
        scale: f32,
        now: f64,
    ) -> Self {
        Self {
            id,
            pos,
            start: pos,
            angle,
            speed,
            damage,
            radius: shape.base_radius() * scale * tier.shot_scale(),
            limit,
            created: now,
            pool_ms: 0.0,
            shape,
            tier,
        }
    }

    /// Move and resolve the player hit; false once gone
    fn update(&mut self, state: &mut SessionState, dt: f32) -> bool {
        let mut slow = 1.0;
        if let Some(pool) = state
            .pools
            .iter()
            .find(|pool| circles_overlap(self.pos, self.radius, pool.pos, pool.radius))
        {
            slow = (1.0 - 0.35 * pool.damage_multiplier).clamp(0.1, 0.65);
            self.pool_ms += dt as f64 * 1000.0;
            if self.pool_ms >= POOL_DISSOLVE_MS {
                return false;
            }
        }

        self.pos += heading(self.angle) * self.speed * slow * state.scale * dt;

        let expired = match self.limit {
            ShotLimit::Distance(max) => self.start.distance(self.pos) > max * state.scale,
            ShotLimit::Lifetime(ms) => state.now - self.created > ms,
            ShotLimit::Unbounded => false,
        };
        if expired || out_of_bounds(self.pos, state.arena()) {
            return false;
        }

        if circles_overlap(self.pos, self.radius, state.player.pos, state.player.radius) {
            hurt_player(state, self.damage);
            return false;
        }
        true
    }
}

fn out_of_bounds(pos: Vec2, arena: Vec2) -> bool {
    pos.x < -OFFSCREEN_MARGIN
        || pos.x > arena.x + OFFSCREEN_MARGIN
        || pos.y < -OFFSCREEN_MARGIN
        || pos.y > arena.y + OFFSCREEN_MARGIN
}

/// Advance player projectiles and resolve their hits
pub fn update_projectiles(state: &mut SessionState, dt: f32) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    projectiles.retain_mut(|p| p.update(state, dt));
    projectiles.append(&mut state.projectiles);
    state.projectiles = projectiles;
}

/// Advance enemy projectiles and resolve player hits
pub fn update_enemy_projectiles(state: &mut SessionState, dt: f32) {
    let mut shots = std::mem::take(&mut state.enemy_projectiles);
    shots.retain_mut(|shot| shot.update(state, dt));
    shots.append(&mut state.enemy_projectiles);
    state.enemy_projectiles = shots;
}
