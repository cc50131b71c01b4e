//! Lingering hitboxes: blade strikes, collar auras and damage pools

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{HitCooldowns, TargetId};
use super::combat::{damage_boss, strike_enemy};
use super::state::SessionState;
use crate::{circles_overlap, heading};

/// Minimum gap between strike hits on the same target (ms)
pub const STRIKE_HIT_COOLDOWN_MS: f64 = 300.0;
/// Pool damage interval (ms)
pub const POOL_DAMAGE_INTERVAL_MS: f64 = 200.0;
const AURA_ROTATION_SPEED: f32 = 0.5;
const POOL_GROWTH_PER_SEC: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrikeMotion {
    /// Beside the spot the player stood on when it was swung
    Fixed { anchor: Vec2, side: Side },
    /// Circles the player
    Orbit { angle: f32, degrees_per_sec: f32 },
}

/// Blade swing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strike {
    pub id: u32,
    pub weapon: u32,
    pub damage: f32,
    /// Distance from the player (nominal units)
    pub range: f32,
    /// Sprite and hitbox diameter (nominal units)
    pub size: f32,
    pub motion: StrikeMotion,
    created: f64,
    duration: f64,
    last_update: f64,
    hits: HitCooldowns,
}

impl Strike {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        weapon: u32,
        damage: f32,
        range: f32,
        size: f32,
        duration: f64,
        motion: StrikeMotion,
        now: f64,
    ) -> Self {
        Self {
            id,
            weapon,
            damage,
            range,
            size,
            motion,
            created: now,
            duration,
            last_update: now,
            hits: HitCooldowns::new(STRIKE_HIT_COOLDOWN_MS),
        }
    }

    pub fn position(&self, player: Vec2, scale: f32) -> Vec2 {
        let reach = self.range * scale;
        match self.motion {
            StrikeMotion::Fixed { anchor, side } => match side {
                Side::Left => anchor - Vec2::X * reach,
                Side::Right => anchor + Vec2::X * reach,
            },
            StrikeMotion::Orbit { angle, .. } => player + heading(angle) * reach,
        }
    }

    /// Remaining life as a fraction, for fading
    pub fn life_fraction(&self, now: f64) -> f32 {
        (1.0 - (now - self.created) / self.duration).clamp(0.0, 1.0) as f32
    }

    fn update(&mut self, state: &mut SessionState) -> bool {
        let now = state.now;
        if now - self.created > self.duration {
            return false;
        }

        if let StrikeMotion::Orbit {
            angle,
            degrees_per_sec,
        } = &mut self.motion
        {
            let elapsed = (now - self.last_update) as f32;
            *angle = (*angle + degrees_per_sec.to_radians() / 1000.0 * elapsed).rem_euclid(TAU);
        }
        self.last_update = now;

        let pos = self.position(state.player.pos, state.scale);
        let radius = self.size * state.scale / 2.0;
        let single = matches!(self.motion, StrikeMotion::Fixed { .. });

        let mut i = state.enemies.len();
        while i > 0 {
            i -= 1;
            let enemy = &state.enemies[i];
            if !circles_overlap(pos, radius, enemy.pos, enemy.radius) {
                continue;
            }
            let target = TargetId::Enemy(enemy.id);
            if !self.hits.try_hit(target, now) {
                continue;
            }
            if strike_enemy(state, i, self.damage, self.weapon) {
                self.hits.forget(target);
            }
            if single {
                break;
            }
        }

        if let Some(boss) = state.boss.as_ref()
            && boss.is_exposed()
            && circles_overlap(pos, radius, boss.pos, boss.radius)
            && self.hits.try_hit(TargetId::Boss, now)
        {
            damage_boss(state, self.damage, self.weapon);
        }
        true
    }
}

/// Damaging ring that follows the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollarAura {
    pub id: u32,
    pub weapon: u32,
    pub damage: f32,
    pub level: u32,
    /// +1 clockwise, -1 counter-clockwise
    pub direction: f32,
    pub rotation: f32,
    pulse_phase: f32,
    base_size: f32,
    /// Current diameter (nominal units)
    pub size: f32,
    created: f64,
    last_update: f64,
    hits: HitCooldowns,
}

impl CollarAura {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        weapon: u32,
        radius: f32,
        damage: f32,
        interval: f64,
        level: u32,
        direction: f32,
        now: f64,
    ) -> Self {
        let base_size = radius * 2.0 * 1.3 * 3.0 * (1.0 + level.saturating_sub(1) as f32 * 0.1);
        Self {
            id,
            weapon,
            damage,
            level,
            direction,
            rotation: 0.0,
            pulse_phase: 0.0,
            base_size,
            size: base_size,
            created: now,
            last_update: now,
            hits: HitCooldowns::new(interval),
        }
    }

    /// Start half a turn out of phase with a partner aura
    pub fn opposite(mut self) -> Self {
        self.rotation = PI;
        self.pulse_phase = PI;
        self
    }

    pub fn interval(&self) -> f64 {
        self.hits.window()
    }

    fn update(&mut self, state: &mut SessionState) {
        let now = state.now;
        let elapsed = ((now - self.last_update) / 1000.0) as f32;
        self.last_update = now;
        self.rotation =
            (self.rotation + AURA_ROTATION_SPEED * self.direction * elapsed).rem_euclid(TAU);

        if self.level >= 5 {
            let t = ((now - self.created) / 1000.0) as f32;
            self.size = self.base_size * ((t * 2.0 + self.pulse_phase).sin() * 0.4 + 1.1);
        }

        let center = state.player.pos;
        let radius = self.size * state.scale / 2.0;
        let mut i = state.enemies.len();
        while i > 0 {
            i -= 1;
            let enemy = &state.enemies[i];
            if !circles_overlap(center, radius, enemy.pos, enemy.radius) {
                continue;
            }
            let target = TargetId::Enemy(enemy.id);
            if self.hits.try_hit(target, now) && strike_enemy(state, i, self.damage, self.weapon) {
                self.hits.forget(target);
            }
        }

        if let Some(boss) = state.boss.as_ref()
            && boss.is_exposed()
            && circles_overlap(center, radius, boss.pos, boss.radius)
            && self.hits.try_hit(TargetId::Boss, now)
        {
            damage_boss(state, self.damage, self.weapon);
        }
    }
}

/// Stationary area that damages and slows what stands in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagePool {
    pub id: u32,
    pub weapon: u32,
    pub pos: Vec2,
    /// Current radius, grows over time at level 5
    pub radius: f32,
    base_radius: f32,
    pub damage: f32,
    pub duration: f64,
    pub level: u32,
    /// Weapon damage relative to its base, strengthens slows
    pub damage_multiplier: f32,
    pub rotation: f32,
    created: f64,
    last_damage: Option<f64>,
}

impl DamagePool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        weapon: u32,
        pos: Vec2,
        radius: f32,
        damage: f32,
        duration: f64,
        level: u32,
        damage_multiplier: f32,
        rotation: f32,
        now: f64,
    ) -> Self {
        Self {
            id,
            weapon,
            pos,
            radius,
            base_radius: radius,
            damage,
            duration,
            level,
            damage_multiplier,
            rotation,
            created: now,
            last_damage: None,
        }
    }

    /// Share of speed taken from enemies standing in the pool
    pub fn slow_fraction(&self) -> f32 {
        self.level as f32 * 0.05 * self.damage_multiplier
    }

    pub fn life_fraction(&self, now: f64) -> f32 {
        (1.0 - (now - self.created) / self.duration).clamp(0.0, 1.0) as f32
    }

    fn update(&mut self, state: &mut SessionState) -> bool {
        let now = state.now;
        let age = now - self.created;
        if age > self.duration {
            return false;
        }
        if self.level >= 5 {
            self.radius = self.base_radius * (1.0 + (age / 1000.0) as f32 * POOL_GROWTH_PER_SEC);
        }

        if self
            .last_damage
            .is_some_and(|t| now - t < POOL_DAMAGE_INTERVAL_MS)
        {
            return true;
        }
        self.last_damage = Some(now);

        let mut i = state.enemies.len();
        while i > 0 {
            i -= 1;
            let enemy = &state.enemies[i];
            if circles_overlap(self.pos, self.radius, enemy.pos, enemy.radius) {
                strike_enemy(state, i, self.damage, self.weapon);
            }
        }
        if let Some(boss) = state.boss.as_ref()
            && boss.is_exposed()
            && circles_overlap(self.pos, self.radius, boss.pos, boss.radius)
        {
            damage_boss(state, self.damage, self.weapon);
        }
        true
    }
}

pub fn update_strikes(state: &mut SessionState) {
    let mut strikes = std::mem::take(&mut state.strikes);
    strikes.retain_mut(|s| s.update(state));
    strikes.append(&mut state.strikes);
    state.strikes = strikes;
}

pub fn update_auras(state: &mut SessionState) {
    let mut auras = std::mem::take(&mut state.auras);
    for aura in auras.iter_mut() {
        aura.update(state);
    }
    auras.append(&mut state.auras);
    state.auras = auras;
}

pub fn update_pools(state: &mut SessionState) {
    let mut pools = std::mem::take(&mut state.pools);
    pools.retain_mut(|p| p.update(state));
    pools.append(&mut state.pools);
    state.pools = pools;
}
