//! Enemies and their per-kind AI
//!
//! - Swarmer: walks at the player and bursts on contact
//! - Shooter: walks, stops briefly to fire aimed shots
//! - Charger: runs the shared charge cycle and hits on contact

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::charge::{ChargeCycle, ChargePhase, ChargeStep, ChargeTuning, burst_angles};
use super::combat::{drop_orb, hurt_player};
use super::projectile::{EnemyProjectile, ShotLimit, ShotShape};
use super::scaling::{Difficulty, enemy_stats};
use super::state::SessionState;
use crate::consts::*;
use crate::{angle_between, circles_overlap, seek};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Swarmer,
    Shooter,
    Charger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Normal,
    Elite,
    SuperElite,
}

impl Tier {
    /// Elite perks also apply to super-elites
    pub fn is_elite(self) -> bool {
        !matches!(self, Tier::Normal)
    }

    /// Size multiplier for this tier's projectiles (also the burst range factor)
    pub fn shot_scale(self) -> f32 {
        match self {
            Tier::Normal => 1.0,
            Tier::Elite => 2.0,
            Tier::SuperElite => 4.0,
        }
    }
}

/// Stacking burn left by flame shots
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlameDot {
    pub ticks: u32,
    last_tick: Option<f64>,
    /// Weapon credited with the burn
    pub source: Option<u32>,
}

impl FlameDot {
    pub fn ignite(&mut self, weapon: u32) {
        self.ticks += 1;
        self.source = Some(weapon);
    }

    /// Damage due at `now`: every tick interval, `per_tick * ticks`, then one
    /// tick burns out
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        if self.ticks == 0 {
            return None;
        }
        if self.last_tick.is_some_and(|last| now - last < FLAME_TICK_MS) {
            return None;
        }
        let damage = FLAME_DAMAGE_PER_TICK * self.ticks as f32;
        self.last_tick = Some(now);
        self.ticks -= 1;
        Some(damage)
    }
}

/// Kind-specific AI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyAi {
    Swarmer,
    Shooter {
        last_shot: Option<f64>,
        /// Standing still since this time after a shot
        firing_since: Option<f64>,
    },
    Charger(ChargeCycle),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub tier: Tier,
    pub pos: Vec2,
    pub radius: f32,
    /// Nominal units per second before slows
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    pub shot_cooldown: f64,
    pub max_charge: f32,
    pub xp: u32,
    /// Product of pool slows this tick
    pub slow: f32,
    pub facing_right: bool,
    pub flame: FlameDot,
    pub ai: EnemyAi,
}

impl Enemy {
    /// Shooter pause after each shot (ms)
    pub const FIRING_PAUSE_MS: f64 = 200.0;
    const AIMED_SHOT_SPEED: f32 = 216.0;
    const AIMED_SHOT_DAMAGE: f32 = 20.0;
    const ELITE_SHOT_LIFETIME_MS: f64 = 10_000.0;
    const BURST_SPEED: f32 = 300.0;
    const BURST_DAMAGE: f32 = 30.0;
    const BURST_RANGE: f32 = 120.0;

    pub fn spawn(
        id: u32,
        kind: EnemyKind,
        tier: Tier,
        pos: Vec2,
        difficulty: &Difficulty,
        scale: f32,
        now: f64,
    ) -> Self {
        let stats = enemy_stats(kind, tier, difficulty);
        let ai = match kind {
            EnemyKind::Swarmer => EnemyAi::Swarmer,
            EnemyKind::Shooter => EnemyAi::Shooter {
                last_shot: None,
                firing_since: None,
            },
            EnemyKind::Charger => EnemyAi::Charger(ChargeCycle::new(now)),
        };
        Self {
            id,
            kind,
            tier,
            pos,
            radius: stats.radius * scale,
            speed: stats.speed,
            health: stats.health,
            max_health: stats.health,
            contact_damage: stats.contact_damage,
            shot_cooldown: stats.shot_cooldown,
            max_charge: stats.max_charge,
            xp: stats.xp,
            slow: 1.0,
            facing_right: true,
            flame: FlameDot::default(),
            ai,
        }
    }

    /// Subtract health, clamped at zero; true once dead
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Pulse scale for drawing chargers
    pub fn pulse_scale(&self) -> f32 {
        match &self.ai {
            EnemyAi::Charger(cycle) => cycle.pulse_scale,
            _ => 1.0,
        }
    }

    fn update(&mut self, state: &mut SessionState, dt: f32) {
        let now = state.now;

        if let Some(burn) = self.flame.tick(now) {
            if let Some(weapon) = self.flame.source {
                state.credit(weapon, burn);
            }
            if self.take_damage(burn) {
                drop_orb(state, self.pos, self.xp);
                return;
            }
        }

        self.slow = state
            .pools
            .iter()
            .filter(|pool| circles_overlap(pool.pos, pool.radius, self.pos, self.radius))
            .map(|pool| (1.0 - pool.slow_fraction()).max(0.0))
            .product();
        let step = self.speed * self.slow * state.scale * dt;
        let player = state.player.pos;

        let mut ai = std::mem::replace(&mut self.ai, EnemyAi::Swarmer);
        match &mut ai {
            EnemyAi::Swarmer => {
                let distance = seek(&mut self.pos, player, step);
                if distance < self.radius + state.player.radius {
                    hurt_player(state, self.contact_damage);
                    self.health = 0.0;
                    drop_orb(state, self.pos, self.xp);
                }
            }
            EnemyAi::Shooter {
                last_shot,
                firing_since,
            } => {
                if let Some(since) = *firing_since {
                    if now - since >= Self::FIRING_PAUSE_MS {
                        *firing_since = None;
                    }
                } else {
                    self.facing_right = player.x >= self.pos.x;
                    seek(&mut self.pos, player, step);
                }

                let ready = last_shot.is_none_or(|t| now - t >= self.shot_cooldown);
                if firing_since.is_none() && ready {
                    self.fire_aimed(state, player);
                    *last_shot = Some(now);
                    *firing_since = Some(now);
                }
            }
            EnemyAi::Charger(cycle) => {
                let move_step = state.scale * dt;
                match cycle.update(
                    &mut self.pos,
                    player,
                    self.max_charge * state.scale,
                    &ChargeTuning::CHARGER,
                    move_step,
                    now,
                ) {
                    ChargeStep::Idle => {
                        self.facing_right = player.x >= self.pos.x;
                        seek(&mut self.pos, player, step);
                    }
                    ChargeStep::Burst => self.fire_burst(state),
                    ChargeStep::Busy => {
                        if cycle.phase == ChargePhase::Charging {
                            self.facing_right = cycle.target.x >= self.pos.x;
                        }
                    }
                }
                if circles_overlap(self.pos, self.radius, player, state.player.radius) {
                    hurt_player(state, self.contact_damage);
                }
            }
        }
        self.ai = ai;
    }

    fn fire_aimed(&self, state: &mut SessionState, player: Vec2) {
        let limit = if self.tier.is_elite() {
            ShotLimit::Lifetime(Self::ELITE_SHOT_LIFETIME_MS)
        } else {
            ShotLimit::Unbounded
        };
        let id = state.next_entity_id();
        state.enemy_projectiles.push(EnemyProjectile::new(
            id,
            self.pos,
            angle_between(self.pos, player),
            Self::AIMED_SHOT_SPEED,
            Self::AIMED_SHOT_DAMAGE,
            ShotShape::Aimed,
            self.tier,
            limit,
            state.scale,
            state.now,
        ));
    }

    fn fire_burst(&self, state: &mut SessionState) {
        let range = Self::BURST_RANGE * self.tier.shot_scale();
        for angle in burst_angles() {
            let id = state.next_entity_id();
            state.enemy_projectiles.push(EnemyProjectile::new(
                id,
                self.pos,
                angle,
                Self::BURST_SPEED,
                Self::BURST_DAMAGE,
                ShotShape::Burst,
                self.tier,
                ShotLimit::Distance(range),
                state.scale,
                state.now,
            ));
        }
    }
}

/// Run every enemy's AI and drop the dead
pub fn update_enemies(state: &mut SessionState, dt: f32) {
    let mut enemies = std::mem::take(&mut state.enemies);
    for enemy in enemies.iter_mut() {
        enemy.update(state, dt);
    }
    enemies.retain(|e| !e.is_dead());
    state.enemies = enemies;
}
