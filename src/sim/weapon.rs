//! Player weapons: catalog, cooldowns, firing and upgrades

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::collision::{nearest_target_or_shot, strongest_target};
use super::hazard::{CollarAura, DamagePool, Side, Strike, StrikeMotion};
use super::projectile::{Projectile, ProjectileKind};
use super::scaling::{Bonuses, CooldownDecay, effective_cooldown, haste_factor};
use super::schedule::ScheduledEvent;
use super::state::SessionState;
use crate::angle_between;
use crate::consts::MAX_WEAPON_LEVEL;

const SECOND_STRIKE_DELAY_MS: f64 = 100.0;
const ORBIT_BASE_DEGREES_PER_SEC: f64 = 1200.0;
const MIN_AURA_INTERVAL_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Melee sweep beside the player
    Blade,
    /// Absorbing shot at the nearest threat
    Plug,
    /// Damaging aura around the player
    Collar,
    /// Slowing damage pool under the player
    Pool,
    /// Flame bursts at the strongest target
    Wand,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 5] = [
        WeaponKind::Blade,
        WeaponKind::Plug,
        WeaponKind::Collar,
        WeaponKind::Pool,
        WeaponKind::Wand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Blade => "Blade",
            WeaponKind::Plug => "Plug",
            WeaponKind::Collar => "Collar",
            WeaponKind::Pool => "Pool",
            WeaponKind::Wand => "Wand",
        }
    }

    pub fn base_damage(self) -> f32 {
        match self {
            WeaponKind::Blade => 120.0,
            WeaponKind::Plug => 10.0,
            WeaponKind::Collar => 3.0,
            WeaponKind::Pool => 8.0,
            WeaponKind::Wand => 5.0,
        }
    }

    /// Cooldown before level, haste and permanent bonuses (ms)
    pub fn base_cooldown(self) -> f64 {
        match self {
            WeaponKind::Blade => 4000.0,
            WeaponKind::Plug => 1000.0,
            WeaponKind::Collar => 0.0,
            WeaponKind::Pool => 7000.0,
            WeaponKind::Wand => 3000.0,
        }
    }

    pub fn cooldown_decay(self) -> CooldownDecay {
        match self {
            WeaponKind::Blade | WeaponKind::Pool | WeaponKind::Wand => CooldownDecay::Geometric,
            WeaponKind::Plug | WeaponKind::Collar => CooldownDecay::Hyperbolic,
        }
    }

    /// Nominal units per second; 0 for weapons that fire no projectiles
    pub fn projectile_speed(self) -> f32 {
        match self {
            WeaponKind::Plug => 600.0,
            WeaponKind::Wand => 420.0,
            _ => 0.0,
        }
    }
}

/// Stats of one blade swing, carried to the delayed second strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BladeSwing {
    pub damage: f32,
    pub range: f32,
    pub size: f32,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: u32,
    pub kind: WeaponKind,
    pub level: u32,
    /// Base damage after acquisition bonus, upgrades and power picks
    pub damage: f32,
    /// Wand shots per burst
    pub burst_count: u32,
    pub last_fire: Option<f64>,
    /// Damage credited to this weapon this session
    pub total_damage: f64,
    pub acquired_at: f64,
}

impl Weapon {
    pub fn new(id: u32, kind: WeaponKind, bonuses: &Bonuses, now: f64) -> Self {
        Self {
            id,
            kind,
            level: 1,
            damage: (kind.base_damage() * bonuses.damage).floor(),
            burst_count: if kind == WeaponKind::Wand { 3 } else { 1 },
            last_fire: None,
            total_damage: 0.0,
            acquired_at: now,
        }
    }

    pub fn cooldown(&self, haste: u32, bonuses: &Bonuses) -> f64 {
        effective_cooldown(
            self.kind.base_cooldown(),
            self.level,
            self.kind.cooldown_decay(),
            haste,
            bonuses,
        )
    }

    /// Damage per hit at the current level
    pub fn level_damage(&self) -> f32 {
        self.damage * (1.0 + self.level as f32 * 0.2)
    }

    /// Level up; false at max level
    pub fn upgrade(&mut self) -> bool {
        if self.level >= MAX_WEAPON_LEVEL {
            return false;
        }
        self.level += 1;
        self.damage = (self.damage * 1.3).floor();
        if self.kind == WeaponKind::Wand {
            self.burst_count += 1;
        }
        true
    }

    /// Average damage per second since the weapon was picked up
    pub fn dps(&self, now: f64) -> f64 {
        let seconds = (now - self.acquired_at) / 1000.0;
        if seconds > 0.0 { self.total_damage / seconds } else { 0.0 }
    }
}

/// Fire every weapon whose cooldown has elapsed
pub fn fire_weapons(state: &mut SessionState) {
    let ids: Vec<u32> = state.weapons.iter().map(|w| w.id).collect();
    for id in ids {
        let Some(weapon) = state.weapon(id).cloned() else {
            continue;
        };
        if weapon.kind == WeaponKind::Collar {
            if !state.auras.iter().any(|a| a.weapon == weapon.id) {
                spawn_collar_auras(state, &weapon);
            }
            continue;
        }

        let now = state.now;
        let cooldown = weapon.cooldown(state.upgrades.haste, &state.bonuses);
        if weapon.last_fire.is_some_and(|t| now - t < cooldown) {
            continue;
        }
        if let Some(w) = state.weapon_mut(id) {
            w.last_fire = Some(now);
        }

        match weapon.kind {
            WeaponKind::Blade => swing_blade(state, &weapon, cooldown),
            WeaponKind::Plug => fire_plug(state, &weapon),
            WeaponKind::Pool => drop_pool(state, &weapon),
            WeaponKind::Wand => fire_wand(state, &weapon),
            WeaponKind::Collar => {}
        }
    }
}

/// Upgrade the owned weapon of `kind`, rebuilding collar auras
pub fn upgrade_weapon(state: &mut SessionState, kind: WeaponKind) -> bool {
    let Some(weapon) = state.weapons.iter_mut().find(|w| w.kind == kind) else {
        return false;
    };
    if !weapon.upgrade() {
        return false;
    }
    let weapon = weapon.clone();
    log::debug!("{} upgraded to level {}", kind.name(), weapon.level);

    if kind == WeaponKind::Collar && state.auras.iter().any(|a| a.weapon == weapon.id) {
        state.auras.retain(|a| a.weapon != weapon.id);
        spawn_collar_auras(state, &weapon);
    }
    true
}

fn spawn_collar_auras(state: &mut SessionState, weapon: &Weapon) {
    let level = weapon.level;
    let bonuses = state.bonuses;
    let radius = 40.0 * (1.0 + level as f32 * 0.1) * bonuses.attack_size;
    let damage = weapon.level_damage();
    let interval = (300.0 / (1.0 + level as f64 * 0.1)
        * haste_factor(state.upgrades.haste)
        * bonuses.cooldown as f64)
        .max(MIN_AURA_INTERVAL_MS);
    let now = state.now;

    if level >= MAX_WEAPON_LEVEL {
        let id = state.next_entity_id();
        let clockwise = CollarAura::new(id, weapon.id, radius, damage, interval, level, 1.0, now);
        let id = state.next_entity_id();
        let counter =
            CollarAura::new(id, weapon.id, radius, damage, interval, level, -1.0, now).opposite();
        state.auras.push(clockwise);
        state.auras.push(counter);
    } else {
        let id = state.next_entity_id();
        state
            .auras
            .push(CollarAura::new(id, weapon.id, radius, damage, interval, level, 0.0, now));
    }
}

fn swing_blade(state: &mut SessionState, weapon: &Weapon, cooldown: f64) {
    let atk = state.bonuses.attack_size;
    let level = weapon.level;
    let swing = BladeSwing {
        damage: weapon.level_damage(),
        range: 70.0 * (1.0 + level as f32 * 0.1) * atk,
        size: 128.0 * atk,
        duration: 500.0 + (level as f64 - 1.0) * 100.0,
    };
    let now = state.now;
    let id = state.next_entity_id();

    if level >= MAX_WEAPON_LEVEL {
        let degrees_per_sec = ORBIT_BASE_DEGREES_PER_SEC * weapon.kind.base_cooldown() / cooldown;
        let duration = swing.duration.max(360.0 / degrees_per_sec * 1000.0);
        let motion = StrikeMotion::Orbit {
            angle: 0.0,
            degrees_per_sec: degrees_per_sec as f32,
        };
        state.strikes.push(Strike::new(
            id,
            weapon.id,
            swing.damage,
            swing.range,
            swing.size,
            duration,
            motion,
            now,
        ));
        return;
    }

    let motion = StrikeMotion::Fixed {
        anchor: state.player.pos,
        side: Side::Left,
    };
    state.strikes.push(Strike::new(
        id,
        weapon.id,
        swing.damage,
        swing.range,
        swing.size,
        swing.duration,
        motion,
        now,
    ));
    state.schedule.schedule(
        now + SECOND_STRIKE_DELAY_MS,
        ScheduledEvent::SecondStrike {
            weapon: weapon.id,
            swing,
        },
    );
}

fn fire_plug(state: &mut SessionState, weapon: &Weapon) {
    let from = state.player.pos;
    let Some(target) = nearest_target_or_shot(state, from) else {
        return;
    };
    let atk = state.bonuses.attack_size;
    let speed = weapon.kind.projectile_speed();
    let (speed, damage, size, lifetime, budget) = if weapon.level >= MAX_WEAPON_LEVEL {
        (speed * 0.3, weapon.damage * 5.0, 5.0 * atk, 5000.0, 5)
    } else {
        let budget = (1.0 + (weapon.level - 1) as f32 * 0.5).floor() as u32;
        (speed * atk, weapon.level_damage(), atk, 2000.0, budget)
    };
    let id = state.next_entity_id();
    state.projectiles.push(Projectile::new(
        id,
        weapon.id,
        from,
        angle_between(from, target),
        speed,
        damage,
        1.0,
        Some(lifetime),
        ProjectileKind::Plug {
            budget,
            absorbed: 0,
            size,
        },
        state.now,
    ));
}

fn drop_pool(state: &mut SessionState, weapon: &Weapon) {
    let level = weapon.level as f32;
    let radius = 80.0 * (1.0 + level * 0.1) * state.bonuses.attack_size * state.scale;
    let duration = 5000.0 * (1.0 + weapon.level as f64 * 0.1);
    let rotation = state.rng.unit() * TAU;
    let id = state.next_entity_id();
    state.pools.push(DamagePool::new(
        id,
        weapon.id,
        state.player.pos,
        radius,
        weapon.level_damage(),
        duration,
        weapon.level,
        weapon.damage / WeaponKind::Pool.base_damage(),
        rotation,
        state.now,
    ));
}

fn fire_wand(state: &mut SessionState, weapon: &Weapon) {
    if strongest_target(state, state.player.pos).is_none() {
        return;
    }
    let (shots, delay, damage, opacity) = if weapon.level >= MAX_WEAPON_LEVEL {
        (10, 50.0, weapon.damage * 0.5, 0.25)
    } else {
        (weapon.burst_count, 200.0, weapon.level_damage(), 0.5)
    };
    let size = state.bonuses.attack_size;
    let now = state.now;
    for i in 0..shots {
        state.schedule.schedule(
            now + i as f64 * delay,
            ScheduledEvent::WandShot {
                weapon: weapon.id,
                damage,
                level: weapon.level,
                size,
                opacity,
            },
        );
    }
}
