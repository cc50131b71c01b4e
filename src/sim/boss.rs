//! The boss
//!
//! Arrives at the five-minute mark and waits for its music before drifting
//! into the arena. Once exposed it runs three attacks at once:
//! - an aimed shot on a fixed cooldown
//! - the charge cycle shared with chargers, ending in an 8-way burst
//! - a flip/aura sequence that damages the player near its body
//!
//! Damage is capped per hit, and crossing 75/50/25% health grants a window of
//! invincibility. At zero health it fades out, then the session is won.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::charge::{ChargeCycle, ChargePhase, ChargeStep, ChargeTuning, burst_angles};
use super::combat::{hurt_player, report_boss_hit};
use super::enemy::{FlameDot, Tier};
use super::projectile::{EnemyProjectile, ShotLimit, ShotShape};
use super::state::SessionState;
use crate::{angle_between, circles_overlap};

pub const BOSS_SIZE: f32 = 262.5;
pub const BOSS_RADIUS: f32 = BOSS_SIZE / 2.0;
pub const BOSS_HEALTH: f32 = 80_000.0;
/// Largest share of max health a single hit can remove
pub const BOSS_HIT_CAP: f32 = 0.1;
pub const BOSS_THRESHOLDS: [f32; 3] = [0.75, 0.5, 0.25];

const DRIFT_SPEED: f32 = 30.0;
const INITIAL_INVINCIBLE_MS: f64 = 25_000.0;
const THRESHOLD_INVINCIBLE_MS: f64 = 10_000.0;
const DEATH_MS: f64 = 2000.0;
const FLICKER_MS: f64 = 100.0;

const SHOT_COOLDOWN_MS: f64 = 1500.0;
const SHOT_SPEED: f32 = 540.0;
const SHOT_DAMAGE: f32 = 80.0;
const BURST_SPEED: f32 = 750.0;
const BURST_DAMAGE: f32 = 120.0;
const BURST_RANGE: f32 = 120.0;
const MAX_CHARGE: f32 = 300.0;
const CONTACT_DAMAGE: f32 = 160.0;

const FLIP_COOLDOWN_MS: f64 = 8000.0;
const FLIP_MS: f64 = 100.0;
const FLIP_COUNT: u32 = 4;
const FLIP_PAUSE_MS: f64 = 1000.0;
const AURA_MS: f64 = 3000.0;
pub const AURA_RADIUS: f32 = 120.0;
const AURA_DAMAGE: f32 = 80.0;
const AURA_INTERVAL_MS: f64 = 200.0;

/// Outcome of a hit that got through
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossHit {
    /// Health actually removed
    pub applied: f32,
    /// Threshold crossed by this hit
    pub threshold: Option<f32>,
    pub killed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipPhase {
    Idle,
    Flipping { flips: u32 },
    Paused,
    Aura,
}

/// Flip, pause, then damaging aura
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipAttack {
    pub phase: FlipPhase,
    since: f64,
    last_finished: Option<f64>,
    last_aura_damage: f64,
}

impl FlipAttack {
    fn new() -> Self {
        Self {
            phase: FlipPhase::Idle,
            since: 0.0,
            last_finished: None,
            last_aura_damage: 0.0,
        }
    }

    pub fn aura_active(&self) -> bool {
        self.phase == FlipPhase::Aura
    }
}

/// Death fade-out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathFade {
    started: f64,
    last_flicker: f64,
    pub visible: bool,
    /// 0 at death, 1 when the fade is over
    pub progress: f32,
}

impl DeathFade {
    pub fn scale(&self) -> f32 {
        1.0 + self.progress
    }

    pub fn opacity(&self) -> f32 {
        1.0 - self.progress
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub facing_right: bool,
    target_y: f32,
    reached_target: bool,
    spawned_at: f64,
    /// Session time the boss music began (or the intro timed out)
    pub music_started_at: Option<f64>,
    initial_invincible: bool,
    invincible_until: Option<f64>,
    thresholds_crossed: [bool; 3],
    last_shot: Option<f64>,
    pub charge: ChargeCycle,
    pub flip: FlipAttack,
    pub flame: FlameDot,
    pub death: Option<DeathFade>,
}

impl Boss {
    pub fn new(arena: Vec2, now: f64) -> Self {
        Self {
            pos: Vec2::new(arena.x / 2.0, -BOSS_RADIUS),
            radius: BOSS_RADIUS,
            health: BOSS_HEALTH,
            max_health: BOSS_HEALTH,
            facing_right: false,
            target_y: arena.y / 2.0,
            reached_target: false,
            spawned_at: now,
            music_started_at: None,
            initial_invincible: true,
            invincible_until: None,
            thresholds_crossed: [false; 3],
            last_shot: None,
            charge: ChargeCycle::new(now),
            flip: FlipAttack::new(),
            flame: FlameDot::default(),
            death: None,
        }
    }

    /// Boss music started playing; only the first report counts
    pub fn start_music(&mut self, now: f64) -> bool {
        if self.music_started_at.is_some() {
            return false;
        }
        self.music_started_at = Some(now);
        true
    }

    pub fn is_dying(&self) -> bool {
        self.death.is_some()
    }

    pub fn is_invincible(&self, now: f64) -> bool {
        self.initial_invincible || self.invincible_until.is_some_and(|until| now < until)
    }

    /// Initial invincibility is over, so shots and hitboxes connect
    pub fn is_exposed(&self) -> bool {
        !self.initial_invincible
    }

    /// Weapons may pick the boss as their aim point
    pub fn is_targetable(&self, now: f64) -> bool {
        !self.is_invincible(now) && !self.is_dying()
    }

    pub fn has_arrived(&self) -> bool {
        self.reached_target
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Apply a hit; `None` when it was ignored
    pub fn take_damage(&mut self, amount: f32, now: f64) -> Option<BossHit> {
        if self.is_dying() {
            return None;
        }
        if self.is_invincible(now) {
            log::debug!("Boss ignored {amount} damage while invincible");
            return None;
        }

        let cap = self.max_health * BOSS_HIT_CAP;
        let applied = amount.min(cap).min(self.health).max(0.0);
        let before = self.health / self.max_health;
        self.health -= applied;
        let after = self.health / self.max_health;
        log::debug!(
            "Boss took {applied} (of {amount}), health {}/{}",
            self.health,
            self.max_health
        );

        let mut threshold = None;
        for (i, &t) in BOSS_THRESHOLDS.iter().enumerate() {
            if before > t && after <= t && !self.thresholds_crossed[i] {
                self.thresholds_crossed[i] = true;
                self.invincible_until = Some(now + THRESHOLD_INVINCIBLE_MS);
                threshold = Some(t);
                log::info!("Boss crossed {}% health, invincible for 10s", t * 100.0);
                break;
            }
        }

        let killed = self.health <= 0.0;
        if killed {
            self.health = 0.0;
            self.death = Some(DeathFade {
                started: now,
                last_flicker: now,
                visible: true,
                progress: 0.0,
            });
            log::info!("Boss defeated");
        }
        Some(BossHit {
            applied,
            threshold,
            killed,
        })
    }

    /// Advance one tick; true once the death fade has finished
    pub fn update(&mut self, state: &mut SessionState, dt: f32) -> bool {
        let now = state.now;

        if !self.is_dying()
            && let Some(burn) = self.flame.tick(now)
            && let Some(hit) = self.take_damage(burn, now)
        {
            report_boss_hit(state, &hit, self.flame.source);
        }

        if let Some(death) = self.death.as_mut() {
            let elapsed = now - death.started;
            death.progress = (elapsed / DEATH_MS).min(1.0) as f32;
            if now - death.last_flicker >= FLICKER_MS {
                death.visible = !death.visible;
                death.last_flicker = now;
            }
            return death.opacity() <= 0.0;
        }

        let Some(music_at) = self.intro_started(now, state.config.boss_intro_timeout_ms) else {
            return false;
        };

        if self.initial_invincible && now - music_at >= INITIAL_INVINCIBLE_MS {
            self.initial_invincible = false;
            log::info!("Boss is now vulnerable and can attack");
        }
        if self.invincible_until.is_some_and(|until| now >= until) {
            self.invincible_until = None;
            log::info!("Boss temporary invincibility expired");
        }

        if !self.reached_target {
            self.pos.y += DRIFT_SPEED * state.scale * dt;
            if self.pos.y >= self.target_y {
                self.pos.y = self.target_y;
                self.reached_target = true;
            }
        }

        let player = state.player.pos;
        if !matches!(self.flip.phase, FlipPhase::Flipping { .. }) {
            self.facing_right = player.x > self.pos.x;
        }

        if self.reached_target && !self.is_invincible(now) {
            if self.last_shot.is_none_or(|t| now - t >= SHOT_COOLDOWN_MS) {
                self.fire(state, angle_between(self.pos, player), ShotShape::Aimed);
                self.last_shot = Some(now);
            }
            self.update_charge(state, dt);
            self.update_flip(state);
            if circles_overlap(self.pos, self.radius, state.player.pos, state.player.radius) {
                hurt_player(state, CONTACT_DAMAGE);
            }
        }
        false
    }

    /// Session time the entrance began, starting it on timeout
    fn intro_started(&mut self, now: f64, timeout: f64) -> Option<f64> {
        if self.music_started_at.is_none() && now - self.spawned_at >= timeout {
            log::info!("No boss music reported, starting entrance anyway");
            self.music_started_at = Some(now);
        }
        self.music_started_at
    }

    fn update_charge(&mut self, state: &mut SessionState, dt: f32) {
        let step = self.charge.update(
            &mut self.pos,
            state.player.pos,
            MAX_CHARGE * state.scale,
            &ChargeTuning::BOSS,
            state.scale * dt,
            state.now,
        );
        match step {
            ChargeStep::Burst => {
                for angle in burst_angles() {
                    self.fire(state, angle, ShotShape::Burst);
                }
            }
            ChargeStep::Busy if self.charge.phase == ChargePhase::Charging => {
                self.facing_right = self.charge.target.x >= self.pos.x;
            }
            _ => {}
        }
    }

    fn update_flip(&mut self, state: &mut SessionState) {
        let now = state.now;
        let flip = &mut self.flip;
        if flip.phase == FlipPhase::Idle
            && flip.last_finished.is_none_or(|t| now - t >= FLIP_COOLDOWN_MS)
        {
            flip.phase = FlipPhase::Flipping { flips: 0 };
            flip.since = now;
        }

        let elapsed = now - flip.since;
        match flip.phase {
            FlipPhase::Idle => {}
            FlipPhase::Flipping { flips } => {
                let due = ((elapsed / FLIP_MS).floor() as u32).min(FLIP_COUNT);
                if due > flips {
                    flip.phase = FlipPhase::Flipping { flips: due };
                    self.facing_right = !self.facing_right;
                }
                if elapsed >= FLIP_MS * FLIP_COUNT as f64 && due >= FLIP_COUNT {
                    flip.phase = FlipPhase::Paused;
                    flip.since = now;
                }
            }
            FlipPhase::Paused => {
                if elapsed >= FLIP_PAUSE_MS {
                    flip.phase = FlipPhase::Aura;
                    flip.since = now;
                    flip.last_aura_damage = now;
                }
            }
            FlipPhase::Aura => {
                if elapsed >= AURA_MS {
                    flip.phase = FlipPhase::Idle;
                    flip.last_finished = Some(now);
                } else if now - flip.last_aura_damage >= AURA_INTERVAL_MS {
                    flip.last_aura_damage = now;
                    if circles_overlap(self.pos, AURA_RADIUS, state.player.pos, state.player.radius) {
                        hurt_player(state, AURA_DAMAGE);
                    }
                }
            }
        }
    }

    fn fire(&self, state: &mut SessionState, angle: f32, shape: ShotShape) {
        let (speed, damage, limit) = match shape {
            ShotShape::Aimed => (SHOT_SPEED, SHOT_DAMAGE, ShotLimit::Unbounded),
            ShotShape::Burst => (BURST_SPEED, BURST_DAMAGE, ShotLimit::Distance(BURST_RANGE)),
        };
        let id = state.next_entity_id();
        state.enemy_projectiles.push(EnemyProjectile::new(
            id,
            self.pos,
            angle,
            speed,
            damage,
            shape,
            Tier::SuperElite,
            limit,
            state.scale,
            state.now,
        ));
    }
}

/// Run the boss for one tick; true once its death fade has finished
pub fn update_boss(state: &mut SessionState, dt: f32) -> bool {
    let Some(mut boss) = state.boss.take() else {
        return false;
    };
    let defeated = boss.update(state, dt);
    state.boss = Some(boss);
    defeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::state::GamePhase;
    use proptest::prelude::*;

    fn exposed_boss() -> Boss {
        let mut boss = Boss::new(Vec2::new(1200.0, 800.0), 0.0);
        boss.initial_invincible = false;
        boss
    }

    fn boss_state() -> SessionState {
        let mut state = SessionState::new(SimConfig::default(), PermanentStats::default(), 5);
        state.phase = GamePhase::Playing;
        state.boss = Some(Boss::new(state.arena(), 0.0));
        state.boss_spawned = true;
        state
    }

    #[test]
    fn test_hit_cap() {
        let mut boss = exposed_boss();
        let hit = boss.take_damage(50_000.0, 0.0).unwrap();
        assert_eq!(hit.applied, 8000.0);
        assert_eq!(boss.health, 72_000.0);
    }

    #[test]
    fn test_threshold_sequence() {
        // 12 hits of 8000 starting at 80000 with 10 s gaps
        let mut boss = exposed_boss();
        let mut crossed = Vec::new();
        let mut now = 0.0;
        for _ in 0..12 {
            if let Some(hit) = boss.take_damage(8000.0, now)
                && let Some(t) = hit.threshold
            {
                crossed.push(t);
            }
            now += 10_000.0;
        }
        assert_eq!(crossed, vec![0.75, 0.5, 0.25]);
        assert!(boss.is_dying());
        assert_eq!(boss.health, 0.0);
    }

    #[test]
    fn test_threshold_grants_invincibility() {
        let mut boss = exposed_boss();
        boss.health = 60_001.0;
        let hit = boss.take_damage(5.0, 1000.0).unwrap();
        assert_eq!(hit.threshold, Some(0.75));
        assert!(boss.take_damage(5.0, 10_999.0).is_none());
        assert!(boss.take_damage(5.0, 11_000.0).is_some());
    }

    #[test]
    fn test_initial_invincibility_blocks_damage() {
        let mut boss = Boss::new(Vec2::new(1200.0, 800.0), 0.0);
        assert!(boss.take_damage(100.0, 0.0).is_none());
        assert_eq!(boss.health, BOSS_HEALTH);
        assert!(!boss.is_targetable(0.0));
    }

    #[test]
    fn test_dying_ignores_damage() {
        let mut boss = exposed_boss();
        boss.health = 10.0;
        assert!(boss.take_damage(10.0, 0.0).unwrap().killed);
        assert!(boss.take_damage(10.0, 1.0).is_none());
    }

    #[test]
    fn test_waits_for_music_then_drifts() {
        let mut state = boss_state();
        state.now = 1000.0;
        update_boss(&mut state, 0.1);
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.pos.y, -BOSS_RADIUS);

        state.boss.as_mut().unwrap().start_music(1000.0);
        update_boss(&mut state, 0.1);
        let boss = state.boss.as_ref().unwrap();
        assert!((boss.pos.y - (-BOSS_RADIUS + 3.0)).abs() < 1e-3);
    }

    #[test]
    fn test_intro_timeout_starts_entrance() {
        let mut state = boss_state();
        state.now = state.config.boss_intro_timeout_ms;
        update_boss(&mut state, 0.1);
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.music_started_at, Some(state.config.boss_intro_timeout_ms));
        assert!(boss.pos.y > -BOSS_RADIUS);
    }

    #[test]
    fn test_vulnerable_after_music_window() {
        let mut state = boss_state();
        state.boss.as_mut().unwrap().start_music(0.0);
        state.now = 24_999.0;
        update_boss(&mut state, 0.0);
        assert!(!state.boss.as_ref().unwrap().is_exposed());
        state.now = 25_000.0;
        update_boss(&mut state, 0.0);
        assert!(state.boss.as_ref().unwrap().is_exposed());
    }

    #[test]
    fn test_no_attacks_before_arrival() {
        let mut state = boss_state();
        let boss = state.boss.as_mut().unwrap();
        boss.start_music(0.0);
        boss.initial_invincible = false;
        state.player.pos = Vec2::new(100.0, 100.0);
        state.now = 100.0;
        update_boss(&mut state, 0.016);
        assert!(state.enemy_projectiles.is_empty());

        let boss = state.boss.as_mut().unwrap();
        boss.pos.y = boss.target_y;
        boss.reached_target = true;
        state.now = 200.0;
        update_boss(&mut state, 0.016);
        assert_eq!(state.enemy_projectiles.len(), 1);
        assert_eq!(state.enemy_projectiles[0].limit, ShotLimit::Unbounded);
    }

    #[test]
    fn test_death_fade_completes_once_after_two_seconds() {
        let mut state = boss_state();
        let boss = state.boss.as_mut().unwrap();
        boss.initial_invincible = false;
        boss.health = 1.0;
        boss.take_damage(1.0, 0.0);
        state.now = 1000.0;
        assert!(!update_boss(&mut state, 0.016));
        let fade = state.boss.as_ref().unwrap().death.unwrap();
        assert!((fade.scale() - 1.5).abs() < 1e-5);
        state.now = 2000.0;
        assert!(update_boss(&mut state, 0.016));
    }

    #[test]
    fn test_flip_sequence_then_aura() {
        let mut state = boss_state();
        let boss = state.boss.as_mut().unwrap();
        boss.start_music(0.0);
        boss.initial_invincible = false;
        boss.reached_target = true;
        boss.pos = Vec2::new(600.0, 400.0);
        // keep the player clear of the body
        state.player.pos = Vec2::new(100.0, 100.0);

        let mut now = 0.0;
        let mut saw_aura = false;
        while now < 2000.0 {
            state.now = now;
            update_boss(&mut state, 0.0);
            if state.boss.as_ref().unwrap().flip.aura_active() {
                saw_aura = true;
                break;
            }
            now += 10.0;
        }
        assert!(saw_aura);
        // 4 flips (400 ms) + 1000 ms pause
        assert!((1400.0..1420.0).contains(&now), "aura at {now}");
    }

    proptest! {
        #[test]
        fn test_hit_never_exceeds_cap(hits in prop::collection::vec(0.0f32..100_000.0, 1..30)) {
            let mut boss = exposed_boss();
            let mut now = 0.0;
            for amount in hits {
                let before = boss.health;
                if let Some(hit) = boss.take_damage(amount, now) {
                    prop_assert!(hit.applied <= BOSS_HEALTH * BOSS_HIT_CAP);
                    prop_assert!((before - boss.health - hit.applied).abs() < 1e-2);
                }
                prop_assert!(boss.health >= 0.0);
                now += 20_000.0;
            }
        }
    }
}
