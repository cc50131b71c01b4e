//! Session state and core simulation types
//!
//! Everything a running session owns lives in [`SessionState`], so two states
//! built from the same seed and fed the same inputs stay identical.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::enemy::Enemy;
use super::events::GameEvent;
use super::hazard::{CollarAura, DamagePool, Strike};
use super::orb::ExperienceOrb;
use super::progression::UpgradeId;
use super::projectile::{EnemyProjectile, Projectile};
use super::scaling::{Bonuses, Difficulty};
use super::schedule::EventQueue;
use super::tick::TickInput;
use super::weapon::{Weapon, WeaponKind};
use crate::config::SimConfig;
use crate::consts::*;
use crate::persistence::PermanentStats;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Level-up prompt open; the session clock is held
    ChoosingUpgrade,
    /// Player died
    GameOver,
    /// Boss defeated; endless mode may follow
    Won,
}

/// Difficulty chosen at the start screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    Normal,
    Hard,
}

/// Seeded RNG owned by the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    rng: Pcg32,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform in `[0, 1)`
    pub fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform integer in `[0, n)`
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.rng.random_range(0..n) }
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Run upgrade levels, reset every session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    /// Incoming damage -10% per level
    pub armor: u32,
    /// Cooldowns x0.9 per level
    pub haste: u32,
    /// Times every owned weapon was empowered
    pub power: u32,
    /// More, tougher, richer enemies
    pub frenzy: u32,
    /// +10 max HP per level
    pub vitality: u32,
}

/// Options the player asked to take automatically whenever the draw is
/// exactly {vitality, power}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSelect {
    pub vitality: bool,
    pub power: bool,
}

/// Session clock
///
/// Converts host wall-clock milliseconds into session milliseconds with every
/// pause (hidden tab, open upgrade prompt) cut out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionClock {
    started_at: f64,
    paused_total: f64,
    paused_since: Option<f64>,
    hidden: bool,
    choosing: bool,
    last_sim: Option<f64>,
}

impl SessionClock {
    pub fn start(now: f64) -> Self {
        Self {
            started_at: now,
            ..Default::default()
        }
    }

    /// Milliseconds of unpaused session time at wall-clock `now`
    pub fn sim_time(&self, now: f64) -> f64 {
        let open = self.paused_since.map_or(0.0, |since| (now - since).max(0.0));
        (now - self.started_at - self.paused_total - open).max(0.0)
    }

    /// Whole seconds of unpaused session time
    pub fn game_seconds(&self, now: f64) -> u32 {
        (self.sim_time(now) / 1000.0).floor() as u32
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn paused_total(&self) -> f64 {
        self.paused_total
    }

    pub fn set_hidden(&mut self, hidden: bool, now: f64) {
        self.hidden = hidden;
        self.sync(now);
    }

    pub fn set_choosing(&mut self, choosing: bool, now: f64) {
        self.choosing = choosing;
        self.sync(now);
    }

    /// Movement step for a frame at session time `sim`; 0 on the first frame
    pub fn frame_dt(&mut self, sim: f64, max_dt: f32) -> f32 {
        let dt = match self.last_sim {
            Some(last) => ((sim - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_sim = Some(sim);
        dt.min(max_dt)
    }

    fn sync(&mut self, now: f64) {
        let should_pause = self.hidden || self.choosing;
        match (should_pause, self.paused_since) {
            (true, None) => self.paused_since = Some(now),
            (false, Some(since)) => {
                self.paused_total += (now - since).max(0.0);
                self.paused_since = None;
            }
            _ => {}
        }
    }
}

/// Sprite direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Front,
    Back,
    Left,
    Right,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    /// Nominal units per second
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Session time of the last hit taken
    pub last_damage: Option<f64>,
    pub facing: Facing,
    pub moving: bool,
    /// Walk cycle frame (0 or 1)
    pub anim_frame: u8,
    anim_timer: f64,
}

impl Player {
    pub const BASE_RADIUS: f32 = 60.0;
    pub const BASE_SPEED: f32 = 270.0;
    pub const BASE_HEALTH: f32 = 100.0;
    pub const HEALTH_PER_VITALITY: f32 = 10.0;
    pub const INVULNERABLE_MS: f64 = 1000.0;
    const ANIM_FRAME_MS: f64 = 200.0;
    const DIAGONAL: f32 = 0.707;

    pub fn new(pos: Vec2, scale: f32, bonuses: &Bonuses, vitality: u32) -> Self {
        let max_health =
            (Self::BASE_HEALTH * bonuses.hp).floor() + vitality as f32 * Self::HEALTH_PER_VITALITY;
        Self {
            pos,
            radius: Self::BASE_RADIUS * scale,
            speed: Self::BASE_SPEED * bonuses.speed,
            health: max_health,
            max_health,
            last_damage: None,
            facing: Facing::Front,
            moving: false,
            anim_frame: 0,
            anim_timer: 0.0,
        }
    }

    /// Move from input and keep inside the arena
    pub fn update(&mut self, input: &TickInput, dt: f32, scale: f32, arena: Vec2, now: f64) {
        let mut dir = Vec2::ZERO;
        if input.up {
            dir.y -= 1.0;
        }
        if input.down {
            dir.y += 1.0;
        }
        if input.left {
            dir.x -= 1.0;
        }
        if input.right {
            dir.x += 1.0;
        }
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= Self::DIAGONAL;
        }

        self.moving = dir != Vec2::ZERO;
        if self.moving {
            self.facing = if dir.y.abs() > dir.x.abs() {
                if dir.y < 0.0 { Facing::Back } else { Facing::Front }
            } else if dir.x < 0.0 {
                Facing::Left
            } else {
                Facing::Right
            };
        }

        self.pos += dir * self.speed * scale * dt;
        let r = Self::BASE_RADIUS * scale;
        self.pos = self.pos.clamp(Vec2::splat(r), (arena - Vec2::splat(r)).max(Vec2::splat(r)));

        if self.moving {
            if now - self.anim_timer > Self::ANIM_FRAME_MS {
                self.anim_frame = (self.anim_frame + 1) % 2;
                self.anim_timer = now;
            }
        } else {
            self.anim_frame = 0;
            self.anim_timer = now;
        }
    }

    /// Apply a hit; returns the damage taken, or `None` while invulnerable
    pub fn take_damage(&mut self, amount: f32, armor: u32, now: f64) -> Option<f32> {
        if let Some(last) = self.last_damage
            && now - last < Self::INVULNERABLE_MS
        {
            return None;
        }
        // tenths keep 30% off exact
        let kept = 10 - armor.min(10);
        let taken = (amount * kept as f32 / 10.0).floor().max(1.0);
        self.health = (self.health - taken).max(0.0);
        self.last_damage = Some(now);
        Some(taken)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub config: SimConfig,
    /// Arena scale factor derived from `config`
    pub scale: f32,
    pub rng: RngState,
    pub phase: GamePhase,
    pub hard_mode: bool,
    pub endless: bool,
    /// Endless difficulty level, recomputed from game time
    pub endless_level: u32,
    /// Permanent progression as of the last save
    pub progress: PermanentStats,
    /// Permanent bonuses in effect for this session
    pub bonuses: Bonuses,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub boss_spawned: bool,
    pub projectiles: Vec<Projectile>,
    pub enemy_projectiles: Vec<EnemyProjectile>,
    pub strikes: Vec<Strike>,
    pub auras: Vec<CollarAura>,
    pub pools: Vec<DamagePool>,
    pub orbs: Vec<ExperienceOrb>,
    pub weapons: Vec<Weapon>,
    pub upgrades: Upgrades,
    pub auto_select: AutoSelect,
    pub level: u32,
    /// Level at the start of this stretch of play (levels above it are banked)
    pub start_level: u32,
    pub xp: u32,
    pub xp_needed: u32,
    pub score: u64,
    pub rerolls: f32,
    /// Options on offer while choosing
    pub pending_choice: Vec<UpgradeId>,
    pub clock: SessionClock,
    /// Session time of the last processed tick (ms)
    pub now: f64,
    /// Host wall-clock time of the last tick or command (ms)
    pub wall_now: f64,
    /// Whole seconds of game time
    pub game_time: u32,
    pub schedule: EventQueue,
    /// Outbound notifications, drained by the host
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl SessionState {
    /// Fresh session sitting at the start screen
    pub fn new(config: SimConfig, progress: PermanentStats, seed: u64) -> Self {
        let scale = config.scale();
        let bonuses = Bonuses::new(progress.total_levels_gained, false);
        let center = Vec2::new(config.arena_width, config.arena_height) / 2.0;
        let mut state = Self {
            scale,
            rng: RngState::new(seed),
            phase: GamePhase::Menu,
            hard_mode: false,
            endless: false,
            endless_level: 0,
            bonuses,
            player: Player::new(center, scale, &bonuses, 0),
            enemies: Vec::new(),
            boss: None,
            boss_spawned: false,
            projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            strikes: Vec::new(),
            auras: Vec::new(),
            pools: Vec::new(),
            orbs: Vec::new(),
            weapons: Vec::new(),
            upgrades: Upgrades::default(),
            auto_select: AutoSelect::default(),
            level: 1,
            start_level: 1,
            xp: 0,
            xp_needed: BASE_XP_NEEDED,
            score: 0,
            rerolls: 0.0,
            pending_choice: Vec::new(),
            clock: SessionClock::default(),
            now: 0.0,
            wall_now: 0.0,
            game_time: 0,
            schedule: EventQueue::default(),
            events: Vec::new(),
            next_id: 1,
            progress,
            config,
        };
        state.reset_run(0.0);
        state
    }

    /// Clear everything a run owns; keeps mode flags, progress and RNG
    pub fn reset_run(&mut self, now: f64) {
        self.bonuses = Bonuses::new(self.progress.total_levels_gained, self.hard_mode);
        self.upgrades = Upgrades::default();
        self.player = Player::new(self.center(), self.scale, &self.bonuses, 0);
        self.enemies.clear();
        self.boss = None;
        self.boss_spawned = false;
        self.projectiles.clear();
        self.enemy_projectiles.clear();
        self.strikes.clear();
        self.auras.clear();
        self.pools.clear();
        self.orbs.clear();
        self.weapons.clear();
        self.level = 1;
        self.start_level = 1;
        self.xp = 0;
        self.xp_needed = if self.hard_mode { HARD_BASE_XP_NEEDED } else { BASE_XP_NEEDED };
        self.score = 0;
        self.endless = false;
        self.endless_level = 0;
        self.rerolls =
            BASE_REROLLS + self.progress.total_levels_gained as f32 * REROLLS_PER_PERMANENT_LEVEL;
        self.pending_choice.clear();
        self.schedule.clear();
        self.clock = SessionClock::start(now);
        self.now = 0.0;
        self.wall_now = now;
        self.game_time = 0;

        let weapon = Weapon::new(self.next_entity_id(), WeaponKind::Plug, &self.bonuses, 0.0);
        self.weapons.push(weapon);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.enemy_projectiles.sort_by_key(|p| p.id);
        self.strikes.sort_by_key(|s| s.id);
        self.auras.sort_by_key(|a| a.id);
        self.pools.sort_by_key(|p| p.id);
        self.orbs.sort_by_key(|o| o.id);
    }

    pub fn arena(&self) -> Vec2 {
        Vec2::new(self.config.arena_width, self.config.arena_height)
    }

    pub fn center(&self) -> Vec2 {
        self.arena() / 2.0
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty {
            frenzy: self.upgrades.frenzy,
            hard: self.hard_mode,
            endless_level: if self.endless { self.endless_level } else { 0 },
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::ChoosingUpgrade)
    }

    pub fn weapon(&self, id: u32) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn weapon_mut(&mut self, id: u32) -> Option<&mut Weapon> {
        self.weapons.iter_mut().find(|w| w.id == id)
    }

    pub fn owns(&self, kind: WeaponKind) -> bool {
        self.weapons.iter().any(|w| w.kind == kind)
    }

    /// Credit damage dealt to the weapon that caused it
    pub fn credit(&mut self, weapon: u32, damage: f32) {
        if let Some(w) = self.weapon_mut(weapon) {
            w.total_damage += damage as f64;
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
