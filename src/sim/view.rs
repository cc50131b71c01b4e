//! Read-only snapshot of a session for drawing and HUDs

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemyKind, Tier};
use super::progression::UpgradeId;
use super::projectile::ProjectileKind;
use super::state::{Facing, GamePhase, SessionState};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ViewKind {
    Player { facing: Facing, frame: u8 },
    Enemy { kind: EnemyKind, tier: Tier },
    Boss,
    Plug,
    Flame,
    EnemyShot,
    Strike,
    Aura,
    Pool,
    Orb,
}

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: ViewKind,
    pub pos: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub facing_right: bool,
    pub opacity: f32,
    /// `None` for things without health
    pub health_fraction: Option<f32>,
}

impl EntityView {
    fn new(id: u32, kind: ViewKind, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            radius,
            rotation: 0.0,
            facing_right: true,
            opacity: 1.0,
            health_fraction: None,
        }
    }

    fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    fn faded(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub phase: GamePhase,
    pub hard_mode: bool,
    pub endless: bool,
    pub level: u32,
    pub xp: u32,
    pub xp_needed: u32,
    pub score: u64,
    pub game_time: u32,
    /// Seconds until the boss arrives, while it is still coming
    pub countdown: Option<u32>,
    pub rerolls: f32,
    pub choices: Vec<UpgradeId>,
    /// Drawing order, bottom first
    pub entities: Vec<EntityView>,
}

impl SessionView {
    pub fn capture(state: &SessionState) -> Self {
        let countdown = (!state.endless && !state.boss_spawned)
            .then(|| BOSS_SPAWN_SECS.saturating_sub(state.game_time));
        Self {
            phase: state.phase,
            hard_mode: state.hard_mode,
            endless: state.endless,
            level: state.level,
            xp: state.xp,
            xp_needed: state.xp_needed,
            score: state.score,
            game_time: state.game_time,
            countdown,
            rerolls: state.rerolls,
            choices: state.pending_choice.clone(),
            entities: entities(state),
        }
    }

    pub fn count(&self, matches: impl Fn(&ViewKind) -> bool) -> usize {
        self.entities.iter().filter(|e| matches(&e.kind)).count()
    }
}

fn entities(state: &SessionState) -> Vec<EntityView> {
    let scale = state.scale;
    let now = state.now;
    let mut out = Vec::new();

    for pool in &state.pools {
        out.push(
            EntityView::new(pool.id, ViewKind::Pool, pool.pos, pool.radius)
                .rotated(pool.rotation)
                .faded(pool.life_fraction(now)),
        );
    }
    for orb in &state.orbs {
        out.push(EntityView::new(orb.id, ViewKind::Orb, orb.pos, orb.radius).faded(orb.opacity()));
    }
    for aura in &state.auras {
        out.push(
            EntityView::new(aura.id, ViewKind::Aura, state.player.pos, aura.size / 2.0 * scale)
                .rotated(aura.rotation),
        );
    }

    let player = &state.player;
    let mut view = EntityView::new(
        0,
        ViewKind::Player {
            facing: player.facing,
            frame: player.anim_frame,
        },
        player.pos,
        player.radius,
    );
    view.facing_right = player.facing != Facing::Left;
    view.health_fraction = Some(player.health / player.max_health);
    out.push(view);

    for enemy in &state.enemies {
        let mut view = EntityView::new(
            enemy.id,
            ViewKind::Enemy {
                kind: enemy.kind,
                tier: enemy.tier,
            },
            enemy.pos,
            enemy.radius * enemy.pulse_scale(),
        );
        view.facing_right = enemy.facing_right;
        view.health_fraction = Some(enemy.health / enemy.max_health);
        out.push(view);
    }

    if let Some(boss) = &state.boss {
        let (grow, opacity) = boss
            .death
            .as_ref()
            .map_or((1.0, 1.0), |fade| (fade.scale(), fade.opacity()));
        let mut view = EntityView::new(0, ViewKind::Boss, boss.pos, boss.radius * grow).faded(opacity);
        view.facing_right = boss.facing_right;
        view.health_fraction = Some(boss.health_fraction());
        out.push(view);
    }

    for strike in &state.strikes {
        let pos = strike.position(player.pos, scale);
        out.push(
            EntityView::new(strike.id, ViewKind::Strike, pos, strike.size / 2.0 * scale)
                .faded(strike.life_fraction(now)),
        );
    }
    for shot in &state.projectiles {
        let kind = match shot.kind {
            ProjectileKind::Plug { .. } => ViewKind::Plug,
            ProjectileKind::Flame { .. } => ViewKind::Flame,
        };
        out.push(
            EntityView::new(shot.id, kind, shot.pos, shot.radius(scale))
                .rotated(shot.angle)
                .faded(shot.opacity),
        );
    }
    for shot in &state.enemy_projectiles {
        out.push(EntityView::new(shot.id, ViewKind::EnemyShot, shot.pos, shot.radius).rotated(shot.angle));
    }
    out
}
