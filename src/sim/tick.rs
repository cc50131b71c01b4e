//! Per-frame simulation step
//!
//! The host calls [`tick`] once per animation frame with its wall-clock time.
//! Session time comes from the pause-aware clock, so a frame that arrives
//! while the tab is hidden or the upgrade prompt is open does nothing.

use serde::{Deserialize, Serialize};

use super::boss::{Boss, update_boss};
use super::enemy::update_enemies;
use super::events::GameEvent;
use super::hazard::{update_auras, update_pools, update_strikes};
use super::orb::update_orbs;
use super::projectile::{update_enemy_projectiles, update_projectiles};
use super::schedule::run_due_events;
use super::session;
use super::spawn::spawn_enemies;
use super::state::{GamePhase, SessionState};
use super::weapon::fire_weapons;
use crate::audio::MusicTrack;
use crate::consts::*;

/// Held movement keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Advance the session to wall-clock time `now_wall` (ms)
pub fn tick(state: &mut SessionState, input: &TickInput, now_wall: f64) {
    state.wall_now = now_wall;
    if state.phase != GamePhase::Playing || state.clock.is_paused() {
        return;
    }

    let sim = state.clock.sim_time(now_wall);
    let dt = state.clock.frame_dt(sim, state.config.max_frame_dt);
    state.now = sim;

    run_due_events(state);
    if !playing(state) {
        return;
    }

    state.game_time = state.clock.game_seconds(now_wall);
    if !state.endless && !state.boss_spawned && state.game_time >= BOSS_SPAWN_SECS {
        spawn_boss(state);
    }

    let (scale, arena, now) = (state.scale, state.arena(), state.now);
    state.player.update(input, dt, scale, arena, now);

    if update_boss(state, dt) {
        session::player_wins(state);
    }

    let stages: [fn(&mut SessionState, f32); 10] = [
        update_orbs,
        |state, _| update_pools(state),
        spawn_enemies,
        update_enemies,
        |state, _| fire_weapons(state),
        update_projectiles,
        update_enemy_projectiles,
        |state, _| update_strikes(state),
        |state, _| update_auras(state),
        |state, _| state.normalize_order(),
    ];
    for stage in stages {
        if !playing(state) {
            return;
        }
        stage(state, dt);
    }
}

fn playing(state: &SessionState) -> bool {
    state.phase == GamePhase::Playing
}

fn spawn_boss(state: &mut SessionState) {
    log::info!(
        "Boss arrives at {}s (level {}, {} enemies cleared)",
        state.game_time,
        state.level,
        state.enemies.len()
    );
    state.boss_spawned = true;
    state.enemies.clear();
    state.boss = Some(Boss::new(state.arena(), state.now));
    state.emit(GameEvent::Music(MusicTrack::BossSpoken));
}
