//! Experience orbs: drift, clumping, merging and pickup

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::progression::check_level_up;
use super::state::SessionState;
use crate::seek;

const BASE_RADIUS: f32 = 16.0;
const ATTRACTION_RANGE: f32 = 25.0;
const ATTRACTION_SPEED: f32 = 600.0;
const CLUMP_RANGE: f32 = 128.0;
const CLUMP_SPEED: f32 = 120.0;
const DRIFT_SPEED: f32 = 12.0;
/// Orbs this close to the player never merge
const MERGE_PLAYER_CLEARANCE: f32 = 5.0;
const MERGE_DISTANCE: f32 = 64.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceOrb {
    pub id: u32,
    pub pos: Vec2,
    pub value: u32,
    pub radius: f32,
    /// Being pulled in by the player
    pub attracting: bool,
    collected: bool,
}

impl ExperienceOrb {
    pub fn new(id: u32, pos: Vec2, value: u32, scale: f32) -> Self {
        Self {
            id,
            pos,
            value,
            radius: BASE_RADIUS * scale,
            attracting: false,
            collected: false,
        }
    }

    /// Radius grows 1% per point of value
    pub fn pickup_radius(&self) -> f32 {
        self.radius * (1.0 + self.value as f32 * 0.01)
    }

    /// Brighter with value
    pub fn opacity(&self) -> f32 {
        (0.1 + (self.value as f32 - 1.0) * (0.9 / 99.0)).clamp(0.1, 1.0)
    }
}

/// Move every orb, collect those touching the player, then merge clumps
pub fn update_orbs(state: &mut SessionState, dt: f32) {
    let mut orbs = std::mem::take(&mut state.orbs);
    let player = state.player.pos;
    let reach = state.player.radius;
    let scale = state.scale;

    for i in 0..orbs.len() {
        if orbs[i].collected {
            continue;
        }
        let here = orbs[i].pos;
        let to_player = here.distance(player);
        let attracting = to_player < ATTRACTION_RANGE * scale;

        let (target, speed) = if attracting {
            (player, ATTRACTION_SPEED)
        } else {
            let nearest = orbs
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && !other.collected)
                .map(|(_, other)| (other.pos, here.distance(other.pos)))
                .filter(|&(_, d)| d < CLUMP_RANGE * scale)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match nearest {
                Some((pos, _)) => (pos, CLUMP_SPEED),
                None => (player, DRIFT_SPEED),
            }
        };

        let orb = &mut orbs[i];
        orb.attracting = attracting;
        seek(&mut orb.pos, target, speed * scale * dt);

        if to_player < orb.pickup_radius() + reach {
            orb.collected = true;
            state.xp += orb.value;
            check_level_up(state);
        }
    }

    merge_orbs(&mut orbs, player);
    orbs.retain(|orb| !orb.collected);
    orbs.append(&mut state.orbs);
    state.orbs = orbs;
}

/// Fold nearby orbs together, value-weighted, at most once per orb
fn merge_orbs(orbs: &mut [ExperienceOrb], player: Vec2) {
    let clear_of_player = |orb: &ExperienceOrb| orb.pos.distance(player) > MERGE_PLAYER_CLEARANCE;
    for i in (0..orbs.len()).rev() {
        if orbs[i].collected || !clear_of_player(&orbs[i]) {
            continue;
        }
        for j in (0..i).rev() {
            let other = &orbs[j];
            if other.collected || !clear_of_player(other) {
                continue;
            }
            if orbs[i].pos.distance(other.pos) >= MERGE_DISTANCE {
                continue;
            }
            let (a, b) = (orbs[i].value as f32, other.value as f32);
            let total = a + b;
            let merged_pos = if total > 0.0 {
                (orbs[i].pos * a + other.pos * b) / total
            } else {
                orbs[i].pos
            };
            let other_value = other.value;
            orbs[j].collected = true;
            orbs[i].value += other_value;
            orbs[i].pos = merged_pos;
            break;
        }
    }
}
