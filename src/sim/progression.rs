//! Levelling, upgrade offers and their effects

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::schedule::ScheduledEvent;
use super::state::{GamePhase, Player, SessionState};
use super::weapon::{Weapon, WeaponKind, upgrade_weapon};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Delay before looking for another pending level-up after a pick (ms)
pub const LEVEL_RECHECK_MS: f64 = 100.0;
/// Weapon upgrades appear this many times in the draw pool
const WEAPON_UPGRADE_WEIGHT: usize = 3;

/// One upgrade option; equal ids are the same option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    NewWeapon(WeaponKind),
    UpgradeWeapon(WeaponKind),
    Power,
    Haste,
    Armor,
    Frenzy,
    Vitality,
}

impl UpgradeId {
    pub fn label(&self) -> String {
        match self {
            UpgradeId::NewWeapon(kind) => kind.name().to_string(),
            UpgradeId::UpgradeWeapon(kind) => format!("{} +1", kind.name()),
            UpgradeId::Power => "Power".to_string(),
            UpgradeId::Haste => "Haste".to_string(),
            UpgradeId::Armor => "Armor".to_string(),
            UpgradeId::Frenzy => "Frenzy".to_string(),
            UpgradeId::Vitality => "Vitality".to_string(),
        }
    }
}

/// Draw up to three distinct options
pub fn generate_options(state: &mut SessionState) -> Vec<UpgradeId> {
    let mut pool = Vec::new();
    let mut weapon_upgrades = Vec::new();
    for kind in WeaponKind::ALL {
        match state.weapons.iter().find(|w| w.kind == kind) {
            None => pool.push(UpgradeId::NewWeapon(kind)),
            Some(w) if w.level < MAX_WEAPON_LEVEL => {
                weapon_upgrades.push(UpgradeId::UpgradeWeapon(kind))
            }
            Some(_) => {}
        }
    }
    for _ in 0..WEAPON_UPGRADE_WEIGHT {
        pool.extend_from_slice(&weapon_upgrades);
    }

    let upgrades = state.upgrades;
    pool.push(UpgradeId::Power);
    if upgrades.haste < MAX_HASTE_LEVEL {
        pool.push(UpgradeId::Haste);
    }
    if upgrades.armor < MAX_ARMOR_LEVEL {
        pool.push(UpgradeId::Armor);
    }
    if upgrades.frenzy < MAX_FRENZY_LEVEL {
        pool.push(UpgradeId::Frenzy);
    }
    pool.push(UpgradeId::Vitality);

    state.rng.shuffle(&mut pool);
    let mut chosen: Vec<UpgradeId> = Vec::with_capacity(UPGRADE_CHOICES);
    for id in pool {
        if chosen.len() >= UPGRADE_CHOICES {
            break;
        }
        if !chosen.contains(&id) {
            chosen.push(id);
        }
    }
    chosen
}

/// Apply an option's effect
pub fn apply_upgrade(state: &mut SessionState, id: UpgradeId) {
    log::debug!("Applying upgrade {}", id.label());
    match id {
        UpgradeId::NewWeapon(kind) => {
            if !state.owns(kind) {
                let weapon_id = state.next_entity_id();
                let weapon = Weapon::new(weapon_id, kind, &state.bonuses, state.now);
                state.weapons.push(weapon);
            }
        }
        UpgradeId::UpgradeWeapon(kind) => {
            upgrade_weapon(state, kind);
        }
        UpgradeId::Power => {
            state.upgrades.power += 1;
            for weapon in state.weapons.iter_mut() {
                weapon.damage = (weapon.damage * 1.2).floor();
            }
        }
        UpgradeId::Haste => {
            state.upgrades.haste = (state.upgrades.haste + 1).min(MAX_HASTE_LEVEL);
        }
        UpgradeId::Armor => {
            state.upgrades.armor = (state.upgrades.armor + 1).min(MAX_ARMOR_LEVEL);
        }
        UpgradeId::Frenzy => {
            state.upgrades.frenzy = (state.upgrades.frenzy + 1).min(MAX_FRENZY_LEVEL);
        }
        UpgradeId::Vitality => {
            state.upgrades.vitality += 1;
            state.player.max_health += Player::HEALTH_PER_VITALITY;
            state.player.health += Player::HEALTH_PER_VITALITY;
        }
    }
}

/// Process pending level-ups
///
/// Hard mode applies a random option per level and keeps going; normal mode
/// stops at the first level and opens the prompt. Nothing happens while a
/// prompt is already open.
pub fn check_level_up(state: &mut SessionState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    while state.xp >= state.xp_needed {
        state.level += 1;
        state.xp -= state.xp_needed;
        let growth = if state.hard_mode { 1.2 } else { 1.1 };
        state.xp_needed = (state.xp_needed as f64 * growth).floor() as u32;
        state.emit(GameEvent::Sound(SoundEffect::LevelUp));
        log::debug!("Level up to {} (next at {})", state.level, state.xp_needed);

        if state.hard_mode {
            let options = generate_options(state);
            if !options.is_empty() {
                let pick = options[state.rng.below(options.len() as u32) as usize];
                apply_upgrade(state, pick);
                continue;
            }
        }

        offer_upgrades(state);
        break;
    }
}

/// Draw options and either prompt or take the auto-selected one
pub fn offer_upgrades(state: &mut SessionState) {
    let options = generate_options(state);
    if let Some(pick) = auto_pick(state, &options) {
        log::debug!("Auto-selecting {}", pick.label());
        resume_play(state);
        apply_upgrade(state, pick);
        schedule_recheck(state);
        return;
    }

    if state.phase != GamePhase::ChoosingUpgrade {
        state.phase = GamePhase::ChoosingUpgrade;
        let wall = state.wall_now;
        state.clock.set_choosing(true, wall);
    }
    state.pending_choice = options.clone();
    state.emit(GameEvent::UpgradeOffered(options));
}

/// The option to take without prompting, when the draw is exactly
/// {vitality, power} and a matching flag is set (vitality first)
fn auto_pick(state: &SessionState, options: &[UpgradeId]) -> Option<UpgradeId> {
    let only_pair = options.len() == 2
        && options.contains(&UpgradeId::Vitality)
        && options.contains(&UpgradeId::Power);
    if !only_pair {
        return None;
    }
    if state.auto_select.vitality {
        Some(UpgradeId::Vitality)
    } else if state.auto_select.power {
        Some(UpgradeId::Power)
    } else {
        None
    }
}

/// Close the prompt and restart the clock
pub fn resume_play(state: &mut SessionState) {
    if state.phase == GamePhase::ChoosingUpgrade {
        state.phase = GamePhase::Playing;
        let wall = state.wall_now;
        state.clock.set_choosing(false, wall);
    }
    state.pending_choice.clear();
}

pub fn schedule_recheck(state: &mut SessionState) {
    let deadline = state.clock.sim_time(state.wall_now) + LEVEL_RECHECK_MS;
    state.schedule.schedule(deadline, ScheduledEvent::LevelCheck);
}
