//! Damage resolution shared by every weapon and enemy

use glam::Vec2;

use super::boss::BossHit;
use super::events::GameEvent;
use super::orb::ExperienceOrb;
use super::scaling::orb_value;
use super::session;
use super::state::SessionState;
use crate::audio::SoundEffect;

/// Damage the enemy at `index`, removing it and dropping its orb on a kill
pub fn strike_enemy(state: &mut SessionState, index: usize, damage: f32, weapon: u32) -> bool {
    let Some(enemy) = state.enemies.get_mut(index) else {
        return false;
    };
    let killed = enemy.take_damage(damage);
    let (pos, xp) = (enemy.pos, enemy.xp);
    state.credit(weapon, damage);
    if killed {
        state.enemies.remove(index);
        drop_orb(state, pos, xp);
    }
    killed
}

/// Damage the boss on behalf of `weapon`; false when the hit was ignored
pub fn damage_boss(state: &mut SessionState, damage: f32, weapon: u32) -> bool {
    let now = state.now;
    let Some(hit) = state.boss.as_mut().and_then(|boss| boss.take_damage(damage, now)) else {
        return false;
    };
    report_boss_hit(state, &hit, Some(weapon));
    true
}

/// Credit a landed boss hit and announce the kill
pub fn report_boss_hit(state: &mut SessionState, hit: &BossHit, weapon: Option<u32>) {
    if let Some(weapon) = weapon {
        state.credit(weapon, hit.applied);
    }
    if hit.killed {
        state.emit(GameEvent::Sound(SoundEffect::BossDeath));
        state.emit(GameEvent::MusicStop);
    }
}

/// Drop an experience orb worth `xp` and score the kill
pub fn drop_orb(state: &mut SessionState, pos: Vec2, xp: u32) {
    let value = orb_value(xp, state.upgrades.frenzy, state.hard_mode, &state.bonuses);
    let multiplier = if state.hard_mode { 2 } else { 1 };
    state.score += xp as u64 * multiplier;
    let id = state.next_entity_id();
    state.orbs.push(ExperienceOrb::new(id, pos, value, state.scale));
}

/// Hit the player; ends the session when health runs out
pub fn hurt_player(state: &mut SessionState, amount: f32) {
    if !state.is_running() {
        return;
    }
    let armor = state.upgrades.armor;
    if state.player.take_damage(amount, armor, state.now).is_none() {
        return;
    }
    state.emit(GameEvent::Sound(SoundEffect::PlayerDamage));
    if state.player.is_dead() {
        session::game_over(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::boss::Boss;
    use crate::sim::enemy::{Enemy, EnemyKind, Tier};
    use crate::sim::scaling::Difficulty;
    use crate::sim::state::GamePhase;

    fn playing_state() -> SessionState {
        let mut state = SessionState::new(SimConfig::default(), PermanentStats::default(), 2);
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_kill_drops_orb_and_scores() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        let enemy = Enemy::spawn(id, EnemyKind::Shooter, Tier::Normal, Vec2::new(50.0, 60.0), &Difficulty::default(), 1.0, 0.0);
        state.enemies.push(enemy);
        let weapon = state.weapons[0].id;

        assert!(!strike_enemy(&mut state, 0, 40.0, weapon));
        assert!(strike_enemy(&mut state, 0, 60.0, weapon));
        assert!(state.enemies.is_empty());
        assert_eq!(state.orbs.len(), 1);
        assert_eq!(state.orbs[0].pos, Vec2::new(50.0, 60.0));
        assert_eq!(state.orbs[0].value, 2);
        assert_eq!(state.score, 2);
        assert_eq!(state.weapons[0].total_damage, 100.0);
    }

    #[test]
    fn test_hard_mode_doubles_score() {
        let mut state = playing_state();
        state.hard_mode = true;
        drop_orb(&mut state, Vec2::ZERO, 8);
        assert_eq!(state.score, 16);
    }

    #[test]
    fn test_player_damage_emits_sound() {
        let mut state = playing_state();
        hurt_player(&mut state, 10.0);
        hurt_player(&mut state, 10.0);
        assert_eq!(state.player.health, 90.0);
        let events = state.drain_events();
        assert_eq!(events, vec![GameEvent::Sound(SoundEffect::PlayerDamage)]);
    }

    #[test]
    fn test_lethal_hit_ends_session() {
        let mut state = playing_state();
        hurt_player(&mut state, 500.0);
        assert_eq!(state.player.health, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_no_damage_outside_play() {
        let mut state = playing_state();
        state.phase = GamePhase::Menu;
        hurt_player(&mut state, 10.0);
        assert_eq!(state.player.health, 100.0);
    }

    #[test]
    fn test_boss_kill_announced() {
        let mut state = playing_state();
        let mut boss = Boss::new(state.arena(), 0.0);
        boss.start_music(-30_000.0);
        boss.update(&mut state, 0.0);
        boss.health = 5.0;
        state.boss = Some(boss);
        let weapon = state.weapons[0].id;
        assert!(damage_boss(&mut state, 100.0, weapon));
        assert_eq!(state.weapons[0].total_damage, 5.0);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Sound(SoundEffect::BossDeath)));
        assert!(events.contains(&GameEvent::MusicStop));
    }
}
