//! Session commands and end-of-run bookkeeping
//!
//! Every command is guarded by the current phase; a call that does not fit
//! the phase is ignored and returns `false`. `now` is always the host's
//! wall-clock time in milliseconds.

use super::events::GameEvent;
use super::progression::{UpgradeId, apply_upgrade, generate_options, resume_play, schedule_recheck};
use super::state::{AutoSelect, GamePhase, SessionMode, SessionState};
use crate::audio::MusicTrack;
use crate::consts::*;

/// Leave the start screen and begin a run
pub fn start(state: &mut SessionState, mode: SessionMode, now: f64) -> bool {
    if state.phase != GamePhase::Menu {
        return false;
    }
    let hard = mode == SessionMode::Hard;
    if hard && !state.progress.hard_mode_unlocked() {
        log::warn!("Hard mode is locked until the boss has been beaten once");
        return false;
    }
    state.hard_mode = hard;
    begin_run(state, now);
    log::info!(
        "Session started ({:?}, {} permanent levels, seed {})",
        mode,
        state.progress.total_levels_gained,
        state.rng.seed
    );
    true
}

/// Take one of the offered upgrades
pub fn select_upgrade(state: &mut SessionState, id: UpgradeId, now: f64) -> bool {
    if state.phase != GamePhase::ChoosingUpgrade || !state.pending_choice.contains(&id) {
        log::debug!("Ignoring selection of {}", id.label());
        return false;
    }
    state.wall_now = now;
    resume_play(state);
    apply_upgrade(state, id);
    schedule_recheck(state);
    true
}

/// Spend a reroll on a fresh set of options
pub fn reroll_upgrades(state: &mut SessionState, now: f64) -> bool {
    if state.phase != GamePhase::ChoosingUpgrade || state.rerolls < 1.0 {
        return false;
    }
    state.wall_now = now;
    state.rerolls -= 1.0;
    let options = generate_options(state);
    state.pending_choice = options.clone();
    state.emit(GameEvent::UpgradeOffered(options));
    log::debug!("Rerolled upgrades ({:.2} left)", state.rerolls);
    true
}

/// Keep playing after the boss with ever-rising difficulty
pub fn enter_endless(state: &mut SessionState, now: f64) -> bool {
    if state.phase != GamePhase::Won {
        return false;
    }
    state.wall_now = now;
    state.endless = true;
    state.endless_level = 0;
    state.boss = None;
    state.boss_spawned = false;
    state.start_level = state.level;
    state.phase = GamePhase::Playing;
    state.emit(GameEvent::Music(MusicTrack::HardEndlessStart));
    log::info!("Endless mode at level {}", state.level);
    true
}

/// Restart after a loss or win, keeping the difficulty
pub fn retry(state: &mut SessionState, now: f64) -> bool {
    if !matches!(state.phase, GamePhase::GameOver | GamePhase::Won) {
        return false;
    }
    begin_run(state, now);
    log::info!("Session restarted (hard mode: {})", state.hard_mode);
    true
}

/// Back to the start screen
pub fn return_to_menu(state: &mut SessionState, now: f64) -> bool {
    if state.phase == GamePhase::Menu {
        return false;
    }
    state.hard_mode = false;
    state.reset_run(now);
    state.phase = GamePhase::Menu;
    state.emit(GameEvent::Music(MusicTrack::Menu));
    true
}

/// Host page visibility changed
pub fn report_visibility(state: &mut SessionState, hidden: bool, now: f64) {
    state.wall_now = now;
    if state.clock.is_hidden() != hidden {
        log::debug!("Tab {}", if hidden { "hidden" } else { "visible" });
    }
    state.clock.set_hidden(hidden, now);
}

/// The boss track actually began playing
pub fn boss_music_started(state: &mut SessionState, now: f64) -> bool {
    let sim = state.clock.sim_time(now);
    state
        .boss
        .as_mut()
        .is_some_and(|boss| boss.start_music(sim))
}

pub fn set_auto_select(state: &mut SessionState, auto: AutoSelect) {
    state.auto_select = auto;
}

/// Player died: bank progress and announce the result
pub fn game_over(state: &mut SessionState) {
    if !state.is_running() {
        return;
    }
    state.phase = GamePhase::GameOver;
    log_weapon_dps(state);

    state.progress.update_highest_score(state.score);
    bank_levels(state);
    let stats = state.progress;
    state.emit(GameEvent::StatsChanged(stats));

    let track = if state.hard_mode || state.endless {
        MusicTrack::HardEndlessGameOver
    } else {
        MusicTrack::GameOver
    };
    state.emit(GameEvent::Music(track));
    state.emit(GameEvent::GameOver {
        score: state.score,
        level: state.level,
    });
    log::info!(
        "Game over at {}s: level {}, score {}",
        state.game_time,
        state.level,
        state.score
    );
}

/// Boss defeated
pub fn player_wins(state: &mut SessionState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.phase = GamePhase::Won;
    log_weapon_dps(state);

    let multiplier = if state.hard_mode { 2 } else { 1 };
    state.score += WIN_SCORE_BONUS * multiplier;
    state.progress.update_highest_score(state.score);
    state.progress.mark_won();
    bank_levels(state);
    let stats = state.progress;
    state.emit(GameEvent::StatsChanged(stats));
    state.emit(GameEvent::Music(MusicTrack::Win));
    state.emit(GameEvent::Won { score: state.score });
    log::info!("Boss defeated at {}s, score {}", state.game_time, state.score);
}

fn begin_run(state: &mut SessionState, now: f64) {
    state.reset_run(now);
    state.phase = GamePhase::Playing;
    let track = if state.hard_mode {
        MusicTrack::HardEndlessStart
    } else {
        MusicTrack::Gameplay
    };
    state.emit(GameEvent::Music(track));
}

/// Add levels gained since `start_level` to permanent progress
fn bank_levels(state: &mut SessionState) {
    let gained = state.level.saturating_sub(state.start_level);
    if gained > 0 {
        state.progress.add_levels(gained);
        state.start_level = state.level;
        log::info!(
            "Banked {gained} levels ({} total)",
            state.progress.total_levels_gained
        );
    }
}

fn log_weapon_dps(state: &SessionState) {
    log::info!("Weapon report after {}s:", state.game_time);
    for weapon in &state.weapons {
        log::info!(
            "  {} lv{}: {:.0} damage, {:.2} dps",
            weapon.kind.name(),
            weapon.level,
            weapon.total_damage,
            weapon.dps(state.now)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::boss::Boss;

    fn menu_state(progress: PermanentStats) -> SessionState {
        SessionState::new(SimConfig::default(), progress, 9)
    }

    fn choosing_state() -> SessionState {
        let mut state = menu_state(PermanentStats::default());
        assert!(start(&mut state, SessionMode::Normal, 0.0));
        state.xp = state.xp_needed;
        crate::sim::progression::check_level_up(&mut state);
        assert_eq!(state.phase, GamePhase::ChoosingUpgrade);
        state.drain_events();
        state
    }

    #[test]
    fn test_hard_mode_locked_until_won() {
        let mut state = menu_state(PermanentStats::default());
        assert!(!start(&mut state, SessionMode::Hard, 0.0));
        assert_eq!(state.phase, GamePhase::Menu);

        let progress = PermanentStats {
            has_won: true,
            ..Default::default()
        };
        let mut state = menu_state(progress);
        assert!(start(&mut state, SessionMode::Hard, 0.0));
        assert!(state.hard_mode);
        assert_eq!(state.xp_needed, HARD_BASE_XP_NEEDED);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::Music(MusicTrack::HardEndlessStart)]
        );
    }

    #[test]
    fn test_select_only_offered_option() {
        let mut state = choosing_state();
        let offered = state.pending_choice.clone();
        let missing = [UpgradeId::Power, UpgradeId::Vitality, UpgradeId::Haste, UpgradeId::Armor]
            .into_iter()
            .find(|id| !offered.contains(id));
        if let Some(id) = missing {
            assert!(!select_upgrade(&mut state, id, 10.0));
            assert_eq!(state.phase, GamePhase::ChoosingUpgrade);
        }
        assert!(select_upgrade(&mut state, offered[0], 10.0));
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.pending_choice.is_empty());
        assert_eq!(state.schedule.len(), 1);
        assert!(!select_upgrade(&mut state, offered[0], 20.0));
    }

    #[test]
    fn test_reroll_spends_whole_rerolls() {
        let mut state = choosing_state();
        state.rerolls = 1.5;
        assert!(reroll_upgrades(&mut state, 0.0));
        assert!((state.rerolls - 0.5).abs() < 1e-6);
        assert_eq!(state.level, 2);
        assert!(matches!(
            state.drain_events().as_slice(),
            [GameEvent::UpgradeOffered(options)] if options.len() == 3
        ));
        assert!(!reroll_upgrades(&mut state, 0.0));
    }

    #[test]
    fn test_game_over_banks_levels() {
        let mut state = menu_state(PermanentStats::default());
        start(&mut state, SessionMode::Normal, 0.0);
        state.level = 6;
        state.score = 420;
        state.drain_events();
        game_over(&mut state);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.progress.total_levels_gained, 5);
        assert_eq!(state.progress.highest_score, 420);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Music(MusicTrack::GameOver)));
        assert!(events.contains(&GameEvent::GameOver { score: 420, level: 6 }));

        // only once
        game_over(&mut state);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_win_then_endless_then_loss() {
        let mut state = menu_state(PermanentStats::default());
        start(&mut state, SessionMode::Normal, 0.0);
        state.level = 4;
        state.score = 100;
        state.boss = Some(Boss::new(state.arena(), 0.0));
        state.boss_spawned = true;

        player_wins(&mut state);
        assert_eq!(state.phase, GamePhase::Won);
        assert_eq!(state.score, 1100);
        assert!(state.progress.has_won);
        assert_eq!(state.progress.total_levels_gained, 3);
        player_wins(&mut state);
        assert_eq!(state.score, 1100);

        assert!(enter_endless(&mut state, 1000.0));
        assert!(state.endless);
        assert!(state.boss.is_none());
        assert_eq!(state.start_level, 4);
        state.level = 7;
        state.drain_events();
        game_over(&mut state);
        assert_eq!(state.progress.total_levels_gained, 6);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::Music(MusicTrack::HardEndlessGameOver))
        );
    }

    #[test]
    fn test_retry_keeps_hard_mode_menu_clears_it() {
        let progress = PermanentStats {
            has_won: true,
            ..Default::default()
        };
        let mut state = menu_state(progress);
        start(&mut state, SessionMode::Hard, 0.0);
        assert!(!retry(&mut state, 10.0));
        game_over(&mut state);
        assert!(retry(&mut state, 20.0));
        assert!(state.hard_mode);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.level, 1);

        assert!(return_to_menu(&mut state, 30.0));
        assert!(!state.hard_mode);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::Music(MusicTrack::Menu))
        );
    }

    #[test]
    fn test_boss_music_uses_session_time() {
        let mut state = menu_state(PermanentStats::default());
        start(&mut state, SessionMode::Normal, 1000.0);
        assert!(!boss_music_started(&mut state, 2000.0));
        state.boss = Some(Boss::new(state.arena(), 0.0));
        assert!(boss_music_started(&mut state, 2000.0));
        assert_eq!(state.boss.as_ref().and_then(|b| b.music_started_at), Some(1000.0));
    }
}
