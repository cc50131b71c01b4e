//! Glue between a session, its audio and its storage
//!
//! The frontend (browser page or headless runner) owns one [`GameHost`],
//! calls [`GameHost::frame`] every animation frame, issues session commands
//! on `host.state`, and plays whatever [`AudioCue`]s come back.

use crate::audio::{AudioCue, AudioDirector};
use crate::config::SimConfig;
use crate::persistence::{KeyValueStore, PermanentStats};
use crate::settings::Settings;
use crate::sim::{GameEvent, SessionState, SessionView, TickInput, session, tick};

pub struct GameHost {
    pub state: SessionState,
    audio: AudioDirector,
    store: Box<dyn KeyValueStore>,
}

impl GameHost {
    /// Load progression and settings from `store` and open at the start screen
    pub fn new(config: SimConfig, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let progress = PermanentStats::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        let state = SessionState::new(config, progress, seed);
        Self {
            state,
            audio: AudioDirector::new(settings),
            store,
        }
    }

    /// Advance one frame at wall-clock `now` (ms)
    pub fn frame(&mut self, input: &TickInput, now: f64) -> Vec<AudioCue> {
        tick(&mut self.state, input, now);
        let mut cues = self.audio.poll(now);
        cues.extend(self.dispatch(now));
        if self.audio.take_boss_music_started() {
            session::boss_music_started(&mut self.state, now);
        }
        cues
    }

    /// Route pending session events to storage and audio
    pub fn dispatch(&mut self, now: f64) -> Vec<AudioCue> {
        let mut cues = Vec::new();
        for event in self.state.drain_events() {
            match &event {
                GameEvent::StatsChanged(stats) => {
                    if let Err(e) = stats.save(self.store.as_mut()) {
                        log::error!("Failed to save progression: {e}");
                    }
                }
                GameEvent::UpgradeOffered(options) => {
                    log::debug!("Offering {} upgrades", options.len());
                }
                _ => cues.extend(self.audio.handle(&event, now)),
            }
        }
        cues
    }

    pub fn settings(&self) -> Settings {
        self.audio.settings()
    }

    /// Change and persist the mute flags
    pub fn set_settings(&mut self, settings: Settings) -> Vec<AudioCue> {
        if let Err(e) = settings.save(self.store.as_mut()) {
            log::error!("Failed to save settings: {e}");
        }
        self.audio.set_settings(settings)
    }

    pub fn view(&self) -> SessionView {
        SessionView::capture(&self.state)
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MusicTrack, SoundEffect};
    use crate::persistence::MemoryStore;
    use crate::sim::combat::hurt_player;
    use crate::sim::{GamePhase, SessionMode};

    fn host_with(store: MemoryStore) -> GameHost {
        GameHost::new(SimConfig::default(), Box::new(store), 3)
    }

    #[test]
    fn test_loads_progress_from_store() {
        let mut store = MemoryStore::new();
        let stats = PermanentStats {
            total_levels_gained: 20,
            has_won: true,
            highest_score: 900,
        };
        stats.save(&mut store).unwrap();
        let host = host_with(store);
        assert_eq!(host.state.progress, stats);
        assert!((host.state.rerolls - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_game_over_is_saved() {
        let mut host = host_with(MemoryStore::new());
        assert!(session::start(&mut host.state, SessionMode::Normal, 0.0));
        let cues = host.frame(&TickInput::default(), 0.0);
        assert!(cues.contains(&AudioCue::Play(MusicTrack::Gameplay)));

        host.state.score = 77;
        hurt_player(&mut host.state, 1000.0);
        assert_eq!(host.state.phase, GamePhase::GameOver);
        let cues = host.frame(&TickInput::default(), 16.0);
        assert!(cues.contains(&AudioCue::Sound(SoundEffect::PlayerDamage)));
        assert!(cues.contains(&AudioCue::Play(MusicTrack::GameOver)));

        let saved = PermanentStats::load(host.store());
        assert_eq!(saved.highest_score, 77);
    }

    #[test]
    fn test_settings_persist() {
        let mut host = host_with(MemoryStore::new());
        let muted = Settings {
            mute_music: true,
            mute_sound_effects: true,
        };
        host.set_settings(muted);
        assert_eq!(Settings::load(host.store()), muted);
        assert_eq!(host.settings(), muted);
    }
}
