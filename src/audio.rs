//! Sound and music direction
//!
//! The simulation only announces what should be heard. [`AudioDirector`]
//! turns those announcements into playback cues for the host, applying the
//! mute settings and chaining the tracks that lead into one another.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::GameEvent;

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    PlayerDamage,
    LevelUp,
    BossDeath,
}

impl SoundEffect {
    pub fn file(self) -> &'static str {
        match self {
            SoundEffect::PlayerDamage => "music/player-damage.wav",
            SoundEffect::LevelUp => "music/level-up.wav",
            SoundEffect::BossDeath => "music/boss-death.wav",
        }
    }
}

/// Music tracks (the spoken boss intro counts as one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Menu,
    Gameplay,
    BossSpoken,
    Boss,
    GameOver,
    Win,
    HardEndlessStart,
    HardEndlessGameOver,
}

impl MusicTrack {
    pub fn file(self) -> &'static str {
        match self {
            MusicTrack::Menu => "music/menu.mp3",
            MusicTrack::Gameplay => "music/gameplay.mp3",
            MusicTrack::BossSpoken => "music/boss-spoken.mp3",
            MusicTrack::Boss => "music/boss.mp3",
            MusicTrack::GameOver => "music/gameover.mp3",
            MusicTrack::Win => "music/win.mp3",
            MusicTrack::HardEndlessStart => "music/hard-endless-start.mp3",
            MusicTrack::HardEndlessGameOver => "music/hard-endless-gameover.mp3",
        }
    }

    pub fn looping(self) -> bool {
        !matches!(
            self,
            MusicTrack::BossSpoken | MusicTrack::HardEndlessStart | MusicTrack::Gameplay
        )
    }

    /// The track that follows this one when it ends
    pub fn next(self) -> Option<MusicTrack> {
        match self {
            MusicTrack::BossSpoken => Some(MusicTrack::Boss),
            MusicTrack::HardEndlessStart => Some(MusicTrack::Gameplay),
            _ => None,
        }
    }

    /// Nominal clip length for tracks that hand over to another (ms)
    fn clip_ms(self) -> f64 {
        match self {
            MusicTrack::BossSpoken => 9_000.0,
            MusicTrack::HardEndlessStart => 12_000.0,
            _ => 0.0,
        }
    }

    /// The spoken intro is voice, so it follows the effects mute
    fn is_voice(self) -> bool {
        self == MusicTrack::BossSpoken
    }
}

/// Playback instruction for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Sound(SoundEffect),
    Play(MusicTrack),
    Stop,
}

#[derive(Debug, Default)]
pub struct AudioDirector {
    settings: Settings,
    current: Option<MusicTrack>,
    /// Track queued to follow the current one, with its start deadline
    pending: Option<(f64, MusicTrack)>,
    boss_music_started: bool,
}

impl AudioDirector {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn current(&self) -> Option<MusicTrack> {
        self.current
    }

    /// Change mute flags; unmuting music resumes the current track
    pub fn set_settings(&mut self, settings: Settings) -> Vec<AudioCue> {
        let was_muted = self.settings.mute_music;
        self.settings = settings;
        let mut cues = Vec::new();
        match (was_muted, settings.mute_music, self.current) {
            (false, true, Some(_)) => cues.push(AudioCue::Stop),
            (true, false, Some(track)) => cues.push(AudioCue::Play(track)),
            _ => {}
        }
        cues
    }

    /// Translate one simulation event (ms wall-clock `now`)
    pub fn handle(&mut self, event: &GameEvent, now: f64) -> Vec<AudioCue> {
        let mut cues = Vec::new();
        match event {
            GameEvent::Sound(effect) => {
                if !self.settings.mute_sound_effects {
                    cues.push(AudioCue::Sound(*effect));
                }
            }
            GameEvent::Music(track) => self.play(*track, now, &mut cues),
            GameEvent::MusicStop => {
                self.current = None;
                self.pending = None;
                cues.push(AudioCue::Stop);
            }
            _ => {}
        }
        cues
    }

    /// Start queued follow-up tracks whose time has come
    pub fn poll(&mut self, now: f64) -> Vec<AudioCue> {
        let mut cues = Vec::new();
        if let Some((deadline, track)) = self.pending
            && now >= deadline
        {
            self.pending = None;
            self.play(track, now, &mut cues);
        }
        cues
    }

    /// The host saw `track` finish early
    pub fn track_ended(&mut self, track: MusicTrack, now: f64) -> Vec<AudioCue> {
        if self.current != Some(track) {
            return Vec::new();
        }
        match self.pending {
            Some((_, next)) => {
                self.pending = Some((now, next));
                self.poll(now)
            }
            None => Vec::new(),
        }
    }

    /// True once after the boss track starts playing
    pub fn take_boss_music_started(&mut self) -> bool {
        std::mem::take(&mut self.boss_music_started)
    }

    fn play(&mut self, track: MusicTrack, now: f64, cues: &mut Vec<AudioCue>) {
        if track.is_voice() && self.settings.mute_sound_effects {
            log::debug!("Skipping {track:?}, effects muted");
            if let Some(next) = track.next() {
                self.play(next, now, cues);
            }
            return;
        }

        self.current = Some(track);
        self.pending = track.next().map(|next| (now + track.clip_ms(), next));
        let muted = self.settings.mute_music && !track.is_voice();
        if muted {
            // no boss-start report either; the boss falls back to its timeout
            return;
        }
        log::debug!("Playing {}", track.file());
        cues.push(AudioCue::Play(track));
        if track == MusicTrack::Boss {
            self.boss_music_started = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_effects_are_dropped() {
        let mut director = AudioDirector::new(Settings {
            mute_music: false,
            mute_sound_effects: true,
        });
        let cues = director.handle(&GameEvent::Sound(SoundEffect::LevelUp), 0.0);
        assert!(cues.is_empty());
    }

    #[test]
    fn test_spoken_intro_leads_into_boss_music() {
        let mut director = AudioDirector::default();
        let cues = director.handle(&GameEvent::Music(MusicTrack::BossSpoken), 1000.0);
        assert_eq!(cues, vec![AudioCue::Play(MusicTrack::BossSpoken)]);
        assert!(director.poll(5000.0).is_empty());
        assert!(!director.take_boss_music_started());

        assert_eq!(director.poll(10_000.0), vec![AudioCue::Play(MusicTrack::Boss)]);
        assert!(director.take_boss_music_started());
        assert!(!director.take_boss_music_started());
        assert_eq!(director.current(), Some(MusicTrack::Boss));
    }

    #[test]
    fn test_spoken_intro_skipped_when_effects_muted() {
        let mut director = AudioDirector::new(Settings {
            mute_music: false,
            mute_sound_effects: true,
        });
        let cues = director.handle(&GameEvent::Music(MusicTrack::BossSpoken), 0.0);
        assert_eq!(cues, vec![AudioCue::Play(MusicTrack::Boss)]);
        assert!(director.take_boss_music_started());
    }

    #[test]
    fn test_muted_music_never_reports_boss_start() {
        let mut director = AudioDirector::new(Settings {
            mute_music: true,
            mute_sound_effects: true,
        });
        assert!(director.handle(&GameEvent::Music(MusicTrack::BossSpoken), 0.0).is_empty());
        assert!(!director.take_boss_music_started());
        assert_eq!(director.current(), Some(MusicTrack::Boss));
    }

    #[test]
    fn test_start_track_hands_over_to_gameplay() {
        let mut director = AudioDirector::default();
        director.handle(&GameEvent::Music(MusicTrack::HardEndlessStart), 0.0);
        let cues = director.track_ended(MusicTrack::HardEndlessStart, 3000.0);
        assert_eq!(cues, vec![AudioCue::Play(MusicTrack::Gameplay)]);
        assert!(director.poll(20_000.0).is_empty());
    }

    #[test]
    fn test_stop_clears_pending_handover() {
        let mut director = AudioDirector::default();
        director.handle(&GameEvent::Music(MusicTrack::BossSpoken), 0.0);
        assert_eq!(director.handle(&GameEvent::MusicStop, 100.0), vec![AudioCue::Stop]);
        assert!(director.poll(60_000.0).is_empty());
        assert_eq!(director.current(), None);
    }

    #[test]
    fn test_unmute_resumes_current_track() {
        let mut director = AudioDirector::new(Settings {
            mute_music: true,
            mute_sound_effects: false,
        });
        assert!(director.handle(&GameEvent::Music(MusicTrack::Menu), 0.0).is_empty());
        let cues = director.set_settings(Settings::default());
        assert_eq!(cues, vec![AudioCue::Play(MusicTrack::Menu)]);
    }
}
