//! Notifications the simulation hands to its host

use serde::{Deserialize, Serialize};

use super::progression::UpgradeId;
use crate::audio::{MusicTrack, SoundEffect};
use crate::persistence::PermanentStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    Music(MusicTrack),
    MusicStop,
    /// Permanent progression changed and should be saved
    StatsChanged(PermanentStats),
    /// Upgrade prompt opened (or rerolled) with these options
    UpgradeOffered(Vec<UpgradeId>),
    GameOver { score: u64, level: u32 },
    Won { score: u64 },
}
