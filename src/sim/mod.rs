//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only from the host-supplied clock
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod boss;
pub mod charge;
pub mod collision;
pub mod combat;
pub mod enemy;
pub mod events;
pub mod hazard;
pub mod orb;
pub mod progression;
pub mod projectile;
pub mod scaling;
pub mod schedule;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod view;
pub mod weapon;

pub use boss::Boss;
pub use enemy::{Enemy, EnemyKind, Tier};
pub use events::GameEvent;
pub use progression::UpgradeId;
pub use scaling::{BonusRates, Bonuses, Difficulty};
pub use session::{
    boss_music_started, enter_endless, reroll_upgrades, report_visibility, retry,
    return_to_menu, select_upgrade, set_auto_select, start,
};
pub use state::{AutoSelect, GamePhase, SessionMode, SessionState};
pub use tick::{TickInput, tick};
pub use view::{EntityView, SessionView, ViewKind};
pub use weapon::{Weapon, WeaponKind};
