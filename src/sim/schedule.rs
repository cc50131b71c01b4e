//! Deferred actions keyed by session-time deadline
//!
//! Follow-up blade swings, wand bursts and level-up re-checks are queued here
//! and run at the top of the first tick whose session time reaches their
//! deadline. Each action re-checks that its weapon still exists.

use serde::{Deserialize, Serialize};

use super::collision::strongest_target;
use super::hazard::{Side, Strike, StrikeMotion};
use super::progression::check_level_up;
use super::projectile::{Projectile, ProjectileKind};
use super::state::SessionState;
use super::weapon::BladeSwing;
use crate::angle_between;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduledEvent {
    /// Right-hand blade strike following the left one
    SecondStrike { weapon: u32, swing: BladeSwing },
    /// One flame of a wand burst
    WandShot {
        weapon: u32,
        damage: f32,
        level: u32,
        size: f32,
        opacity: f32,
    },
    /// Look for further pending level-ups
    LevelCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pending {
    deadline: f64,
    seq: u64,
    event: ScheduledEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventQueue {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl EventQueue {
    pub fn schedule(&mut self, deadline: f64, event: ScheduledEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            deadline,
            seq,
            event,
        });
    }

    /// Remove and return every event due at `now`, earliest first (ties in
    /// insertion order)
    pub fn pop_due(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.deadline <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|p| p.event).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Run everything whose deadline has passed
pub fn run_due_events(state: &mut SessionState) {
    for event in state.schedule.pop_due(state.now) {
        run_event(state, event);
    }
}

fn run_event(state: &mut SessionState, event: ScheduledEvent) {
    match event {
        ScheduledEvent::SecondStrike { weapon, swing } => {
            if state.weapon(weapon).is_none() {
                log::debug!("Dropping second strike for missing weapon {weapon}");
                return;
            }
            let id = state.next_entity_id();
            let motion = StrikeMotion::Fixed {
                anchor: state.player.pos,
                side: Side::Right,
            };
            state.strikes.push(Strike::new(
                id,
                weapon,
                swing.damage,
                swing.range,
                swing.size,
                swing.duration,
                motion,
                state.now,
            ));
        }
        ScheduledEvent::WandShot {
            weapon,
            damage,
            level,
            size,
            opacity,
        } => {
            let Some(speed) = state.weapon(weapon).map(|w| w.kind.projectile_speed()) else {
                log::debug!("Dropping wand shot for missing weapon {weapon}");
                return;
            };
            let from = state.player.pos;
            let Some(target) = strongest_target(state, from) else {
                return;
            };
            let id = state.next_entity_id();
            state.projectiles.push(Projectile::new(
                id,
                weapon,
                from,
                angle_between(from, target),
                speed,
                damage,
                opacity,
                None,
                ProjectileKind::Flame { level, size },
                state.now,
            ));
        }
        ScheduledEvent::LevelCheck => check_level_up(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence::PermanentStats;
    use crate::sim::enemy::{Enemy, EnemyKind, Tier};
    use crate::sim::scaling::Difficulty;
    use crate::sim::state::GamePhase;
    use glam::Vec2;

    fn playing_state() -> SessionState {
        let mut state = SessionState::new(SimConfig::default(), PermanentStats::default(), 6);
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_pop_due_orders_by_deadline_then_insertion() {
        let mut queue = EventQueue::default();
        queue.schedule(300.0, ScheduledEvent::LevelCheck);
        queue.schedule(
            100.0,
            ScheduledEvent::WandShot {
                weapon: 1,
                damage: 1.0,
                level: 1,
                size: 1.0,
                opacity: 0.5,
            },
        );
        queue.schedule(
            100.0,
            ScheduledEvent::WandShot {
                weapon: 2,
                damage: 1.0,
                level: 1,
                size: 1.0,
                opacity: 0.5,
            },
        );
        assert!(queue.pop_due(99.0).is_empty());

        let due = queue.pop_due(100.0);
        let weapons: Vec<u32> = due
            .iter()
            .filter_map(|e| match e {
                ScheduledEvent::WandShot { weapon, .. } => Some(*weapon),
                _ => None,
            })
            .collect();
        assert_eq!(weapons, vec![1, 2]);
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stale_weapon_events_are_dropped() {
        let mut state = playing_state();
        state.schedule.schedule(
            0.0,
            ScheduledEvent::SecondStrike {
                weapon: 999,
                swing: BladeSwing {
                    damage: 10.0,
                    range: 70.0,
                    size: 128.0,
                    duration: 500.0,
                },
            },
        );
        run_due_events(&mut state);
        assert!(state.strikes.is_empty());
        assert!(state.schedule.is_empty());
    }

    #[test]
    fn test_wand_shot_aims_at_strongest() {
        let mut state = playing_state();
        let weapon = state.weapons[0].id;
        for (pos, health) in [(Vec2::new(100.0, 400.0), 10.0), (Vec2::new(600.0, 100.0), 50.0)] {
            let id = state.next_entity_id();
            let mut enemy = Enemy::spawn(id, EnemyKind::Swarmer, Tier::Normal, pos, &Difficulty::default(), 1.0, 0.0);
            enemy.health = health;
            state.enemies.push(enemy);
        }
        state.schedule.schedule(
            0.0,
            ScheduledEvent::WandShot {
                weapon,
                damage: 6.0,
                level: 1,
                size: 1.0,
                opacity: 0.5,
            },
        );
        run_due_events(&mut state);
        assert_eq!(state.projectiles.len(), 1);
        let shot = &state.projectiles[0];
        assert!((shot.angle + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(matches!(shot.kind, ProjectileKind::Flame { .. }));
    }

    #[test]
    fn test_wand_shot_skipped_without_target() {
        let mut state = playing_state();
        let weapon = state.weapons[0].id;
        state.schedule.schedule(
            0.0,
            ScheduledEvent::WandShot {
                weapon,
                damage: 6.0,
                level: 1,
                size: 1.0,
                opacity: 0.5,
            },
        );
        run_due_events(&mut state);
        assert!(state.projectiles.is_empty());
    }
}
