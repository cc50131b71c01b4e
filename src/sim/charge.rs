//! Charge attack cycle shared by chargers and the boss
//!
//! idle -> pulsing -> charging -> attacking -> idle. The charge locks onto
//! the player's position when pulsing ends and releases an 8-way burst
//! either on arrival or once it has travelled its maximum distance.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Timings and speed for one user of the cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeTuning {
    /// Idle dwell before pulsing (ms, exclusive)
    pub idle_ms: f64,
    /// Pulse duration, also the pulse period (ms)
    pub pulse_ms: f64,
    /// Charge speed (nominal units/s)
    pub charge_speed: f32,
    /// Recovery after the burst (ms)
    pub attack_ms: f64,
}

impl ChargeTuning {
    pub const CHARGER: Self = Self {
        idle_ms: 2200.0,
        pulse_ms: 1000.0,
        charge_speed: 480.0,
        attack_ms: 500.0,
    };

    pub const BOSS: Self = Self {
        idle_ms: 1650.0,
        pulse_ms: 750.0,
        charge_speed: 600.0,
        attack_ms: 1500.0,
    };
}

/// A charge ends once this close to its target
pub const ARRIVAL_EPSILON: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePhase {
    Idle,
    Pulsing,
    Charging,
    Attacking,
}

/// What the owner should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStep {
    /// Free to walk toward the player
    Idle,
    /// Busy with the cycle
    Busy,
    /// Release the 8-way burst from the current position
    Burst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeCycle {
    pub phase: ChargePhase,
    since: f64,
    /// Visual pulse while winding up
    pub pulse_scale: f32,
    /// Locked charge destination
    pub target: Vec2,
    travelled: f32,
    fired: bool,
}

impl ChargeCycle {
    pub fn new(now: f64) -> Self {
        Self {
            phase: ChargePhase::Idle,
            since: now,
            pulse_scale: 1.0,
            target: Vec2::ZERO,
            travelled: 0.0,
            fired: false,
        }
    }

    fn enter(&mut self, phase: ChargePhase, now: f64) {
        self.phase = phase;
        self.since = now;
    }

    /// Advance the cycle. `step` is `scale * dt`; `max_charge` is in arena
    /// units, already scaled.
    pub fn update(
        &mut self,
        pos: &mut Vec2,
        player: Vec2,
        max_charge: f32,
        tuning: &ChargeTuning,
        step: f32,
        now: f64,
    ) -> ChargeStep {
        let elapsed = now - self.since;
        match self.phase {
            ChargePhase::Idle => {
                if elapsed > tuning.idle_ms {
                    self.enter(ChargePhase::Pulsing, now);
                }
                ChargeStep::Idle
            }
            ChargePhase::Pulsing => {
                let progress = ((elapsed / tuning.pulse_ms) % 1.0) as f32;
                self.pulse_scale = 1.0 + (progress * TAU).sin() * 0.2;
                if elapsed >= tuning.pulse_ms {
                    self.enter(ChargePhase::Charging, now);
                    self.target = player;
                    self.travelled = 0.0;
                    self.pulse_scale = 1.0;
                    self.fired = false;
                }
                ChargeStep::Busy
            }
            ChargePhase::Charging => {
                let delta = self.target - *pos;
                let distance = delta.length();
                let mut arrived = distance <= ARRIVAL_EPSILON;
                if !arrived {
                    let advance = (tuning.charge_speed * step).min(distance);
                    *pos += delta / distance * advance;
                    self.travelled += advance;
                    arrived = self.travelled >= max_charge;
                }
                if arrived && !self.fired {
                    self.fired = true;
                    self.enter(ChargePhase::Attacking, now);
                    return ChargeStep::Burst;
                }
                ChargeStep::Busy
            }
            ChargePhase::Attacking => {
                if elapsed >= tuning.attack_ms {
                    self.enter(ChargePhase::Idle, now);
                }
                ChargeStep::Busy
            }
        }
    }
}

/// Headings of the 8-way burst
pub fn burst_angles() -> impl Iterator<Item = f32> {
    (0..8).map(|k| k as f32 * PI / 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn run_until_burst(cycle: &mut ChargeCycle, pos: &mut Vec2, player: Vec2, max: f32) -> (f64, u32) {
        let mut now = 0.0;
        let mut bursts = 0;
        while now < 10_000.0 {
            now += 1000.0 / 60.0;
            if cycle.update(pos, player, max, &ChargeTuning::CHARGER, FRAME, now) == ChargeStep::Burst {
                bursts += 1;
                return (now, bursts);
            }
        }
        (now, bursts)
    }

    #[test]
    fn test_full_cycle_timing() {
        let mut cycle = ChargeCycle::new(0.0);
        let mut pos = Vec2::ZERO;
        let player = Vec2::new(100.0, 0.0);
        let (t, bursts) = run_until_burst(&mut cycle, &mut pos, player, 300.0);
        assert_eq!(bursts, 1);
        // 2200 idle + 1000 pulse + ~100/8 frames of charging
        assert!(t > 3200.0 && t < 3500.0, "burst at {t}");
        assert_eq!(cycle.phase, ChargePhase::Attacking);
        assert!(pos.distance(player) <= ARRIVAL_EPSILON + 8.0);
    }

    #[test]
    fn test_charge_stops_at_max_distance() {
        let mut cycle = ChargeCycle::new(0.0);
        let mut pos = Vec2::ZERO;
        let player = Vec2::new(1000.0, 0.0);
        let (_, bursts) = run_until_burst(&mut cycle, &mut pos, player, 300.0);
        assert_eq!(bursts, 1);
        assert!(pos.x >= 300.0 && pos.x < 310.0, "stopped at {}", pos.x);
    }

    #[test]
    fn test_single_burst_then_idle() {
        let mut cycle = ChargeCycle::new(0.0);
        let mut pos = Vec2::ZERO;
        let player = Vec2::new(50.0, 0.0);
        run_until_burst(&mut cycle, &mut pos, player, 300.0);
        let start = cycle.since;
        let mut now = start;
        let mut extra = 0;
        while now < start + 499.0 {
            now += 10.0;
            if cycle.update(&mut pos, player, 300.0, &ChargeTuning::CHARGER, FRAME, now) == ChargeStep::Burst {
                extra += 1;
            }
        }
        assert_eq!(extra, 0);
        cycle.update(&mut pos, player, 300.0, &ChargeTuning::CHARGER, FRAME, start + 500.0);
        assert_eq!(cycle.phase, ChargePhase::Idle);
    }

    #[test]
    fn test_pulse_scale_resets_on_charge() {
        let mut cycle = ChargeCycle::new(0.0);
        let mut pos = Vec2::ZERO;
        let t = ChargeTuning::CHARGER;
        cycle.update(&mut pos, Vec2::X, 300.0, &t, FRAME, 2201.0);
        assert_eq!(cycle.phase, ChargePhase::Pulsing);
        cycle.update(&mut pos, Vec2::X, 300.0, &t, FRAME, 2201.0 + 250.0);
        assert!((cycle.pulse_scale - 1.2).abs() < 1e-3);
        cycle.update(&mut pos, Vec2::new(40.0, 0.0), 300.0, &t, FRAME, 3201.0);
        assert_eq!(cycle.phase, ChargePhase::Charging);
        assert_eq!(cycle.pulse_scale, 1.0);
        assert_eq!(cycle.target, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn test_burst_angles() {
        let angles: Vec<f32> = burst_angles().collect();
        assert_eq!(angles.len(), 8);
        assert_eq!(angles[0], 0.0);
        assert!((angles[4] - PI).abs() < 1e-6);
    }

    #[test]
    fn test_fast_charge_lands_on_target() {
        let mut cycle = ChargeCycle::new(0.0);
        let mut pos = Vec2::ZERO;
        let target = Vec2::new(30.0, 0.0);
        let t = ChargeTuning::CHARGER;
        cycle.update(&mut pos, target, 300.0, &t, FRAME, 2201.0);
        cycle.update(&mut pos, target, 300.0, &t, FRAME, 3201.0);
        assert_eq!(cycle.phase, ChargePhase::Charging);

        // one step covers 480 units, far past the target
        let step = cycle.update(&mut pos, target, 300.0, &t, 1.0, 3220.0);
        assert_eq!(pos, target);
        assert_eq!(step, ChargeStep::Busy);
        let step = cycle.update(&mut pos, target, 300.0, &t, 1.0, 3240.0);
        assert_eq!(step, ChargeStep::Burst);
        assert_eq!(pos, target);
    }
}
