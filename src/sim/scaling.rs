//! Stat scaling pipelines
//!
//! Effective numbers are always built from the same stages in the same order:
//! - permanent bonuses from every level ever gained (dampened in hard mode)
//! - weapon cooldowns: level decay, haste, permanent factor, floor
//! - enemy stats: kind, tier, frenzy, hard mode, endless
//! - enemy XP: kind, endless, hard mode, tier

use serde::{Deserialize, Serialize};

use super::enemy::{EnemyKind, Tier};

/// Fraction of the permanent bonus that survives in hard mode
pub const HARD_BONUS_DAMPING: f32 = 0.2;

/// Minimum cooldown as a fraction of the unmodified base
pub const COOLDOWN_FLOOR: f64 = 0.1;

/// Per-level growth of each permanent bonus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusRates {
    pub xp_gain: f32,
    pub damage: f32,
    pub hp: f32,
    /// Subtracted, not added
    pub cooldown: f32,
    pub attack_size: f32,
    pub speed: f32,
}

impl BonusRates {
    pub const DEFAULT: Self = Self {
        xp_gain: 0.01,
        damage: 0.0025,
        hp: 0.005,
        cooldown: 0.0015,
        attack_size: 0.0025,
        speed: 0.0005,
    };
}

impl Default for BonusRates {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Permanent multipliers derived from total levels gained across sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bonuses {
    pub xp_gain: f32,
    pub damage: f32,
    pub hp: f32,
    pub cooldown: f32,
    pub attack_size: f32,
    pub speed: f32,
}

impl Default for Bonuses {
    fn default() -> Self {
        Self::new(0, false)
    }
}

impl Bonuses {
    pub fn new(total_levels: u32, hard: bool) -> Self {
        Self::with_rates(total_levels, hard, &BonusRates::DEFAULT)
    }

    pub fn with_rates(total_levels: u32, hard: bool, rates: &BonusRates) -> Self {
        let levels = total_levels as f32;
        let damp = if hard { HARD_BONUS_DAMPING } else { 1.0 };
        let grow = |rate: f32| 1.0 + levels * rate * damp;
        Self {
            xp_gain: grow(rates.xp_gain),
            damage: grow(rates.damage),
            hp: grow(rates.hp),
            cooldown: 1.0 - levels * rates.cooldown * damp,
            attack_size: grow(rates.attack_size),
            speed: grow(rates.speed),
        }
    }
}

/// How a weapon's cooldown shrinks with its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownDecay {
    /// `base * 0.9^(level-1)`
    Geometric,
    /// `base / (1 + level*0.1)`
    Hyperbolic,
}

/// Effective cooldown (ms) after every stage, never below 10% of `base`
pub fn effective_cooldown(
    base: f64,
    level: u32,
    decay: CooldownDecay,
    haste: u32,
    bonuses: &Bonuses,
) -> f64 {
    if base <= 0.0 {
        return 0.0;
    }
    let leveled = match decay {
        CooldownDecay::Geometric => base * 0.9f64.powi(level.saturating_sub(1) as i32),
        CooldownDecay::Hyperbolic => base / (1.0 + level as f64 * 0.1),
    };
    let hasted = leveled * haste_factor(haste);
    let permanent = hasted * bonuses.cooldown as f64;
    permanent.max(base * COOLDOWN_FLOOR)
}

/// Cooldown multiplier from the haste upgrade
#[inline]
pub fn haste_factor(haste: u32) -> f64 {
    0.9f64.powi(haste as i32)
}

/// Run-wide knobs that feed the enemy pipelines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub frenzy: u32,
    pub hard: bool,
    /// Endless difficulty level; 0 outside endless
    pub endless_level: u32,
}

impl Difficulty {
    /// Endless multiplier, or `None` when it does not apply
    fn endless_multiplier(&self) -> Option<f32> {
        (self.endless_level > 0).then(|| 1.0 + self.endless_level as f32 * 0.1)
    }
}

/// Unscaled (nominal arena) stats for one enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub radius: f32,
    pub speed: f32,
    pub health: f32,
    pub contact_damage: f32,
    /// Shooter only (ms)
    pub shot_cooldown: f64,
    /// Charger only
    pub max_charge: f32,
    pub xp: u32,
}

impl EnemyStats {
    fn base(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Swarmer => Self {
                radius: 20.0,
                speed: 10.0,
                health: 20.0,
                contact_damage: 5.0,
                shot_cooldown: 0.0,
                max_charge: 0.0,
                xp: 1,
            },
            EnemyKind::Shooter => Self {
                radius: 36.0,
                speed: 20.0,
                health: 100.0,
                contact_damage: 0.0,
                shot_cooldown: 2200.0,
                max_charge: 0.0,
                xp: 2,
            },
            EnemyKind::Charger => Self {
                radius: 44.0,
                speed: 10.0,
                health: 600.0,
                contact_damage: 40.0,
                shot_cooldown: 0.0,
                max_charge: 300.0,
                xp: 3,
            },
        }
    }

    fn with_tier(mut self, tier: Tier) -> Self {
        let (mult, hp_bonus, divisor) = match tier {
            Tier::Normal => return self,
            Tier::Elite => (2.0, 20.0, 2.0),
            Tier::SuperElite => (4.0, 50.0, 4.0),
        };
        self.radius *= mult;
        self.speed *= mult;
        self.health = self.health * 2.0 + hp_bonus;
        self.shot_cooldown /= divisor;
        self.max_charge *= mult;
        self
    }

    fn with_frenzy(mut self, frenzy: u32) -> Self {
        if frenzy > 0 {
            self.health = (self.health * (1.0 + frenzy as f32 * 0.2)).floor();
        }
        self
    }

    fn with_hard_mode(mut self, hard: bool) -> Self {
        if hard {
            self.radius *= 2.0;
            self.speed *= 2.0;
            self.health *= 2.0;
            self.contact_damage *= 2.0;
            self.shot_cooldown /= 2.0;
            self.max_charge *= 2.0;
        }
        self
    }

    fn with_endless(mut self, difficulty: &Difficulty) -> Self {
        if let Some(m) = difficulty.endless_multiplier() {
            self.radius *= m;
            self.speed *= m;
            self.health = (self.health * m).floor();
            self.contact_damage = (self.contact_damage * m).floor();
            self.shot_cooldown /= m as f64;
            self.max_charge *= m;
        }
        self
    }
}

/// Full enemy stat pipeline
pub fn enemy_stats(kind: EnemyKind, tier: Tier, difficulty: &Difficulty) -> EnemyStats {
    let mut stats = EnemyStats::base(kind)
        .with_tier(tier)
        .with_frenzy(difficulty.frenzy)
        .with_hard_mode(difficulty.hard)
        .with_endless(difficulty);
    stats.xp = enemy_xp(kind, tier, difficulty);
    stats
}

/// XP carried by an enemy: endless, then hard mode, then tier
pub fn enemy_xp(kind: EnemyKind, tier: Tier, difficulty: &Difficulty) -> u32 {
    let mut xp = EnemyStats::base(kind).xp;
    if let Some(m) = difficulty.endless_multiplier() {
        xp = (xp as f32 * m).floor() as u32;
    }
    if difficulty.hard {
        xp *= 4;
    }
    match tier {
        Tier::Normal => xp,
        Tier::Elite => xp * 5,
        Tier::SuperElite => xp * 10,
    }
}

/// Value of the orb an enemy drops
pub fn orb_value(xp: u32, frenzy: u32, hard: bool, bonuses: &Bonuses) -> u32 {
    let mut value = (xp as f32 * (1.0 + frenzy as f32 * 0.05)).floor();
    if !hard {
        value = (value * bonuses.xp_gain).floor();
    }
    value as u32
}

/// Tier odds: `(super_elite, elite)`, the elite roll only happens when the
/// super-elite roll fails
pub fn tier_chances(difficulty: &Difficulty) -> (f32, f32) {
    let hm = if difficulty.hard { 2.0 } else { 1.0 };
    let frenzy = difficulty.frenzy as f32;
    let super_elite = ((0.02 + 0.03 * frenzy) * hm).min(1.0);
    let elite = ((0.05 + 0.10 * frenzy) * hm).min(1.0);
    (super_elite, elite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_bonuses_zero_levels() {
        let b = Bonuses::new(0, false);
        assert_eq!(b.damage, 1.0);
        assert_eq!(b.cooldown, 1.0);
        assert_eq!(b, Bonuses::new(0, true));
    }

    #[test]
    fn test_bonuses_hard_mode_dampened() {
        let rates = BonusRates {
            damage: 0.005,
            ..BonusRates::DEFAULT
        };
        let normal = Bonuses::with_rates(100, false, &rates);
        let hard = Bonuses::with_rates(100, true, &rates);
        assert!(close(normal.damage, 1.5));
        assert!(close(hard.damage, 1.1));

        let normal = Bonuses::new(100, false);
        let hard = Bonuses::new(100, true);
        assert!(close(normal.cooldown, 0.85));
        assert!(close(hard.cooldown, 0.97));
        assert!(close(normal.xp_gain, 2.0));
        assert!(close(hard.xp_gain, 1.2));
    }

    #[test]
    fn test_cooldown_pipeline() {
        let b = Bonuses::default();
        // Blade at level 3: 4000 * 0.81
        let cd = effective_cooldown(4000.0, 3, CooldownDecay::Geometric, 0, &b);
        assert!((cd - 3240.0).abs() < 1e-6);
        // Plug at level 1: 1000 / 1.1
        let cd = effective_cooldown(1000.0, 1, CooldownDecay::Hyperbolic, 0, &b);
        assert!((cd - 1000.0 / 1.1).abs() < 1e-6);
        // Zero base stays zero
        assert_eq!(effective_cooldown(0.0, 5, CooldownDecay::Hyperbolic, 5, &b), 0.0);
    }

    #[test]
    fn test_cooldown_floor() {
        let b = Bonuses::new(600, false);
        let cd = effective_cooldown(4000.0, 5, CooldownDecay::Geometric, 5, &b);
        assert_eq!(cd, 400.0);
    }

    #[test]
    fn test_enemy_stats_elite_charger() {
        let stats = enemy_stats(EnemyKind::Charger, Tier::Elite, &Difficulty::default());
        assert_eq!(stats.radius, 88.0);
        assert_eq!(stats.speed, 20.0);
        assert_eq!(stats.health, 1220.0);
        assert_eq!(stats.max_charge, 600.0);
        assert_eq!(stats.xp, 15);
    }

    #[test]
    fn test_enemy_stats_stage_order() {
        let difficulty = Difficulty {
            frenzy: 1,
            hard: true,
            endless_level: 5,
        };
        let stats = enemy_stats(EnemyKind::Shooter, Tier::SuperElite, &difficulty);
        // tier: 250, frenzy: floor(250*1.2)=300, hard: 600, endless: floor(600*1.5)=900
        assert_eq!(stats.health, 900.0);
        // 2200 /4 /2 /1.5
        assert!((stats.shot_cooldown - 2200.0 / 4.0 / 2.0 / 1.5).abs() < 1e-3);
        // xp: floor(2*1.5)=3, *4=12, *10=120
        assert_eq!(stats.xp, 120);
    }

    #[test]
    fn test_orb_value() {
        let b = Bonuses::new(100, false);
        // floor(3*1.1)=3, floor(3*2.0)=6
        assert_eq!(orb_value(3, 2, false, &b), 6);
        // hard mode skips the permanent XP factor
        assert_eq!(orb_value(3, 2, true, &b), 3);
    }

    #[test]
    fn test_tier_chances_capped() {
        let (s, e) = tier_chances(&Difficulty {
            frenzy: 5,
            hard: true,
            endless_level: 0,
        });
        assert!(close(s, 0.34));
        assert_eq!(e, 1.0);
    }

    proptest! {
        #[test]
        fn test_cooldown_never_below_floor(
            base in 1.0f64..20000.0,
            level in 1u32..=5,
            haste in 0u32..=5,
            levels in 0u32..2000,
            hard in any::<bool>(),
        ) {
            let b = Bonuses::new(levels, hard);
            for decay in [CooldownDecay::Geometric, CooldownDecay::Hyperbolic] {
                let cd = effective_cooldown(base, level, decay, haste, &b);
                prop_assert!(cd >= base * COOLDOWN_FLOOR - 1e-9);
            }
        }

        #[test]
        fn test_hard_bonus_is_one_fifth(levels in 0u32..2000) {
            let normal = Bonuses::new(levels, false);
            let hard = Bonuses::new(levels, true);
            prop_assert!(((hard.damage - 1.0) - (normal.damage - 1.0) * 0.2).abs() < 1e-4);
            prop_assert!(((1.0 - hard.cooldown) - (1.0 - normal.cooldown) * 0.2).abs() < 1e-4);
        }
    }
}
