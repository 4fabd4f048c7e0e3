//! Experience and level tracking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 100;

/// Errors from experience bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("Experience amount cannot be negative: {0}")]
    NegativeExperience(i64),
}

/// How much experience each level costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum ExperienceCurve {
    /// Every level costs the same.
    Linear { base_xp: u64 },
    /// Level `n` costs `base_xp * multiplier^(n-1)`, truncated.
    Exponential { base_xp: u64, multiplier: f64 },
}

impl ExperienceCurve {
    /// Experience needed to advance from `level` to `level + 1`.
    ///
    /// Never less than 1. Unreachable at [`MAX_LEVEL`] and above.
    pub fn xp_for_next_level(&self, level: u32) -> u64 {
        if level >= MAX_LEVEL {
            return u64::MAX;
        }
        let needed = match *self {
            ExperienceCurve::Linear { base_xp } => base_xp,
            ExperienceCurve::Exponential {
                base_xp,
                multiplier,
            } => {
                let exponent = level.saturating_sub(1) as i32;
                let raw = base_xp as f64 * multiplier.powi(exponent);
                if raw.is_finite() && raw >= 0.0 {
                    raw.trunc().min(u64::MAX as f64) as u64
                } else if raw.is_sign_positive() {
                    u64::MAX
                } else {
                    0
                }
            }
        };
        needed.max(1)
    }
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        ExperienceCurve::Exponential {
            base_xp: 100,
            multiplier: 1.2,
        }
    }
}

/// Levels reached by a single experience gain, in the order they were reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelGain {
    pub levels: Vec<u32>,
}

impl LevelGain {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn count(&self) -> usize {
        self.levels.len()
    }

    /// Notify every listener of every level reached.
    pub fn notify(&self, listeners: &mut LevelUpListeners) {
        for &level in &self.levels {
            listeners.notify(level);
        }
    }
}

/// A character's level and the experience banked toward the next one.
///
/// Two levels are equal when level and experience match; the curve is not
/// part of the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    level: u32,
    experience: u64,
    #[serde(default)]
    curve: ExperienceCurve,
}

impl Level {
    pub fn new(curve: ExperienceCurve) -> Self {
        Self {
            level: 1,
            experience: 0,
            curve,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn curve(&self) -> ExperienceCurve {
        self.curve
    }

    pub fn xp_for_next_level(&self) -> u64 {
        self.curve.xp_for_next_level(self.level)
    }

    /// Bank experience and resolve every level-up it pays for.
    ///
    /// Stops at [`MAX_LEVEL`]; experience past that point is kept below the
    /// (unreachable) next threshold.
    pub fn gain_experience(&mut self, amount: i64) -> Result<LevelGain, LevelError> {
        if amount < 0 {
            return Err(LevelError::NegativeExperience(amount));
        }

        self.experience = self.experience.saturating_add(amount as u64);

        let mut gain = LevelGain::default();
        while self.level < MAX_LEVEL {
            let needed = self.xp_for_next_level();
            if self.experience < needed {
                break;
            }
            self.experience -= needed;
            self.level += 1;
            gain.levels.push(self.level);
        }
        if self.level >= MAX_LEVEL {
            self.experience = self.experience.min(u64::MAX - 1);
        }
        Ok(gain)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new(ExperienceCurve::default())
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.experience == other.experience
    }
}

impl Eq for Level {}

/// Something that wants to hear about level ups.
pub trait LevelUpListener: Send {
    fn name(&self) -> &str;
    fn on_level_up(&mut self, level: u32);
}

/// Registered listeners, invoked synchronously in registration order.
#[derive(Default)]
pub struct LevelUpListeners {
    listeners: Vec<Box<dyn LevelUpListener>>,
}

impl LevelUpListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: impl LevelUpListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify(&mut self, level: u32) {
        for listener in &mut self.listeners {
            listener.on_level_up(level);
        }
    }
}

impl std::fmt::Debug for LevelUpListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Logs every level up.
#[derive(Debug, Default)]
pub struct LogLevelUp;

impl LevelUpListener for LogLevelUp {
    fn name(&self) -> &str {
        "log"
    }

    fn on_level_up(&mut self, level: u32) {
        tracing::info!(level, "player reached a new level");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, u32)>>>,
    }

    impl LevelUpListener for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_level_up(&mut self, level: u32) {
            self.seen.lock().unwrap().push((self.name, level));
        }
    }

    #[test]
    fn test_exponential_curve() {
        let curve = ExperienceCurve::default();
        assert_eq!(curve.xp_for_next_level(1), 100);
        assert_eq!(curve.xp_for_next_level(2), 120);
        assert_eq!(curve.xp_for_next_level(3), 144);
        // 100 * 1.2^3 = 172.8, truncated
        assert_eq!(curve.xp_for_next_level(4), 172);
    }

    #[test]
    fn test_degenerate_curve_floors_at_one() {
        assert_eq!(ExperienceCurve::Linear { base_xp: 0 }.xp_for_next_level(5), 1);
    }

    #[test]
    fn test_gain_single_level() {
        let mut level = Level::new(ExperienceCurve::Linear { base_xp: 100 });
        let gain = level.gain_experience(150).unwrap();
        assert_eq!(gain.levels, vec![2]);
        assert_eq!(level.level(), 2);
        assert_eq!(level.experience(), 50);
    }

    #[test]
    fn test_gain_multiple_levels_exponential() {
        let mut level = Level::default();
        // 100 + 120 + 144 = 364, 10 left over
        let gain = level.gain_experience(374).unwrap();
        assert_eq!(gain.levels, vec![2, 3, 4]);
        assert_eq!(level.experience(), 10);
        assert!(level.experience() < level.xp_for_next_level());
    }

    #[test]
    fn test_gain_conserves_experience() {
        for amount in [0i64, 1, 99, 100, 101, 543, 10_000] {
            let mut level = Level::default();
            let mut spent = 0u64;
            let mut current = level.level();
            let gain = level.gain_experience(amount).unwrap();
            for _ in &gain.levels {
                spent += ExperienceCurve::default().xp_for_next_level(current);
                current += 1;
            }
            assert_eq!(spent + level.experience(), amount as u64);
            assert!(level.experience() < level.xp_for_next_level());
        }
    }

    #[test]
    fn test_cheap_curve_stops_at_max_level() {
        let mut level = Level::new(ExperienceCurve::Linear { base_xp: 1 });
        let gain = level.gain_experience(i64::MAX).unwrap();

        assert_eq!(level.level(), MAX_LEVEL);
        assert_eq!(gain.count(), (MAX_LEVEL - 1) as usize);
        assert_eq!(gain.levels.last(), Some(&MAX_LEVEL));
        assert!(level.experience() < level.xp_for_next_level());

        // Nothing further to gain
        assert!(level.gain_experience(i64::MAX).unwrap().is_empty());
        assert_eq!(level.level(), MAX_LEVEL);
    }

    #[test]
    fn test_shrinking_curve_is_bounded() {
        let curve = ExperienceCurve::Exponential {
            base_xp: 100,
            multiplier: 0.5,
        };
        let mut level = Level::new(curve);
        let gain = level.gain_experience(1_000_000).unwrap();
        assert_eq!(level.level(), MAX_LEVEL);
        assert_eq!(gain.count(), (MAX_LEVEL - 1) as usize);
    }

    #[test]
    fn test_negative_experience_rejected() {
        let mut level = Level::default();
        level.gain_experience(50).unwrap();
        let before = level.clone();

        let err = level.gain_experience(-1).unwrap_err();
        assert_eq!(err, LevelError::NegativeExperience(-1));
        assert!(err.to_string().contains("-1"));
        assert_eq!(level, before);
    }

    #[test]
    fn test_equality_ignores_curve() {
        let a = Level::new(ExperienceCurve::Linear { base_xp: 100 });
        let b = Level::new(ExperienceCurve::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_listeners_called_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = LevelUpListeners::new();
        listeners.register(Recorder {
            name: "first",
            seen: seen.clone(),
        });
        listeners.register(Recorder {
            name: "second",
            seen: seen.clone(),
        });
        assert_eq!(listeners.names(), vec!["first", "second"]);

        let mut level = Level::new(ExperienceCurve::Linear { base_xp: 10 });
        level.gain_experience(25).unwrap().notify(&mut listeners);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 2), ("second", 2), ("first", 3), ("second", 3)]
        );
    }
}
