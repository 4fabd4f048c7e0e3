//! Tabletop dice rolling.
//!
//! Supports the notation `[N]dS[+M|-M]`: an optional die count (default 1),
//! a required number of sides and an optional flat modifier. Sides and count
//! can also be supplied at runtime through [`DiceExpression::new`], which is
//! how enemy attacks roll `<attacks_per_turn>d<attack_max>`.
//!
//! Every roll draws from a [`RandomSource`], so a whole session can share one
//! seeded generator and replay deterministically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice expression: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Source of uniform random integers.
///
/// Both bounds are inclusive. Implementations must return a value inside
/// `[low, high]` whenever `low <= high`.
pub trait RandomSource {
    fn range(&mut self, low: i32, high: i32) -> i32;

    /// A percentage roll in `[1, 100]`.
    fn percent(&mut self) -> i32 {
        self.range(1, 100)
    }
}

/// The default random source, backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct GameRng(StdRng);

impl GameRng {
    /// A generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// A reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for GameRng {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.0.gen_range(low..=high)
    }
}

/// A parsed dice expression (e.g., `2d6+3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpression {
    /// Build an expression from runtime values.
    pub fn new(count: u32, sides: u32, modifier: i32) -> Result<Self, DiceError> {
        if count == 0 {
            return Err(DiceError::NoDice);
        }
        if sides == 0 {
            return Err(DiceError::InvalidDieSize(sides));
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// `<count>d<sides>` with no modifier. Zero is raised to one for both,
    /// so this never fails.
    pub fn pool(count: u32, sides: u32) -> Self {
        Self {
            count: count.max(1),
            sides: sides.max(1),
            modifier: 0,
        }
    }

    /// Parse a dice notation string.
    ///
    /// The whole string must match; trailing garbage such as `2d6x` is
    /// rejected.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }
        let invalid = || DiceError::InvalidNotation(notation.clone());

        let d_pos = notation.find('d').ok_or_else(invalid)?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            parse_digits(count_str).ok_or_else(invalid)?
        };

        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(sign_pos) => {
                let magnitude: i32 = parse_digits(&rest[sign_pos + 1..]).ok_or_else(invalid)?;
                let modifier = if rest.as_bytes()[sign_pos] == b'-' {
                    -magnitude
                } else {
                    magnitude
                };
                (&rest[..sign_pos], modifier)
            }
            None => (rest, 0),
        };

        let sides: u32 = parse_digits(sides_str).ok_or_else(invalid)?;

        Self::new(count, sides, modifier)
    }

    /// Smallest possible total.
    pub fn min(&self) -> i64 {
        self.count as i64 + self.modifier as i64
    }

    /// Largest possible total.
    pub fn max(&self) -> i64 {
        self.count as i64 * self.sides as i64 + self.modifier as i64
    }

    /// Roll the expression against a random source.
    pub fn roll_with(&self, rng: &mut dyn RandomSource) -> RollResult {
        let sides = i32::try_from(self.sides).unwrap_or(i32::MAX);
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.range(1, sides).clamp(1, sides) as u32)
            .collect();

        let dice_total: i64 = rolls.iter().map(|r| *r as i64).sum();
        let total = (dice_total + self.modifier as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;

        RollResult {
            expression: *self,
            rolls,
            total,
        }
    }
}

/// Digits only; rejects signs and whitespace that `str::parse` would accept.
fn parse_digits<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let dice_str = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let modifier = self.expression.modifier;
        if modifier > 0 {
            format!("{dice_str} + {modifier}")
        } else if modifier < 0 {
            format!("{} - {}", dice_str, modifier.abs())
        } else {
            dice_str
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll(notation: &str, rng: &mut dyn RandomSource) -> Result<i32, DiceError> {
    let expr = DiceExpression::parse(notation)?;
    Ok(expr.roll_with(rng).total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRandom;

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert_eq!(expr.count, 1);
        assert_eq!(expr.sides, 20);
        assert_eq!(expr.modifier, 0);
    }

    #[test]
    fn test_parse_optional_count() {
        let expr = DiceExpression::parse("d8").unwrap();
        assert_eq!(expr.count, 1);
        assert_eq!(expr.sides, 8);
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse("1d20+5").unwrap();
        assert_eq!(expr.modifier, 5);

        let expr = DiceExpression::parse(" 3D8-2 ").unwrap();
        assert_eq!(expr.count, 3);
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn test_parse_rejects_bad_grammar() {
        for bad in ["", "20", "2d", "2d6x", "2d6+", "d+3", "-1d6", "2d6+1d4", "2 d6", "1d0"] {
            assert!(DiceExpression::parse(bad).is_err(), "{bad:?} should not parse");
        }
        assert_eq!(
            DiceExpression::parse("1d0").unwrap_err(),
            DiceError::InvalidDieSize(0)
        );
    }

    #[test]
    fn test_large_count_parses_and_rolls_every_die() {
        let expr = DiceExpression::parse("5000d6").unwrap();
        assert_eq!(expr.count, 5000);

        let mut rng = ScriptedRandom::new(std::iter::repeat(3).take(5000));
        let result = expr.roll_with(&mut rng);
        assert_eq!(result.rolls.len(), 5000);
        assert_eq!(result.total, 15000);
    }

    #[test]
    fn test_runtime_expression() {
        let expr = DiceExpression::new(3, 7, 0).unwrap();
        assert_eq!(expr.to_string(), "3d7");
        assert!(DiceExpression::new(0, 7, 0).is_err());

        assert_eq!(DiceExpression::pool(4, 9).to_string(), "4d9");
        assert_eq!(DiceExpression::pool(0, 0).to_string(), "1d1");
    }

    #[test]
    fn test_roll_range() {
        let mut rng = GameRng::seeded(7);
        for notation in ["1d20", "2d6+3", "4d4-2", "d100"] {
            let expr = DiceExpression::parse(notation).unwrap();
            for _ in 0..200 {
                let total = expr.roll_with(&mut rng).total as i64;
                assert!(total >= expr.min() && total <= expr.max(), "{notation} gave {total}");
            }
        }
    }

    #[test]
    fn test_seeded_rolls_repeat() {
        let mut a = GameRng::seeded(42);
        let mut b = GameRng::seeded(42);
        let first: Vec<i32> = (0..20).map(|_| roll("3d6", &mut a).unwrap()).collect();
        let second: Vec<i32> = (0..20).map(|_| roll("3d6", &mut b).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scripted_roll() {
        let mut rng = ScriptedRandom::new([2, 5]);
        let result = DiceExpression::parse("2d6+1").unwrap().roll_with(&mut rng);
        assert_eq!(result.rolls, vec![2, 5]);
        assert_eq!(result.total, 8);
        assert_eq!(result.to_string(), "[2, 5] + 1 = 8");
    }

    #[test]
    fn test_invalid_roll_draws_nothing() {
        let mut rng = ScriptedRandom::new([4]);
        assert!(roll("bogus", &mut rng).is_err());
        assert_eq!(rng.remaining(), 1);
    }
}
