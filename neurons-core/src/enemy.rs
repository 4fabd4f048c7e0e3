//! Enemies and their special-attack cooldowns.

use crate::dice::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of special attacks per enemy.
pub const MAX_SPECIAL_ATTACKS: usize = 3;

/// Most attacks per turn accepted from the combat setup generator.
pub const MAX_ATTACKS_PER_TURN: u32 = 20;

/// Problems with an enemy produced by the combat setup generator.
#[derive(Debug, Error, PartialEq)]
pub enum EnemyError {
    #[error("Enemy HP must be positive, got {0}")]
    NonPositiveHp(i32),
    #[error("Enemy attack_max must be at least 1, got {0}")]
    InvalidAttackMax(i32),
    #[error("Enemy attacks_per_turn must be within 1-{MAX_ATTACKS_PER_TURN}, got {0}")]
    InvalidAttacksPerTurn(u32),
    #[error("Critical hit chance must be within 0-100, got {0}")]
    InvalidCriticalChance(i32),
    #[error("Escape difficulty must be within 1-20, got {0}")]
    InvalidEscapeDifficulty(i32),
    #[error("At most {MAX_SPECIAL_ATTACKS} special attacks allowed, got {0}")]
    TooManySpecialAttacks(usize),
    #[error("Special attack '{name}' has invalid trigger chance {chance}")]
    InvalidTriggerChance { name: String, chance: i32 },
    #[error("Special attack '{name}' has invalid damage multiplier {multiplier}")]
    InvalidMultiplier { name: String, multiplier: f64 },
    #[error("Duplicate special attack name '{0}'")]
    DuplicateSpecialAttack(String),
}

/// A special attack an enemy may use instead of only its normal blows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAttack {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Percent chance per enemy turn, 0-100.
    pub trigger_chance: i32,
    #[serde(default = "default_damage_multiplier")]
    pub damage_multiplier: f64,
    /// Enemy turns before the attack can be used again.
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,
}

fn default_damage_multiplier() -> f64 {
    1.5
}

fn default_cooldown() -> u32 {
    3
}

impl SpecialAttack {
    pub fn new(name: impl Into<String>, trigger_chance: i32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            trigger_chance,
            damage_multiplier: default_damage_multiplier(),
            cooldown: default_cooldown(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// An opponent for a single encounter.
///
/// Every special attack starts on its full cooldown, so an enemy has to
/// wind up before its first special attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EnemyRecord")]
pub struct Enemy {
    pub name: String,
    pub description: String,
    pub hp: i32,
    pub attack_max: i32,
    pub attacks_per_turn: u32,
    /// Percent chance of a critical hit, 0-100.
    pub critical_hit_chance: i32,
    /// How hard the enemy is to flee from, 1-20.
    pub escape_difficulty: i32,
    special_attacks: Vec<SpecialAttack>,
    #[serde(skip)]
    cooldowns: HashMap<String, u32>,
}

#[derive(Deserialize)]
struct EnemyRecord {
    name: String,
    #[serde(default)]
    description: String,
    hp: i32,
    attack_max: i32,
    #[serde(default = "default_attacks_per_turn")]
    attacks_per_turn: u32,
    #[serde(default)]
    critical_hit_chance: i32,
    escape_difficulty: i32,
    #[serde(default)]
    special_attacks: Vec<SpecialAttack>,
}

fn default_attacks_per_turn() -> u32 {
    1
}

impl From<EnemyRecord> for Enemy {
    fn from(record: EnemyRecord) -> Self {
        let mut enemy = Enemy::new(record.name, record.hp, record.attack_max, record.escape_difficulty)
            .with_description(record.description)
            .with_attacks_per_turn(record.attacks_per_turn)
            .with_critical_hit_chance(record.critical_hit_chance);
        for attack in record.special_attacks {
            enemy = enemy.with_special_attack(attack);
        }
        enemy
    }
}

impl Enemy {
    pub fn new(name: impl Into<String>, hp: i32, attack_max: i32, escape_difficulty: i32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            hp,
            attack_max,
            attacks_per_turn: 1,
            critical_hit_chance: 0,
            escape_difficulty,
            special_attacks: Vec::new(),
            cooldowns: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_attacks_per_turn(mut self, attacks: u32) -> Self {
        self.attacks_per_turn = attacks;
        self
    }

    pub fn with_critical_hit_chance(mut self, chance: i32) -> Self {
        self.critical_hit_chance = chance;
        self
    }

    pub fn with_special_attack(mut self, attack: SpecialAttack) -> Self {
        self.cooldowns.insert(attack.name.clone(), attack.cooldown);
        self.special_attacks.push(attack);
        self
    }

    /// Check the ranges the combat loop relies on.
    pub fn validate(&self) -> Result<(), EnemyError> {
        if self.hp <= 0 {
            return Err(EnemyError::NonPositiveHp(self.hp));
        }
        if self.attack_max < 1 {
            return Err(EnemyError::InvalidAttackMax(self.attack_max));
        }
        if !(1..=MAX_ATTACKS_PER_TURN).contains(&self.attacks_per_turn) {
            return Err(EnemyError::InvalidAttacksPerTurn(self.attacks_per_turn));
        }
        if !(0..=100).contains(&self.critical_hit_chance) {
            return Err(EnemyError::InvalidCriticalChance(self.critical_hit_chance));
        }
        if !(1..=20).contains(&self.escape_difficulty) {
            return Err(EnemyError::InvalidEscapeDifficulty(self.escape_difficulty));
        }
        if self.special_attacks.len() > MAX_SPECIAL_ATTACKS {
            return Err(EnemyError::TooManySpecialAttacks(self.special_attacks.len()));
        }
        for (i, attack) in self.special_attacks.iter().enumerate() {
            if !(0..=100).contains(&attack.trigger_chance) {
                return Err(EnemyError::InvalidTriggerChance {
                    name: attack.name.clone(),
                    chance: attack.trigger_chance,
                });
            }
            if !attack.damage_multiplier.is_finite() || attack.damage_multiplier < 0.0 {
                return Err(EnemyError::InvalidMultiplier {
                    name: attack.name.clone(),
                    multiplier: attack.damage_multiplier,
                });
            }
            if self.special_attacks[..i].iter().any(|a| a.name == attack.name) {
                return Err(EnemyError::DuplicateSpecialAttack(attack.name.clone()));
            }
        }
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Lose HP, never below zero. Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let old = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        old - self.hp
    }

    pub fn special_attacks(&self) -> &[SpecialAttack] {
        &self.special_attacks
    }

    /// Turns left before the named attack is ready.
    pub fn cooldown_remaining(&self, name: &str) -> Option<u32> {
        self.cooldowns.get(name).copied()
    }

    /// Pick this turn's special attack: the first ready attack, in definition
    /// order, whose percent roll lands within its trigger chance.
    ///
    /// Only ready attacks draw a roll.
    pub fn select_special_attack(&self, rng: &mut dyn RandomSource) -> Option<SpecialAttack> {
        for attack in &self.special_attacks {
            if self.cooldown_remaining(&attack.name).unwrap_or(0) > 0 {
                continue;
            }
            if rng.percent() <= attack.trigger_chance {
                return Some(attack.clone());
            }
        }
        None
    }

    /// Put an attack that just fired back on its full cooldown.
    pub fn commit_special_attack(&mut self, attack: &SpecialAttack) {
        if let Some(configured) = self
            .special_attacks
            .iter()
            .find(|a| a.name == attack.name)
            .map(|a| a.cooldown)
        {
            self.cooldowns.insert(attack.name.clone(), configured);
        }
    }

    /// One enemy turn has passed.
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }
}
