//! Turn-based combat between the player character and one enemy.
//!
//! Each round the player picks an action, then the enemy answers if it is
//! still standing. Random draws happen in a fixed order so seeded or
//! scripted sources replay exactly:
//!
//! - attack: `1d20`, then the attack skill roll
//! - run: `1d20`, then the escape skill roll
//! - enemy turn: the defense skill roll, special-attack trigger rolls,
//!   then for a triggered special its critical roll and `1d<attack_max>`,
//!   then the normal attack's critical roll and
//!   `<attacks_per_turn>d<attack_max>`
//!
//! Skill rolls with a zero class modifier draw nothing.

use crate::character::Character;
use crate::console::Console;
use crate::dice::{DiceExpression, RandomSource};
use crate::enemy::Enemy;
use crate::items::{Item, Weapon};
use crate::progression::LevelGain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Experience awarded for winning a fight.
pub const VICTORY_EXPERIENCE: i64 = 100;

/// Defense points that would cancel all incoming damage.
pub const DEFENSE_DIVISOR: f64 = 25.0;

/// Damage multiplier for critical hits.
pub const CRITICAL_MULTIPLIER: f64 = 2.0;

/// Where an encounter stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStatus {
    Ongoing,
    PlayerVictory,
    PlayerDefeat,
    PlayerFled,
}

impl CombatStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, CombatStatus::Ongoing)
    }
}

/// What the player can do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    Attack,
    UsePotion,
    Run,
}

impl CombatAction {
    pub fn all() -> [CombatAction; 3] {
        [CombatAction::Attack, CombatAction::UsePotion, CombatAction::Run]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CombatAction::Attack => "attack",
            CombatAction::UsePotion => "use potion",
            CombatAction::Run => "run",
        }
    }
}

/// Tunables for the combat loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatConfig {
    pub victory_experience: i64,
    /// Whether drinking a potion hands the turn to the enemy.
    pub potion_consumes_round: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            victory_experience: VICTORY_EXPERIENCE,
            potion_consumes_round: true,
        }
    }
}

/// Something that happened during a round.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    PlayerHit {
        damage: i32,
        weapon: Option<String>,
        enemy: String,
    },
    PotionUsed {
        name: String,
        healed: i32,
    },
    NoPotions,
    EscapeFailed {
        roll: i32,
        difficulty: i32,
    },
    Fled,
    EnemySpecial {
        enemy: String,
        attack: String,
        damage: i32,
        critical: bool,
    },
    EnemyHit {
        enemy: String,
        damage: i32,
        critical: bool,
    },
    Victory {
        enemy: String,
        experience: i64,
    },
    LootFound(Vec<Item>),
    Defeat {
        enemy: String,
        lost_weapon: Option<String>,
    },
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::PlayerHit {
                damage,
                weapon,
                enemy,
            } => match weapon {
                Some(weapon) => write!(f, "You strike {enemy} with your {weapon} for {damage} damage!"),
                None => write!(f, "You strike {enemy} for {damage} damage!"),
            },
            CombatEvent::PotionUsed { name, healed } => {
                write!(f, "You drink the {name} and recover {healed} HP.")
            }
            CombatEvent::NoPotions => write!(f, "No potions left!"),
            CombatEvent::EscapeFailed { .. } => write!(f, "You fail to escape!"),
            CombatEvent::Fled => write!(f, "You manage to flee safely!"),
            CombatEvent::EnemySpecial {
                enemy,
                attack,
                damage,
                critical,
            } => {
                let crit = if *critical { " Critical hit!" } else { "" };
                write!(f, "{enemy} uses {attack} for {damage} damage!{crit}")
            }
            CombatEvent::EnemyHit {
                enemy,
                damage,
                critical,
            } => {
                let crit = if *critical { " Critical hit!" } else { "" };
                write!(f, "{enemy} attacks you for {damage} damage!{crit}")
            }
            CombatEvent::Victory { enemy, experience } => {
                write!(f, "You defeated {enemy}! (+{experience} XP)")
            }
            CombatEvent::LootFound(items) => {
                write!(f, "You find some loot:")?;
                for item in items {
                    write!(f, "\n  - {item}")?;
                }
                Ok(())
            }
            CombatEvent::Defeat { lost_weapon, .. } => {
                write!(f, "You have been defeated!")?;
                if let Some(weapon) = lost_weapon {
                    write!(f, " Your {weapon} is lost.")?;
                }
                Ok(())
            }
        }
    }
}

/// The outcome of one call to [`Encounter::play_round`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundReport {
    pub events: Vec<CombatEvent>,
    /// Whether the round counted; a turn with no potions to drink does not.
    pub consumed: bool,
}

/// Final result of an encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatResult {
    pub status: CombatStatus,
    pub enemy: String,
    pub rounds: u32,
    pub experience: i64,
    pub level_gain: LevelGain,
    pub loot: Vec<Item>,
    pub lost_weapon: Option<Weapon>,
}

/// A single fight against one enemy.
#[derive(Debug, Clone)]
pub struct Encounter {
    enemy: Enemy,
    loot: Vec<Item>,
    config: CombatConfig,
    status: CombatStatus,
    rounds: u32,
    experience: i64,
    level_gain: LevelGain,
    awarded_loot: Vec<Item>,
    lost_weapon: Option<Weapon>,
}

impl Encounter {
    pub fn new(enemy: Enemy, loot: Vec<Item>, config: CombatConfig) -> Self {
        Self {
            enemy,
            loot,
            config,
            status: CombatStatus::Ongoing,
            rounds: 0,
            experience: 0,
            level_gain: LevelGain::default(),
            awarded_loot: Vec::new(),
            lost_weapon: None,
        }
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn status(&self) -> CombatStatus {
        self.status
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Resolve one player action and, if the fight goes on, the enemy's reply.
    pub fn play_round(
        &mut self,
        character: &mut Character,
        action: CombatAction,
        rng: &mut dyn RandomSource,
    ) -> RoundReport {
        let mut report = RoundReport::default();
        report.events.extend(self.settle(character));
        if self.status.is_over() {
            return report;
        }

        match action {
            CombatAction::Attack => {
                let roll = d20(rng);
                let damage = roll + character.compute_attack(rng);
                self.enemy.apply_damage(damage);
                tracing::debug!(roll, damage, enemy_hp = self.enemy.hp, "player attack");
                report.events.push(CombatEvent::PlayerHit {
                    damage,
                    weapon: character.best_weapon().map(|w| w.base.name.clone()),
                    enemy: self.enemy.name.clone(),
                });
            }
            CombatAction::UsePotion => match character.inventory.take_last_potion() {
                Some(potion) => {
                    let healed = character.apply_heal(potion.potency);
                    report.events.push(CombatEvent::PotionUsed {
                        name: potion.base.name,
                        healed,
                    });
                    if !self.config.potion_consumes_round {
                        return report;
                    }
                }
                None => {
                    report.events.push(CombatEvent::NoPotions);
                    return report;
                }
            },
            CombatAction::Run => {
                let roll = d20(rng) + character.compute_escape(rng);
                if roll >= self.enemy.escape_difficulty {
                    tracing::debug!(roll, difficulty = self.enemy.escape_difficulty, "escape succeeded");
                    self.rounds += 1;
                    self.status = CombatStatus::PlayerFled;
                    report.consumed = true;
                    report.events.push(CombatEvent::Fled);
                    return report;
                }
                report.events.push(CombatEvent::EscapeFailed {
                    roll,
                    difficulty: self.enemy.escape_difficulty,
                });
            }
        }

        if self.enemy.is_alive() {
            report.events.extend(self.enemy_turn(character, rng));
        }

        self.rounds += 1;
        report.consumed = true;
        report.events.extend(self.settle(character));
        report
    }

    /// Fight until someone falls or the player gets away.
    pub fn run(
        &mut self,
        character: &mut Character,
        console: &mut dyn Console,
        rng: &mut dyn RandomSource,
    ) -> CombatResult {
        for event in self.settle(character) {
            console.show(&event.to_string());
        }

        let labels: Vec<String> = CombatAction::all()
            .iter()
            .map(|a| a.label().to_string())
            .collect();

        while !self.status.is_over() {
            console.show(&format!(
                "Your HP: {}/{} | {} HP: {}",
                character.hp(),
                character.max_hp(),
                self.enemy.name,
                self.enemy.hp
            ));
            let choice = console.choose("Choose your action", &labels);
            let action = CombatAction::all()[choice.clamp(1, labels.len()) - 1];
            let report = self.play_round(character, action, rng);
            for event in &report.events {
                console.show(&event.to_string());
            }
        }

        self.result()
    }

    /// Snapshot of the outcome so far.
    pub fn result(&self) -> CombatResult {
        CombatResult {
            status: self.status,
            enemy: self.enemy.name.clone(),
            rounds: self.rounds,
            experience: self.experience,
            level_gain: self.level_gain.clone(),
            loot: self.awarded_loot.clone(),
            lost_weapon: self.lost_weapon.clone(),
        }
    }

    fn enemy_turn(&mut self, character: &mut Character, rng: &mut dyn RandomSource) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let defense = character.compute_defense(rng);
        let mitigation = (1.0 - defense as f64 / DEFENSE_DIVISOR).max(0.0);

        if let Some(special) = self.enemy.select_special_attack(rng) {
            let critical = self.roll_critical(rng);
            let base = self.roll_attack(1, rng);
            let damage = scale(base, critical, special.damage_multiplier * mitigation);
            character.apply_damage(damage);
            self.enemy.commit_special_attack(&special);
            tracing::debug!(attack = %special.name, base, damage, critical, "enemy special attack");
            events.push(CombatEvent::EnemySpecial {
                enemy: self.enemy.name.clone(),
                attack: special.name,
                damage,
                critical,
            });
        }

        let critical = self.roll_critical(rng);
        let base = self.roll_attack(self.enemy.attacks_per_turn, rng);
        let damage = scale(base, critical, mitigation);
        character.apply_damage(damage);
        tracing::debug!(base, damage, critical, defense, player_hp = character.hp(), "enemy attack");
        events.push(CombatEvent::EnemyHit {
            enemy: self.enemy.name.clone(),
            damage,
            critical,
        });

        self.enemy.tick_cooldowns();
        events
    }

    fn roll_critical(&self, rng: &mut dyn RandomSource) -> bool {
        rng.percent() <= self.enemy.critical_hit_chance
    }

    fn roll_attack(&self, count: u32, rng: &mut dyn RandomSource) -> i32 {
        let sides = u32::try_from(self.enemy.attack_max).unwrap_or(1);
        DiceExpression::pool(count, sides).roll_with(rng).total
    }

    /// Apply the terminal transition if either side has dropped.
    fn settle(&mut self, character: &mut Character) -> Vec<CombatEvent> {
        if self.status.is_over() {
            return Vec::new();
        }

        if !character.is_alive() {
            self.status = CombatStatus::PlayerDefeat;
            self.lost_weapon = character.drop_best_weapon();
            tracing::info!(enemy = %self.enemy.name, rounds = self.rounds, "player defeated");
            return vec![CombatEvent::Defeat {
                enemy: self.enemy.name.clone(),
                lost_weapon: self.lost_weapon.as_ref().map(|w| w.base.name.clone()),
            }];
        }

        if !self.enemy.is_alive() {
            self.status = CombatStatus::PlayerVictory;
            let mut events = vec![CombatEvent::Victory {
                enemy: self.enemy.name.clone(),
                experience: self.config.victory_experience,
            }];

            match character.gain_experience(self.config.victory_experience) {
                Ok(gain) => {
                    self.experience = self.config.victory_experience;
                    self.level_gain = gain;
                }
                Err(e) => tracing::warn!(error = %e, "victory experience rejected"),
            }

            let loot = std::mem::take(&mut self.loot);
            for item in &loot {
                character.add_item(item.clone());
            }
            if !loot.is_empty() {
                events.push(CombatEvent::LootFound(loot.clone()));
            }
            self.awarded_loot = loot;

            tracing::info!(enemy = %self.enemy.name, rounds = self.rounds, "player victorious");
            return events;
        }

        Vec::new()
    }
}

fn d20(rng: &mut dyn RandomSource) -> i32 {
    rng.range(1, 20).clamp(1, 20)
}

/// `round(base * crit * factor)`, never negative.
fn scale(base: i32, critical: bool, factor: f64) -> i32 {
    let crit = if critical { CRITICAL_MULTIPLIER } else { 1.0 };
    let damage = (base as f64 * crit * factor).round();
    damage.clamp(0.0, i32::MAX as f64) as i32
}
