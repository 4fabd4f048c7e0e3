//! Scene directives and the generator that produces them.
//!
//! The narrative text comes from an external text service. The engine only
//! sees the structured directives defined here and checks that they are
//! safe to index before acting on them.

use crate::enemy::{Enemy, EnemyError};
use crate::items::{Item, MAX_ITEM_BONUS};
use crate::world::{GameState, SceneType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest options a scene may offer.
pub const MIN_OPTIONS: usize = 2;

/// Most options a scene may offer.
pub const MAX_OPTIONS: usize = 5;

/// Most loot items a combat setup may carry.
pub const MAX_LOOT: usize = 3;

/// A directive that cannot be acted on.
#[derive(Debug, Error, PartialEq)]
pub enum DirectiveError {
    #[error("Scene offers no options")]
    NoOptions,

    #[error("Scene offers {0} option, at least {MIN_OPTIONS} required")]
    TooFewOptions(usize),

    #[error("Scene offers {0} options, at most {MAX_OPTIONS} allowed")]
    TooManyOptions(usize),

    #[error("{options} options but {scenes} next scene types")]
    OptionCountMismatch { options: usize, scenes: usize },

    #[error("Combat setup carries {0} loot items, at most {MAX_LOOT} allowed")]
    TooMuchLoot(usize),

    #[error("Loot weapon '{name}' has damage {damage}, expected 0-{MAX_ITEM_BONUS}")]
    LootDamage { name: String, damage: i32 },

    #[error("Loot armor '{name}' has defense {defense}, expected 0-{MAX_ITEM_BONUS}")]
    LootDefense { name: String, defense: i32 },

    #[error("Loot potion '{name}' has negative potency {potency}")]
    LootPotency { name: String, potency: i32 },

    #[error("Invalid enemy: {0}")]
    Enemy(#[from] EnemyError),
}

/// Errors from a scene generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generator request failed: {0}")]
    Request(String),

    #[error("Generator has no scripted {0} left")]
    Exhausted(String),

    #[error("Generator output rejected after {attempts} attempts: {source}")]
    Rejected {
        attempts: u32,
        #[source]
        source: DirectiveError,
    },
}

// ============================================================================
// Directives
// ============================================================================

/// One scene's worth of narrative plus branching data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDirective {
    pub narrative: String,
    /// One-line summary recorded in the history log.
    pub summary: String,
    pub options: Vec<String>,
    /// Scene tag for each option, by index.
    pub next_scene_type: Vec<String>,

    /// Who is speaking in a dialogue scene.
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub quest: Option<String>,
    #[serde(default)]
    pub discoveries: Vec<String>,
}

impl SceneDirective {
    pub fn new(narrative: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }

    /// Add an option together with the scene it leads to.
    pub fn with_option(mut self, option: impl Into<String>, next: impl Into<String>) -> Self {
        self.options.push(option.into());
        self.next_scene_type.push(next.into());
        self
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather = Some(weather.into());
        self
    }

    pub fn with_quest(mut self, quest: impl Into<String>) -> Self {
        self.quest = Some(quest.into());
        self
    }

    pub fn with_discovery(mut self, discovery: impl Into<String>) -> Self {
        self.discoveries.push(discovery.into());
        self
    }

    pub fn validate(&self) -> Result<(), DirectiveError> {
        check_options(self.options.len())?;
        if self.options.len() != self.next_scene_type.len() {
            return Err(DirectiveError::OptionCountMismatch {
                options: self.options.len(),
                scenes: self.next_scene_type.len(),
            });
        }
        Ok(())
    }

    /// Option text and scene tag for a 1-based choice.
    pub fn choice(&self, choice: usize) -> Option<(&str, &str)> {
        let index = choice.checked_sub(1)?;
        let option = self.options.get(index)?;
        let next = self.next_scene_type.get(index)?;
        Some((option.as_str(), next.as_str()))
    }
}

/// A single answer to a puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleOption {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    pub next_scene_type: String,
}

impl PuzzleOption {
    pub fn new(text: impl Into<String>, correct: bool, next: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            correct,
            next_scene_type: next.into(),
        }
    }
}

/// A riddle or mechanism with a set of attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PuzzleDirective {
    pub narrative: String,
    pub prompt: String,
    pub summary: String,
    pub options: Vec<PuzzleOption>,
}

impl PuzzleDirective {
    pub fn new(narrative: impl Into<String>, prompt: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            prompt: prompt.into(),
            summary: summary.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: PuzzleOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn validate(&self) -> Result<(), DirectiveError> {
        check_options(self.options.len())
    }
}

/// The enemy and rewards for one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSetup {
    pub narrative: String,
    pub enemy: Enemy,
    #[serde(default)]
    pub loot: Vec<Item>,
}

impl CombatSetup {
    pub fn new(narrative: impl Into<String>, enemy: Enemy) -> Self {
        Self {
            narrative: narrative.into(),
            enemy,
            loot: Vec::new(),
        }
    }

    pub fn with_loot(mut self, item: impl Into<Item>) -> Self {
        self.loot.push(item.into());
        self
    }

    pub fn validate(&self) -> Result<(), DirectiveError> {
        self.enemy.validate()?;
        if self.loot.len() > MAX_LOOT {
            return Err(DirectiveError::TooMuchLoot(self.loot.len()));
        }
        self.loot.iter().try_for_each(check_loot)
    }
}

fn check_loot(item: &Item) -> Result<(), DirectiveError> {
    let bonus = 0..=MAX_ITEM_BONUS;
    match item {
        Item::Weapon(weapon) if !bonus.contains(&weapon.damage) => Err(DirectiveError::LootDamage {
            name: weapon.base.name.clone(),
            damage: weapon.damage,
        }),
        Item::Armor(armor) if !bonus.contains(&armor.defense) => Err(DirectiveError::LootDefense {
            name: armor.base.name.clone(),
            defense: armor.defense,
        }),
        Item::Potion(potion) if potion.potency < 0 => Err(DirectiveError::LootPotency {
            name: potion.base.name.clone(),
            potency: potion.potency,
        }),
        _ => Ok(()),
    }
}

fn check_options(count: usize) -> Result<(), DirectiveError> {
    match count {
        0 => Err(DirectiveError::NoOptions),
        n if n < MIN_OPTIONS => Err(DirectiveError::TooFewOptions(n)),
        n if n > MAX_OPTIONS => Err(DirectiveError::TooManyOptions(n)),
        _ => Ok(()),
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Source of scene content.
///
/// Implementations receive a read-only view of the game state and return
/// raw directives; the scene handlers validate them and re-request on
/// invalid output.
#[async_trait]
pub trait SceneGenerator: Send {
    /// Narration, exploration, dialogue and camp scenes.
    async fn scene(&mut self, kind: SceneType, state: &GameState) -> Result<SceneDirective, GeneratorError>;

    async fn puzzle(&mut self, state: &GameState) -> Result<PuzzleDirective, GeneratorError>;

    async fn combat_setup(&mut self, state: &GameState) -> Result<CombatSetup, GeneratorError>;

    /// Background lore for the narrator. Generators without a lore source
    /// return `None`.
    async fn lore(&mut self, _state: &GameState) -> Result<Option<String>, GeneratorError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::SpecialAttack;
    use crate::items::{Armor, Potion, Weapon, WeaponType};

    #[test]
    fn test_scene_validation() {
        let scene = SceneDirective::new("The road forks.", "A fork")
            .with_option("Go left", "exploration")
            .with_option("Go right", "combat");
        assert!(scene.validate().is_ok());
        assert_eq!(scene.choice(2), Some(("Go right", "combat")));
        assert_eq!(scene.choice(0), None);
        assert_eq!(scene.choice(3), None);

        let empty = SceneDirective::new("Nothing", "Nothing");
        assert_eq!(empty.validate(), Err(DirectiveError::NoOptions));

        let lonely = SceneDirective::new("A dead end.", "Dead end").with_option("Turn back", "narration");
        assert_eq!(lonely.validate(), Err(DirectiveError::TooFewOptions(1)));
    }

    #[test]
    fn test_scene_length_mismatch() {
        let mut scene = SceneDirective::new("n", "s")
            .with_option("a", "narration")
            .with_option("b", "camp");
        scene.next_scene_type.push("combat".to_string());
        assert_eq!(
            scene.validate(),
            Err(DirectiveError::OptionCountMismatch { options: 2, scenes: 3 })
        );
    }

    #[test]
    fn test_too_many_options() {
        let mut scene = SceneDirective::new("n", "s");
        for i in 0..6 {
            scene = scene.with_option(format!("option {i}"), "narration");
        }
        assert_eq!(scene.validate(), Err(DirectiveError::TooManyOptions(6)));
    }

    #[test]
    fn test_scene_deserializes_with_optional_fields_missing() {
        let json = r#"{
            "narrative": "Rain falls.",
            "summary": "Rain",
            "options": ["Wait", "Walk on"],
            "next_scene_type": ["camp", "exploration"]
        }"#;
        let scene: SceneDirective = serde_json::from_str(json).unwrap();
        assert!(scene.location.is_none());
        assert!(scene.discoveries.is_empty());
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_combat_setup_validation() {
        let enemy = Enemy::new("Bandit", 15, 6, 10).with_special_attack(SpecialAttack::new("Feint", 20));
        let mut setup = CombatSetup::new("A bandit blocks the path.", enemy)
            .with_loot(Potion::healing("Tonic", 20));
        assert!(setup.validate().is_ok());

        for _ in 0..3 {
            setup = setup.with_loot(Item::gear("Coin"));
        }
        assert_eq!(setup.validate(), Err(DirectiveError::TooMuchLoot(4)));

        let bad = CombatSetup::new("A ghost.", Enemy::new("Ghost", 0, 4, 5));
        assert_eq!(
            bad.validate(),
            Err(DirectiveError::Enemy(EnemyError::NonPositiveHp(0)))
        );
    }

    #[test]
    fn test_combat_setup_loot_ranges() {
        let bandit = || Enemy::new("Bandit", 15, 6, 10);
        let fair = CombatSetup::new("Loot.", bandit())
            .with_loot(Weapon::new("Club", 0, WeaponType::Staff))
            .with_loot(Armor::new("Plate", MAX_ITEM_BONUS))
            .with_loot(Potion::healing("Water", 0));
        assert!(fair.validate().is_ok());

        let sharp = CombatSetup::new("Loot.", bandit()).with_loot(Weapon::new("Vorpal", 500, WeaponType::Sword));
        assert_eq!(
            sharp.validate(),
            Err(DirectiveError::LootDamage {
                name: "Vorpal".to_string(),
                damage: 500
            })
        );

        let blunt = CombatSetup::new("Loot.", bandit()).with_loot(Weapon::new("Rusty", -40, WeaponType::Axe));
        assert!(matches!(blunt.validate(), Err(DirectiveError::LootDamage { damage: -40, .. })));

        let wall = CombatSetup::new("Loot.", bandit()).with_loot(Armor::new("Fortress", 1000));
        assert!(matches!(wall.validate(), Err(DirectiveError::LootDefense { defense: 1000, .. })));

        let poison = CombatSetup::new("Loot.", bandit()).with_loot(Potion::healing("Bile", -5));
        assert!(matches!(poison.validate(), Err(DirectiveError::LootPotency { potency: -5, .. })));
    }

    #[test]
    fn test_puzzle_validation() {
        let puzzle = PuzzleDirective::new("A door", "What walks on four legs?", "Riddle door")
            .with_option(PuzzleOption::new("Man", true, "narration"))
            .with_option(PuzzleOption::new("Dog", false, "combat"));
        assert!(puzzle.validate().is_ok());
        assert_eq!(
            PuzzleDirective::new("n", "p", "s").validate(),
            Err(DirectiveError::NoOptions)
        );
    }
}
