//! Character creation.
//!
//! [`CharacterBuilder`] assembles a character from explicit choices;
//! [`create_character`] walks a player through the same choices on a
//! [`Console`].

use crate::character::{Character, CharacterClass, Origin, Race, DEFAULT_MAX_HP};
use crate::console::Console;
use crate::items::Item;
use crate::progression::{ExperienceCurve, Level};
use thiserror::Error;

/// Longest accepted character name, in characters.
pub const MAX_NAME_LEN: usize = 40;

/// Error from character building.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("Character name is required")]
    MissingName,
    #[error("Character name is longer than {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("Race selection is required")]
    MissingRace,
    #[error("Class selection is required")]
    MissingClass,
    #[error("Origin selection is required")]
    MissingOrigin,
    #[error("Max HP must be positive, got {0}")]
    InvalidMaxHp(i32),
}

/// Builder for new characters.
#[derive(Debug, Clone, Default)]
pub struct CharacterBuilder {
    name: Option<String>,
    race: Option<Race>,
    class: Option<CharacterClass>,
    origin: Option<Origin>,
    max_hp: Option<i32>,
    curve: Option<ExperienceCurve>,
    items: Vec<Item>,
}

impl CharacterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn race(mut self, race: Race) -> Self {
        self.race = Some(race);
        self
    }

    pub fn class(mut self, class: CharacterClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Defaults to 100. The character starts at full health.
    pub fn max_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = Some(max_hp);
        self
    }

    pub fn experience_curve(mut self, curve: ExperienceCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Add a starting item.
    pub fn item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn build(self) -> Result<Character, BuilderError> {
        let name = checked_name(self.name.as_deref().unwrap_or_default())?;
        let race = self.race.ok_or(BuilderError::MissingRace)?;
        let class = self.class.ok_or(BuilderError::MissingClass)?;
        let origin = self.origin.ok_or(BuilderError::MissingOrigin)?;

        let mut character = Character::new(name, class, race, origin);

        let max_hp = self.max_hp.unwrap_or(DEFAULT_MAX_HP);
        if max_hp <= 0 {
            return Err(BuilderError::InvalidMaxHp(max_hp));
        }
        character.set_max_hp(max_hp);
        character.set_hp(max_hp);

        if let Some(curve) = self.curve {
            character.level = Level::new(curve);
        }
        for item in self.items {
            character.add_item(item);
        }
        Ok(character)
    }
}

/// Trimmed name, or why it cannot be used.
fn checked_name(name: &str) -> Result<String, BuilderError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BuilderError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(BuilderError::NameTooLong);
    }
    Ok(name.to_string())
}

/// Interactive character creation: name, then race, class and origin from
/// numbered lists with descriptions. Rejected names are asked for again.
pub fn create_character(console: &mut dyn Console) -> Result<Character, BuilderError> {
    console.show("Character Creation");

    let name = loop {
        match checked_name(&console.ask("Enter your character name")) {
            Ok(name) => break name,
            Err(e) => console.show(&format!("{e}. Try again.")),
        }
    };

    let race = pick(console, "Race", &Race::all(), |r| (r.name(), r.description()));
    let class = pick(console, "Class", &CharacterClass::all(), |c| {
        (c.name(), c.description())
    });
    let origin = pick(console, "Origin", &Origin::all(), |o| (o.name(), o.description()));

    let character = CharacterBuilder::new()
        .name(name)
        .race(race)
        .class(class)
        .origin(origin)
        .build()?;
    console.show("Character created!");
    console.show(&character.describe());
    Ok(character)
}

fn pick<T: Copy>(
    console: &mut dyn Console,
    title: &str,
    values: &[T],
    label: impl Fn(&T) -> (&'static str, &'static str),
) -> T {
    let options: Vec<String> = values
        .iter()
        .map(|v| {
            let (name, description) = label(v);
            format!("{name} - {description}")
        })
        .collect();
    let choice = console.choose(&format!("Choose {}", title.to_lowercase()), &options);
    values[choice.clamp(1, values.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{find_item, Potion};
    use crate::testing::ScriptedConsole;

    #[test]
    fn test_build_character() {
        let character = CharacterBuilder::new()
            .name("Thorn")
            .race(Race::Dwarf)
            .class(CharacterClass::Paladin)
            .origin(Origin::Acolyte)
            .item(Potion::healing("Tonic", 20))
            .build()
            .unwrap();

        assert_eq!(character.name, "Thorn");
        assert_eq!(character.class(), CharacterClass::Paladin);
        assert_eq!(character.modifiers(), CharacterClass::Paladin.modifiers());
        assert_eq!(character.hp(), 100);
        assert_eq!(character.inventory.potions.len(), 1);
    }

    #[test]
    fn test_custom_max_hp_and_curve() {
        let character = CharacterBuilder::new()
            .name("Ivy")
            .race(Race::Elf)
            .class(CharacterClass::Druid)
            .origin(Origin::Outlander)
            .max_hp(60)
            .experience_curve(ExperienceCurve::Linear { base_xp: 50 })
            .build()
            .unwrap();

        assert_eq!(character.max_hp(), 60);
        assert_eq!(character.hp(), 60);
        assert_eq!(character.level.xp_for_next_level(), 50);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(CharacterBuilder::new().build(), Err(BuilderError::MissingName));
        assert_eq!(
            CharacterBuilder::new().name("   ").build(),
            Err(BuilderError::MissingName)
        );
        assert_eq!(
            CharacterBuilder::new().name("Ash").build(),
            Err(BuilderError::MissingRace)
        );
        assert_eq!(
            CharacterBuilder::new()
                .name("Ash")
                .race(Race::Orc)
                .class(CharacterClass::Barbarian)
                .build(),
            Err(BuilderError::MissingOrigin)
        );
    }

    #[test]
    fn test_invalid_max_hp() {
        let result = CharacterBuilder::new()
            .name("Ash")
            .race(Race::Orc)
            .class(CharacterClass::Barbarian)
            .origin(Origin::Exile)
            .max_hp(0)
            .build();
        assert_eq!(result, Err(BuilderError::InvalidMaxHp(0)));
    }

    #[test]
    fn test_starting_item_from_catalogue() {
        let knife = find_item("Knife").unwrap();
        let character = CharacterBuilder::new()
            .name("Pip")
            .race(Race::Halfling)
            .class(CharacterClass::Rogue)
            .origin(Origin::Criminal)
            .item(knife)
            .build()
            .unwrap();
        assert_eq!(character.best_weapon().unwrap().base.name, "Knife");
    }

    #[test]
    fn test_create_character_interactively() {
        // Gnome is race 8, Ranger class 1, Sailor origin 8
        let long = "N".repeat(MAX_NAME_LEN + 1);
        let mut console = ScriptedConsole::new([8, 1, 8]).with_answers(["", long.as_str(), "  Nim  "]);
        let character = create_character(&mut console).unwrap();

        assert_eq!(character.name, "Nim");
        assert_eq!(character.describe(), "Gnome Ranger from a Sailor background.");
        assert_eq!(character.hp(), DEFAULT_MAX_HP);

        // Both rejections come from the builder's own errors
        let transcript = console.transcript();
        let missing = format!("{}. Try again.", BuilderError::MissingName);
        let too_long = format!("{}. Try again.", BuilderError::NameTooLong);
        assert!(transcript.iter().any(|l| *l == missing));
        assert!(transcript.iter().any(|l| *l == too_long));
    }

    #[test]
    fn test_builder_and_prompt_share_name_rules() {
        let long = "N".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            CharacterBuilder::new().name(long.as_str()).build(),
            Err(BuilderError::NameTooLong)
        );
        assert_eq!(checked_name(&long), Err(BuilderError::NameTooLong));
        assert_eq!(checked_name("  Nim "), Ok("Nim".to_string()));
    }
}
