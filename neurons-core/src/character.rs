//! The player character: identity, vitals, class modifiers and combat stats.

use crate::dice::RandomSource;
use crate::inventory::Inventory;
use crate::items::{Item, Weapon};
use crate::progression::{Level, LevelError, LevelGain};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum hit points.
pub const DEFAULT_MAX_HP: i32 = 100;

// ============================================================================
// Classes
// ============================================================================

/// Skills that are rolled with a class modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Attack,
    Defense,
    Escape,
}

impl Skill {
    pub fn name(&self) -> &'static str {
        match self {
            Skill::Attack => "attack",
            Skill::Defense => "defense",
            Skill::Escape => "escape",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed per-class skill modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassModifiers {
    pub attack: i32,
    pub defense: i32,
    pub escape: i32,
}

impl ClassModifiers {
    pub const fn new(attack: i32, defense: i32, escape: i32) -> Self {
        Self {
            attack,
            defense,
            escape,
        }
    }

    pub fn get(&self, skill: Skill) -> i32 {
        match skill {
            Skill::Attack => self.attack,
            Skill::Defense => self.defense,
            Skill::Escape => self.escape,
        }
    }
}

/// Character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Ranger,
    Fighter,
    Wizard,
    Cleric,
    Rogue,
    Paladin,
    Warlock,
    Bard,
    Druid,
    Barbarian,
}

impl CharacterClass {
    pub fn all() -> [CharacterClass; 10] {
        use CharacterClass::*;
        [
            Ranger, Fighter, Wizard, Cleric, Rogue, Paladin, Warlock, Bard, Druid, Barbarian,
        ]
    }

    pub fn modifiers(&self) -> ClassModifiers {
        match self {
            CharacterClass::Ranger => ClassModifiers::new(1, 0, 4),
            CharacterClass::Fighter => ClassModifiers::new(5, 1, -1),
            CharacterClass::Wizard => ClassModifiers::new(2, 2, 1),
            CharacterClass::Cleric => ClassModifiers::new(2, -1, 4),
            CharacterClass::Rogue => ClassModifiers::new(0, 0, 5),
            CharacterClass::Paladin => ClassModifiers::new(3, 2, 0),
            CharacterClass::Warlock => ClassModifiers::new(4, 1, 0),
            CharacterClass::Bard => ClassModifiers::new(0, 2, 3),
            CharacterClass::Druid => ClassModifiers::new(1, 3, 1),
            CharacterClass::Barbarian => ClassModifiers::new(8, -2, -1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Bard => "Bard",
            CharacterClass::Druid => "Druid",
            CharacterClass::Barbarian => "Barbarian",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CharacterClass::Ranger => "Skilled hunter and tracker, adept at ranged combat and survival.",
            CharacterClass::Fighter => "Versatile warrior, expert in melee and weapons.",
            CharacterClass::Wizard => "Master of arcane magic, relies on intelligence and spells.",
            CharacterClass::Cleric => "Divine spellcaster, healer and protector of allies.",
            CharacterClass::Rogue => "Stealthy and cunning, expert at trickery and locks.",
            CharacterClass::Paladin => "Holy warrior, blends martial skill with divine powers.",
            CharacterClass::Warlock => "Bound to a patron, wields dark magic with cunning.",
            CharacterClass::Bard => "Performer and storyteller, uses music and charm in combat.",
            CharacterClass::Druid => "Nature-based spellcaster, shapeshifter and healer.",
            CharacterClass::Barbarian => "Ferocious warrior, thrives in rage and physical combat.",
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Races and Origins
// ============================================================================

/// Playable races. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Orc,
    Halfling,
    Tiefling,
    Dragonborn,
    Gnome,
}

impl Race {
    pub fn all() -> [Race; 8] {
        use Race::*;
        [Human, Elf, Dwarf, Orc, Halfling, Tiefling, Dragonborn, Gnome]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Race::Human => "Human",
            Race::Elf => "Elf",
            Race::Dwarf => "Dwarf",
            Race::Orc => "Orc",
            Race::Halfling => "Halfling",
            Race::Tiefling => "Tiefling",
            Race::Dragonborn => "Dragonborn",
            Race::Gnome => "Gnome",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Race::Human => "Versatile and ambitious, capable of any role.",
            Race::Elf => "Graceful beings attuned to nature and magic.",
            Race::Dwarf => "Stout and strong, skilled in mining and crafting.",
            Race::Orc => "Fierce warriors with great strength and endurance.",
            Race::Halfling => "Small, nimble, and lucky, excellent at stealth.",
            Race::Tiefling => "Marked by infernal heritage, charismatic and cunning.",
            Race::Dragonborn => "Proud dragon-descendants with breath attacks.",
            Race::Gnome => "Inventive and curious, often magical or mechanical.",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Character backgrounds. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Noble,
    Commoner,
    Outlander,
    StreetUrchin,
    Scholar,
    Acolyte,
    Soldier,
    Sailor,
    Merchant,
    Performer,
    Criminal,
    Exile,
}

impl Origin {
    pub fn all() -> [Origin; 12] {
        use Origin::*;
        [
            Noble, Commoner, Outlander, StreetUrchin, Scholar, Acolyte, Soldier, Sailor, Merchant,
            Performer, Criminal, Exile,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Origin::Noble => "Noble",
            Origin::Commoner => "Commoner",
            Origin::Outlander => "Outlander",
            Origin::StreetUrchin => "Street Urchin",
            Origin::Scholar => "Scholar",
            Origin::Acolyte => "Acolyte",
            Origin::Soldier => "Soldier",
            Origin::Sailor => "Sailor",
            Origin::Merchant => "Merchant",
            Origin::Performer => "Performer",
            Origin::Criminal => "Criminal",
            Origin::Exile => "Exile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Origin::Noble => "Raised in wealth and privilege, well-educated and influential.",
            Origin::Commoner => "Grew up in a regular family, hardworking and practical.",
            Origin::Outlander => "Lived in the wild, skilled in survival and exploration.",
            Origin::StreetUrchin => "Survived on the streets, cunning and resourceful.",
            Origin::Scholar => "Trained in academics or magic, highly knowledgeable.",
            Origin::Acolyte => "Raised in a temple or religious order, disciplined and devout.",
            Origin::Soldier => "Trained for combat, disciplined, loyal to comrades.",
            Origin::Sailor => "Life at sea, experienced with travel and navigation.",
            Origin::Merchant => "Traveled widely for trade, skilled in negotiation.",
            Origin::Performer => "Trained in arts, music, or storytelling.",
            Origin::Criminal => "Lived outside the law, stealthy and daring.",
            Origin::Exile => "Banished from homeland, resilient and self-reliant.",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Character
// ============================================================================

/// The player character.
///
/// Class modifiers are resolved once from the class when the character is
/// built or loaded and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CharacterRecord")]
pub struct Character {
    pub name: String,
    class: CharacterClass,
    pub race: Race,
    pub origin: Origin,
    hp: i32,
    max_hp: i32,
    pub level: Level,
    pub inventory: Inventory,
    #[serde(skip)]
    modifiers: ClassModifiers,
}

/// Serialized shape of [`Character`]; loading re-derives the modifiers.
#[derive(Deserialize)]
struct CharacterRecord {
    name: String,
    class: CharacterClass,
    race: Race,
    origin: Origin,
    hp: i32,
    #[serde(default = "default_max_hp")]
    max_hp: i32,
    #[serde(default)]
    level: Level,
    #[serde(default)]
    inventory: Inventory,
}

fn default_max_hp() -> i32 {
    DEFAULT_MAX_HP
}

impl From<CharacterRecord> for Character {
    fn from(record: CharacterRecord) -> Self {
        let max_hp = record.max_hp.max(0);
        Self {
            name: record.name,
            class: record.class,
            race: record.race,
            origin: record.origin,
            hp: record.hp.clamp(0, max_hp),
            max_hp,
            level: record.level,
            inventory: record.inventory,
            modifiers: record.class.modifiers(),
        }
    }
}

impl Character {
    /// A fresh level-1 character at full health.
    pub fn new(name: impl Into<String>, class: CharacterClass, race: Race, origin: Origin) -> Self {
        Self {
            name: name.into(),
            class,
            race,
            origin,
            hp: DEFAULT_MAX_HP,
            max_hp: DEFAULT_MAX_HP,
            level: Level::default(),
            inventory: Inventory::default(),
            modifiers: class.modifiers(),
        }
    }

    pub fn class(&self) -> CharacterClass {
        self.class
    }

    pub fn modifiers(&self) -> ClassModifiers {
        self.modifiers
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Set the maximum, clamping current HP into the new range.
    pub fn set_max_hp(&mut self, max_hp: i32) {
        self.max_hp = max_hp.max(0);
        self.hp = self.hp.clamp(0, self.max_hp);
    }

    /// Set current HP, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    pub fn add_item(&mut self, item: Item) {
        self.inventory.add(item);
    }

    /// Lose HP, never below zero. Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let old = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        old - self.hp
    }

    /// Regain HP, never above the maximum. Returns the HP actually restored.
    pub fn apply_heal(&mut self, amount: i32) -> i32 {
        let old = self.hp;
        self.hp = self.hp.saturating_add(amount.max(0)).min(self.max_hp);
        self.hp - old
    }

    pub fn gain_experience(&mut self, amount: i64) -> Result<LevelGain, LevelError> {
        self.level.gain_experience(amount)
    }

    pub fn best_weapon(&self) -> Option<&Weapon> {
        self.inventory.best_weapon()
    }

    /// Remove the best weapon (lost on defeat).
    pub fn drop_best_weapon(&mut self) -> Option<Weapon> {
        self.inventory.remove_best_weapon()
    }

    /// Roll a skill: uniform in `[0, M]` for a positive modifier, `[M, 0]`
    /// otherwise. A zero modifier always yields zero without drawing.
    pub fn roll_skill(&self, skill: Skill, rng: &mut dyn RandomSource) -> i32 {
        let modifier = self.modifiers.get(skill);
        match modifier {
            0 => 0,
            m if m > 0 => rng.range(0, m).clamp(0, m),
            m => rng.range(m, 0).clamp(m, 0),
        }
    }

    pub fn compute_attack(&self, rng: &mut dyn RandomSource) -> i32 {
        let weapon = self.best_weapon().map(|w| w.damage).unwrap_or(0);
        self.roll_skill(Skill::Attack, rng) + weapon
    }

    pub fn compute_defense(&self, rng: &mut dyn RandomSource) -> i32 {
        let armor = self.inventory.best_armor().map(|a| a.defense).unwrap_or(0);
        self.roll_skill(Skill::Defense, rng) + armor
    }

    pub fn compute_escape(&self, rng: &mut dyn RandomSource) -> i32 {
        self.roll_skill(Skill::Escape, rng)
    }

    pub fn describe(&self) -> String {
        format!("{} {} from a {} background.", self.race, self.class, self.origin)
    }
}
