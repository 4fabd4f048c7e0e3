//! Items and the small standard item catalogue.
//!
//! An [`Item`] is a tagged sum over the four concrete kinds the game knows:
//! plain gear, weapons, armor and potions. The tag travels with the item
//! through generator output and save files as `"kind"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Item rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fields shared by every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rarity: Rarity,
}

impl ItemBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rarity: Rarity::Common,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponType {
    Sword,
    Axe,
    Bow,
    Staff,
    Dagger,
}

/// Largest flat damage or defense bonus an item may carry.
pub const MAX_ITEM_BONUS: i32 = 10;

/// A damage-bearing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    #[serde(flatten)]
    pub base: ItemBase,
    /// Flat damage bonus, 0-10.
    #[serde(default = "default_bonus")]
    pub damage: i32,
    pub weapon_type: WeaponType,
}

impl Weapon {
    pub fn new(name: impl Into<String>, damage: i32, weapon_type: WeaponType) -> Self {
        Self {
            base: ItemBase::new(name),
            damage,
            weapon_type,
        }
    }
}

/// A defense-bearing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    #[serde(flatten)]
    pub base: ItemBase,
    /// Flat defense bonus, 0-10.
    #[serde(default = "default_bonus")]
    pub defense: i32,
}

impl Armor {
    pub fn new(name: impl Into<String>, defense: i32) -> Self {
        Self {
            base: ItemBase::new(name),
            defense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PotionEffect {
    #[default]
    Heal,
}

/// A consumable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Potion {
    #[serde(flatten)]
    pub base: ItemBase,
    #[serde(default = "default_potency")]
    pub potency: i32,
    #[serde(default)]
    pub effect: PotionEffect,
}

impl Potion {
    pub fn healing(name: impl Into<String>, potency: i32) -> Self {
        Self {
            base: ItemBase::new(name),
            potency,
            effect: PotionEffect::Heal,
        }
    }
}

fn default_bonus() -> i32 {
    1
}

fn default_potency() -> i32 {
    25
}

/// Any item the player can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Item {
    Item(ItemBase),
    Weapon(Weapon),
    Armor(Armor),
    Potion(Potion),
}

/// Discriminant of [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Item,
    Weapon,
    Armor,
    Potion,
}

impl Item {
    /// Plain gear with no combat use.
    pub fn gear(name: impl Into<String>) -> Self {
        Item::Item(ItemBase::new(name))
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Item(_) => ItemKind::Item,
            Item::Weapon(_) => ItemKind::Weapon,
            Item::Armor(_) => ItemKind::Armor,
            Item::Potion(_) => ItemKind::Potion,
        }
    }

    pub fn base(&self) -> &ItemBase {
        match self {
            Item::Item(base) => base,
            Item::Weapon(w) => &w.base,
            Item::Armor(a) => &a.base,
            Item::Potion(p) => &p.base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn rarity(&self) -> Rarity {
        self.base().rarity
    }

    /// Damage contribution, if this item bears damage.
    pub fn damage(&self) -> Option<i32> {
        match self {
            Item::Weapon(w) => Some(w.damage),
            _ => None,
        }
    }

    /// Defense contribution, if this item bears defense.
    pub fn defense(&self) -> Option<i32> {
        match self {
            Item::Armor(a) => Some(a.defense),
            _ => None,
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self, Item::Potion(_))
    }
}

impl From<Weapon> for Item {
    fn from(weapon: Weapon) -> Self {
        Item::Weapon(weapon)
    }
}

impl From<Armor> for Item {
    fn from(armor: Armor) -> Self {
        Item::Armor(armor)
    }
}

impl From<Potion> for Item {
    fn from(potion: Potion) -> Self {
        Item::Potion(potion)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base();
        write!(f, "{} ({})", base.name, base.rarity)?;
        if let Some(description) = &base.description {
            write!(f, " - {description}")?;
        }
        Ok(())
    }
}

/// Try to find a standard item by name (case-insensitive).
pub fn find_item(name: &str) -> Option<Item> {
    let name_lower = name.to_lowercase();
    CATALOGUE
        .iter()
        .find(|i| i.name().to_lowercase() == name_lower)
        .cloned()
}

lazy_static::lazy_static! {
    /// Standard items the game can hand out without asking the generator.
    pub static ref CATALOGUE: Vec<Item> = vec![
        Weapon::new("Knife", 1, WeaponType::Dagger).into(),
        Weapon::new("Short Sword", 3, WeaponType::Sword).into(),
        Weapon::new("Hand Axe", 4, WeaponType::Axe).into(),
        Weapon::new("Hunting Bow", 3, WeaponType::Bow).into(),
        Weapon::new("Oak Staff", 2, WeaponType::Staff).into(),
        Armor::new("Padded Vest", 1).into(),
        Armor::new("Leather Armor", 2).into(),
        Armor::new("Chain Shirt", 4).into(),
        Potion::healing("Healing Potion", 25).into(),
        Potion::healing("Greater Healing Potion", 50).into(),
        Item::gear("Torch"),
        Item::gear("Rope"),
    ];
}
