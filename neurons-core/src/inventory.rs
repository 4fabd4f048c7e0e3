//! Character inventory.

use crate::items::{Armor, Item, ItemBase, Potion, Weapon};
use serde::{Deserialize, Serialize};

/// Four disjoint, insertion-ordered pockets keyed by item kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<ItemBase>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub armors: Vec<Armor>,
    #[serde(default)]
    pub potions: Vec<Potion>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// File an item into the pocket matching its kind.
    pub fn add(&mut self, item: Item) {
        match item {
            Item::Item(base) => self.items.push(base),
            Item::Weapon(weapon) => self.weapons.push(weapon),
            Item::Armor(armor) => self.armors.push(armor),
            Item::Potion(potion) => self.potions.push(potion),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.weapons.len() + self.armors.len() + self.potions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest-damage weapon; the first one wins a tie.
    pub fn best_weapon(&self) -> Option<&Weapon> {
        self.best_weapon_index().map(|i| &self.weapons[i])
    }

    /// Highest-defense armor; the first one wins a tie.
    pub fn best_armor(&self) -> Option<&Armor> {
        first_max_by_key(&self.armors, |a| a.defense).map(|i| &self.armors[i])
    }

    /// Remove and return the best weapon.
    pub fn remove_best_weapon(&mut self) -> Option<Weapon> {
        self.best_weapon_index().map(|i| self.weapons.remove(i))
    }

    /// Remove and return the most recently added potion.
    pub fn take_last_potion(&mut self) -> Option<Potion> {
        self.potions.pop()
    }

    /// Every carried item, pocket by pocket.
    pub fn all(&self) -> Vec<Item> {
        self.items
            .iter()
            .cloned()
            .map(Item::Item)
            .chain(self.weapons.iter().cloned().map(Item::Weapon))
            .chain(self.armors.iter().cloned().map(Item::Armor))
            .chain(self.potions.iter().cloned().map(Item::Potion))
            .collect()
    }

    fn best_weapon_index(&self) -> Option<usize> {
        first_max_by_key(&self.weapons, |w| w.damage)
    }
}

/// `Iterator::max_by_key` keeps the last maximum; this keeps the first.
fn first_max_by_key<T>(items: &[T], key: impl Fn(&T) -> i32) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, item) in items.iter().enumerate() {
        let value = key(item);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::WeaponType;

    fn sword(name: &str, damage: i32) -> Weapon {
        Weapon::new(name, damage, WeaponType::Sword)
    }

    #[test]
    fn test_add_dispatches_by_kind() {
        let mut inventory = Inventory::new();
        inventory.add(sword("Blade", 2).into());
        inventory.add(Armor::new("Hide", 1).into());
        inventory.add(Potion::healing("Tonic", 10).into());
        inventory.add(Item::gear("Rope"));

        assert_eq!(inventory.weapons.len(), 1);
        assert_eq!(inventory.armors.len(), 1);
        assert_eq!(inventory.potions.len(), 1);
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.len(), 4);
    }

    #[test]
    fn test_weapon_never_lands_elsewhere() {
        let mut inventory = Inventory::new();
        for damage in 0..5 {
            inventory.add(sword("Blade", damage).into());
        }
        assert_eq!(inventory.weapons.len(), 5);
        assert!(inventory.armors.is_empty());
        assert!(inventory.potions.is_empty());
        assert!(inventory.items.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut inventory = Inventory::new();
        for name in ["a", "b", "c"] {
            inventory.add(Potion::healing(name, 5).into());
        }
        let names: Vec<_> = inventory.potions.iter().map(|p| p.base.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(inventory.take_last_potion().unwrap().base.name, "c");
    }

    #[test]
    fn test_best_weapon() {
        let mut inventory = Inventory::new();
        assert!(inventory.best_weapon().is_none());

        for (name, damage) in [("one", 1), ("three", 3), ("two", 2)] {
            inventory.add(sword(name, damage).into());
        }
        assert_eq!(inventory.best_weapon().unwrap().base.name, "three");
    }

    #[test]
    fn test_best_weapon_tie_keeps_first() {
        let mut inventory = Inventory::new();
        inventory.add(sword("first", 4).into());
        inventory.add(sword("second", 4).into());
        assert_eq!(inventory.best_weapon().unwrap().base.name, "first");

        let removed = inventory.remove_best_weapon().unwrap();
        assert_eq!(removed.base.name, "first");
        assert_eq!(inventory.weapons.len(), 1);
    }

    #[test]
    fn test_best_armor() {
        let mut inventory = Inventory::new();
        assert!(inventory.best_armor().is_none());
        inventory.add(Armor::new("Vest", 1).into());
        inventory.add(Armor::new("Mail", 5).into());
        assert_eq!(inventory.best_armor().unwrap().defense, 5);
    }
}
