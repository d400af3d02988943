//! Inventory items and equipment slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SkillType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Accessory,
    Consumable,
    Quest,
    BattleSpell,
    UtilitySpell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Armor,
    Helmet,
    Boots,
    Amulet,
    Ring,
    Spell,
}

/// One item instance. Items are value types: equipping moves the item out of
/// the shared inventory into a character's slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub rarity: Rarity,
    /// Integer attributes (`value`, `armor_class_base`, `heal_base`, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, i32>,
    /// Weapon definition key for weapons
    #[serde(default)]
    pub weapon: Option<String>,
    /// Spell id for spell items
    #[serde(default)]
    pub spell: Option<String>,
    /// Slot for armor and accessories
    #[serde(default)]
    pub slot: Option<EquipSlot>,
    /// Armor skill trained by wearing this item
    #[serde(default)]
    pub skill: Option<SkillType>,
    #[serde(default)]
    pub description: String,
}

impl Item {
    pub fn attribute(&self, name: &str) -> i32 {
        self.attributes.get(name).copied().unwrap_or(0)
    }

    pub fn value(&self) -> i32 {
        self.attribute("value")
    }

    pub fn is_quest_item(&self) -> bool {
        self.item_type == ItemType::Quest
    }

    pub fn is_spell(&self) -> bool {
        matches!(self.item_type, ItemType::BattleSpell | ItemType::UtilitySpell)
    }

    /// Whether this item may sit in the given equipment slot
    pub fn fits(&self, slot: EquipSlot) -> bool {
        match self.item_type {
            ItemType::Weapon => matches!(slot, EquipSlot::MainHand | EquipSlot::OffHand),
            ItemType::Armor => self.slot.map_or(slot == EquipSlot::Armor, |s| s == slot),
            ItemType::Accessory => self
                .slot
                .map_or(matches!(slot, EquipSlot::Amulet | EquipSlot::Ring), |s| s == slot),
            ItemType::BattleSpell | ItemType::UtilitySpell => slot == EquipSlot::Spell,
            ItemType::Consumable | ItemType::Quest => false,
        }
    }

    /// Slot this item goes to when equipped without an explicit slot
    pub fn default_slot(&self) -> Option<EquipSlot> {
        match self.item_type {
            ItemType::Weapon => Some(EquipSlot::MainHand),
            ItemType::Armor => Some(self.slot.unwrap_or(EquipSlot::Armor)),
            ItemType::Accessory => Some(self.slot.unwrap_or(EquipSlot::Ring)),
            ItemType::BattleSpell | ItemType::UtilitySpell => Some(EquipSlot::Spell),
            ItemType::Consumable | ItemType::Quest => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_type: ItemType, slot: Option<EquipSlot>) -> Item {
        Item {
            key: "test".to_string(),
            name: "Test".to_string(),
            item_type,
            rarity: Rarity::Common,
            attributes: BTreeMap::new(),
            weapon: None,
            spell: None,
            slot,
            skill: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_weapon_fits_hands_only() {
        let sword = item(ItemType::Weapon, None);
        assert!(sword.fits(EquipSlot::MainHand));
        assert!(!sword.fits(EquipSlot::Armor));
    }

    #[test]
    fn test_armor_respects_declared_slot() {
        let helm = item(ItemType::Armor, Some(EquipSlot::Helmet));
        assert!(helm.fits(EquipSlot::Helmet));
        assert!(!helm.fits(EquipSlot::Armor));
        assert_eq!(helm.default_slot(), Some(EquipSlot::Helmet));
    }

    #[test]
    fn test_consumables_never_fit() {
        let potion = item(ItemType::Consumable, None);
        assert!(!potion.fits(EquipSlot::MainHand));
        assert_eq!(potion.default_slot(), None);
    }

    #[test]
    fn test_attribute_defaults_to_zero() {
        let mut ring = item(ItemType::Accessory, None);
        ring.attributes.insert("value".to_string(), 120);
        assert_eq!(ring.value(), 120);
        assert_eq!(ring.attribute("armor_class_base"), 0);
    }
}
