//! The player's party: members, shared purse, food, inventory and buffs.

mod character;
mod item;
mod stats;

pub use character::{Character, Growth};
pub use item::{EquipSlot, Item, ItemType, Rarity};
pub use stats::{Condition, MagicSchool, Mastery, SchoolProgress, SkillLevel, SkillType, Stat, Stats};

#[cfg(test)]
pub(crate) use character::test_character;

use serde::{Deserialize, Serialize};

use crate::catalog::{ClassCatalog, ItemCatalog};
use crate::config::RosterEntry;
use crate::constants::*;
use crate::error::{ActionRefusal, CatalogError};
use crate::systems::effects::UtilityEffects;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub members: Vec<Character>,
    pub gold: u32,
    pub food: u32,
    pub inventory: Vec<Item>,
    pub selected: usize,
    pub effects: UtilityEffects,
}

impl Party {
    pub fn new(members: Vec<Character>) -> Self {
        Self {
            members,
            ..Default::default()
        }
    }

    /// Build the party from the configured roster
    pub fn from_roster(
        roster: &[RosterEntry],
        classes: &ClassCatalog,
        items: &ItemCatalog,
    ) -> Result<Self, CatalogError> {
        let members = roster
            .iter()
            .take(MAX_PARTY_SIZE)
            .map(|entry| Character::from_class(&entry.name, classes.get(&entry.class)?, items))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(members))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, index: usize) -> Result<&Character, ActionRefusal> {
        self.members.get(index).ok_or(ActionRefusal::InvalidIndex)
    }

    pub fn member_mut(&mut self, index: usize) -> Result<&mut Character, ActionRefusal> {
        self.members.get_mut(index).ok_or(ActionRefusal::InvalidIndex)
    }

    pub fn selected_member(&self) -> Option<&Character> {
        self.members.get(self.selected)
    }

    pub fn select(&mut self, index: usize) -> Result<(), ActionRefusal> {
        if index >= self.members.len() {
            return Err(ActionRefusal::InvalidIndex);
        }
        self.selected = index;
        Ok(())
    }

    /// Base stat plus party-wide bonuses (bless)
    pub fn effective_stat(&self, index: usize, stat: Stat) -> i32 {
        self.members
            .get(index)
            .map_or(0, |c| (c.stats.get(stat) + self.effects.stat_bonus()).clamp(0, MAX_STAT))
    }

    /// All seven stats with party-wide bonuses applied
    pub fn effective_stats(&self, index: usize) -> Stats {
        let mut stats = Stats::default();
        for stat in Stat::ALL {
            stats.set(stat, self.effective_stat(index, stat));
        }
        stats
    }

    pub fn conscious_indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_conscious())
            .map(|(i, _)| i)
            .collect()
    }

    /// Game over: nobody left standing
    pub fn all_down(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|c| !c.is_conscious())
    }

    pub fn average_level(&self) -> u32 {
        if self.members.is_empty() {
            return 0;
        }
        self.members.iter().map(|c| c.level).sum::<u32>() / self.members.len() as u32
    }

    pub fn total_experience(&self) -> u32 {
        self.members.iter().map(|c| c.total_experience).sum()
    }

    /// +1 spell point for every conscious member
    pub fn regenerate_spell_points(&mut self) {
        for member in self.members.iter_mut().filter(|c| c.is_conscious()) {
            member.restore_spell_points(1);
        }
    }

    /// First conscious member able to act, starting from the selection
    pub fn first_ready(&self) -> Option<usize> {
        let n = self.members.len();
        (0..n)
            .map(|offset| (self.selected + offset) % n)
            .find(|&i| self.members[i].can_act())
    }

    // =========================================================================
    // GOLD AND INVENTORY
    // =========================================================================

    pub fn spend_gold(&mut self, amount: u32) -> Result<(), ActionRefusal> {
        if self.gold < amount {
            return Err(ActionRefusal::NotEnoughGold {
                needed: amount,
                have: self.gold,
            });
        }
        self.gold -= amount;
        Ok(())
    }

    pub fn add_item(&mut self, item: Item) {
        self.inventory.push(item);
    }

    /// Throw an item away. Quest items are refused.
    pub fn discard(&mut self, index: usize) -> Result<Item, ActionRefusal> {
        let item = self.inventory.get(index).ok_or(ActionRefusal::InvalidIndex)?;
        if item.is_quest_item() {
            return Err(ActionRefusal::QuestItem(item.name.clone()));
        }
        Ok(self.inventory.remove(index))
    }

    /// Sell an inventory item for half its value
    pub fn sell(&mut self, index: usize) -> Result<u32, ActionRefusal> {
        let item = self.discard(index)?;
        let price = (item.value().max(0) / 2) as u32;
        self.gold += price;
        Ok(price)
    }

    // =========================================================================
    // EQUIPMENT
    // =========================================================================

    /// Move an inventory item into a member's slot. Whatever was in the slot
    /// goes back to the inventory.
    pub fn equip(&mut self, member: usize, index: usize, slot: Option<EquipSlot>) -> Result<(), ActionRefusal> {
        self.member(member)?;
        let item = self.inventory.get(index).ok_or(ActionRefusal::InvalidIndex)?;
        let slot = slot
            .or_else(|| item.default_slot())
            .ok_or_else(|| ActionRefusal::IncompatibleSlot {
                item: item.name.clone(),
            })?;
        if !item.fits(slot) {
            return Err(ActionRefusal::IncompatibleSlot {
                item: item.name.clone(),
            });
        }
        let item = self.inventory.remove(index);
        let character = &mut self.members[member];
        if let Some(previous) = character.equipment.insert(slot, item) {
            self.inventory.push(previous);
        }
        Ok(())
    }

    pub fn unequip(&mut self, member: usize, slot: EquipSlot) -> Result<(), ActionRefusal> {
        let item = self
            .member_mut(member)?
            .equipment
            .remove(&slot)
            .ok_or(ActionRefusal::EmptySlot)?;
        self.inventory.push(item);
        Ok(())
    }

    /// Drink or read a consumable. Heals `heal_base`, restores
    /// `spell_points_base` and cures poison when `cure_poison` is set.
    pub fn use_consumable(&mut self, member: usize, index: usize) -> Result<String, ActionRefusal> {
        let item = self.inventory.get(index).ok_or(ActionRefusal::InvalidIndex)?;
        if item.item_type != ItemType::Consumable {
            return Err(ActionRefusal::NotUsable(item.name.clone()));
        }
        let character = self.members.get(member).ok_or(ActionRefusal::InvalidIndex)?;
        if !character.is_conscious() && item.attribute("heal_base") <= 0 {
            return Err(ActionRefusal::Incapacitated {
                name: character.name.clone(),
            });
        }
        let item = self.inventory.remove(index);
        let character = &mut self.members[member];
        let healed = character.heal(item.attribute("heal_base"));
        character.restore_spell_points(item.attribute("spell_points_base"));
        if item.attribute("cure_poison") > 0 {
            character.cure_poison();
        }
        Ok(if healed > 0 {
            format!("{} uses {} and recovers {} HP", character.name, item.name, healed)
        } else {
            format!("{} uses {}", character.name, item.name)
        })
    }

    /// Eat one food and fully restore every conscious member
    pub fn rest(&mut self, enemies_nearby: bool) -> Result<(), ActionRefusal> {
        if enemies_nearby {
            return Err(ActionRefusal::EnemiesNearby);
        }
        if self.food == 0 {
            return Err(ActionRefusal::NoFood);
        }
        self.food -= 1;
        for member in self.members.iter_mut().filter(|c| c.is_conscious()) {
            member.hit_points = member.max_hit_points;
            member.spell_points = member.max_spell_points;
            member.cure_poison();
            member.remove_condition(Condition::Asleep);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn item(key: &str, item_type: ItemType) -> Item {
        Item {
            key: key.to_string(),
            name: key.to_string(),
            item_type,
            rarity: Rarity::Common,
            attributes: BTreeMap::new(),
            weapon: None,
            spell: None,
            slot: None,
            skill: None,
            description: String::new(),
        }
    }

    fn party() -> Party {
        Party::new(vec![test_character("Ayla"), test_character("Borin")])
    }

    #[test]
    fn test_equip_swaps_previous_into_inventory() {
        let mut party = party();
        party.add_item(item("dagger", ItemType::Weapon));
        party.add_item(item("sword", ItemType::Weapon));
        party.equip(0, 0, None).unwrap();
        assert_eq!(party.members[0].main_weapon().unwrap().key, "dagger");
        party.equip(0, 0, None).unwrap();
        assert_eq!(party.members[0].main_weapon().unwrap().key, "sword");
        assert_eq!(party.inventory.len(), 1);
        assert_eq!(party.inventory[0].key, "dagger");
    }

    #[test]
    fn test_equip_incompatible_refused_without_mutation() {
        let mut party = party();
        party.add_item(item("apple", ItemType::Consumable));
        let before = party.clone();
        assert!(matches!(
            party.equip(0, 0, None),
            Err(ActionRefusal::IncompatibleSlot { .. })
        ));
        party.add_item(item("sword", ItemType::Weapon));
        assert!(party.equip(0, 1, Some(EquipSlot::Helmet)).is_err());
        assert_eq!(party.members, before.members);
    }

    #[test]
    fn test_unequip_empty_slot() {
        let mut party = party();
        assert_eq!(party.unequip(0, EquipSlot::Ring), Err(ActionRefusal::EmptySlot));
    }

    #[test]
    fn test_quest_items_cannot_be_sold_or_discarded() {
        let mut party = party();
        party.add_item(item("idol", ItemType::Quest));
        assert!(matches!(party.sell(0), Err(ActionRefusal::QuestItem(_))));
        assert!(matches!(party.discard(0), Err(ActionRefusal::QuestItem(_))));
        assert_eq!(party.inventory.len(), 1);
        assert_eq!(party.gold, 0);
    }

    #[test]
    fn test_sell_for_half_value() {
        let mut party = party();
        let mut ring = item("ring", ItemType::Accessory);
        ring.attributes.insert("value".to_string(), 51);
        party.add_item(ring);
        assert_eq!(party.sell(0), Ok(25));
        assert_eq!(party.gold, 25);
        assert!(party.inventory.is_empty());
    }

    #[test]
    fn test_use_consumable_heals() {
        let mut party = party();
        let mut potion = item("potion", ItemType::Consumable);
        potion.attributes.insert("heal_base".to_string(), 10);
        party.add_item(potion);
        party.members[0].take_damage(20);
        party.use_consumable(0, 0).unwrap();
        assert_eq!(party.members[0].hit_points, party.members[0].max_hit_points - 10);
        assert!(party.inventory.is_empty());
    }

    #[test]
    fn test_rest_needs_food_and_safety() {
        let mut party = party();
        party.members[0].take_damage(10);
        assert_eq!(party.rest(false), Err(ActionRefusal::NoFood));
        party.food = 1;
        assert_eq!(party.rest(true), Err(ActionRefusal::EnemiesNearby));
        party.rest(false).unwrap();
        assert_eq!(party.food, 0);
        assert_eq!(party.members[0].hit_points, party.members[0].max_hit_points);
    }

    #[test]
    fn test_bless_raises_effective_stats() {
        let mut party = party();
        assert_eq!(party.effective_stat(0, Stat::Luck), 10);
        party.effects.apply(crate::catalog::UtilityEffect::Bless, 60, 2);
        assert_eq!(party.effective_stat(0, Stat::Luck), 12);
        assert_eq!(party.members[0].stats.luck, 10);
    }

    #[test]
    fn test_all_down() {
        let mut party = party();
        assert!(!party.all_down());
        for member in party.members.iter_mut() {
            member.take_damage(1000);
        }
        assert!(party.all_down());
        assert_eq!(party.first_ready(), None);
    }
}
