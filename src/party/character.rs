//! A single party member.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    Condition, EquipSlot, Item, MagicSchool, Mastery, SchoolProgress, SkillLevel, SkillType, Stat,
    Stats,
};
use crate::catalog::{ClassDef, ItemCatalog, ItemCatalogExt};
use crate::constants::*;
use crate::error::{ActionRefusal, CatalogError};

/// Hit point and spell point growth copied from the class at creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Growth {
    pub hp_base: i32,
    pub hp_per_level: i32,
    pub sp_base: i32,
    pub sp_per_level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    pub class: String,
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    /// Lifetime experience, used for high scores
    pub total_experience: u32,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub spell_points: i32,
    pub max_spell_points: i32,
    pub stats: Stats,
    pub free_stat_points: u32,
    /// Empty means Normal
    pub conditions: Vec<Condition>,
    pub skills: BTreeMap<SkillType, SkillLevel>,
    pub schools: BTreeMap<MagicSchool, SchoolProgress>,
    pub equipment: BTreeMap<EquipSlot, Item>,
    /// Spell cast by the cast-equipped-spell intent
    pub ready_spell: Option<String>,
    pub growth: Growth,
    /// Frames until this character may attack or cast again
    pub action_cooldown: u32,
    pub poison_frames: u32,
    pub poison_tick: u32,
    /// Portrait flash after taking damage
    pub damage_blink: u32,
}

impl Character {
    /// Build a level 1 character from its class definition
    pub fn from_class(name: &str, class: &ClassDef, items: &ItemCatalog) -> Result<Self, CatalogError> {
        let mut character = Character {
            name: name.to_string(),
            class: class.key.clone(),
            level: 1,
            stats: class.base_stats,
            skills: class.skills.clone(),
            growth: Growth {
                hp_base: class.hp_base,
                hp_per_level: class.hp_per_level,
                sp_base: class.sp_base,
                sp_per_level: class.sp_per_level,
            },
            ..Default::default()
        };
        for start in &class.schools {
            character.schools.insert(
                start.school,
                SchoolProgress {
                    mastery: start.mastery,
                    known_spells: start.known_spells.clone(),
                    ..Default::default()
                },
            );
        }
        character.ready_spell = class
            .schools
            .iter()
            .flat_map(|s| s.known_spells.iter())
            .next()
            .cloned();
        for key in &class.starting_equipment {
            let item = items.instantiate(key)?;
            if let Some(slot) = item.default_slot() {
                character.equipment.insert(slot, item);
            }
        }
        character.recompute_derived();
        character.hit_points = character.max_hit_points;
        character.spell_points = character.max_spell_points;
        Ok(character)
    }

    /// Recompute maximum hit points and spell points from level and stats
    pub fn recompute_derived(&mut self) {
        let levels = self.level.saturating_sub(1) as i32;
        self.max_hit_points =
            (self.growth.hp_base + self.growth.hp_per_level * levels + self.stats.endurance / 2).max(1);
        self.max_spell_points = if self.growth.sp_base == 0 && self.growth.sp_per_level == 0 {
            0
        } else {
            self.growth.sp_base
                + self.growth.sp_per_level * levels
                + self.stats.intellect.max(self.stats.personality) / 2
        };
        self.hit_points = self.hit_points.clamp(0, self.max_hit_points);
        self.spell_points = self.spell_points.clamp(0, self.max_spell_points);
    }

    // --- conditions ---

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn add_condition(&mut self, condition: Condition) {
        if condition != Condition::Normal && !self.has_condition(condition) {
            self.conditions.push(condition);
        }
    }

    pub fn remove_condition(&mut self, condition: Condition) {
        self.conditions.retain(|c| *c != condition);
    }

    /// Most severe condition, for portraits
    pub fn condition(&self) -> Condition {
        self.conditions
            .iter()
            .copied()
            .find(|c| c.is_down())
            .or_else(|| self.conditions.first().copied())
            .unwrap_or(Condition::Normal)
    }

    pub fn is_conscious(&self) -> bool {
        !self.conditions.iter().any(|c| c.is_down())
    }

    pub fn can_act(&self) -> bool {
        !self.conditions.iter().any(|c| c.incapacitates())
    }

    // --- hit points and spell points ---

    /// Apply damage. Returns true if this knocked the character out.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 || !self.is_conscious() {
            return false;
        }
        self.hit_points = (self.hit_points - amount).max(0);
        self.damage_blink = DAMAGE_BLINK_FRAMES;
        if self.hit_points == 0 {
            self.add_condition(Condition::Unconscious);
            self.remove_condition(Condition::Asleep);
            return true;
        }
        self.remove_condition(Condition::Asleep);
        false
    }

    /// Restore hit points. Brings unconscious characters back; the dead stay dead.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0
            || self.has_condition(Condition::Dead)
            || self.has_condition(Condition::Stone)
            || self.has_condition(Condition::Eradicated)
        {
            return 0;
        }
        let before = self.hit_points;
        self.hit_points = (self.hit_points + amount).min(self.max_hit_points);
        if self.hit_points > 0 {
            self.remove_condition(Condition::Unconscious);
        }
        self.hit_points - before
    }

    pub fn restore_spell_points(&mut self, amount: i32) {
        self.spell_points = (self.spell_points + amount).clamp(0, self.max_spell_points);
    }

    pub fn spend_spell_points(&mut self, cost: i32) -> Result<(), ActionRefusal> {
        if self.spell_points < cost {
            return Err(ActionRefusal::NotEnoughSpellPoints {
                needed: cost,
                have: self.spell_points,
            });
        }
        self.spell_points -= cost;
        Ok(())
    }

    // --- poison ---

    pub fn poison(&mut self, frames: u32) {
        if frames == 0 || !self.is_conscious() {
            return;
        }
        self.add_condition(Condition::Poisoned);
        self.poison_frames = self.poison_frames.max(frames);
    }

    pub fn cure_poison(&mut self) {
        self.remove_condition(Condition::Poisoned);
        self.poison_frames = 0;
        self.poison_tick = 0;
    }

    /// Advance poison by one frame. Returns damage dealt this frame, if any.
    pub fn tick_poison(&mut self) -> Option<i32> {
        if self.poison_frames == 0 {
            return None;
        }
        self.poison_frames -= 1;
        self.poison_tick += 1;
        let mut dealt = None;
        if self.poison_tick >= POISON_TICK_FRAMES {
            self.poison_tick = 0;
            self.take_damage(POISON_DAMAGE);
            dealt = Some(POISON_DAMAGE);
        }
        if self.poison_frames == 0 {
            self.cure_poison();
        }
        dealt
    }

    // --- skills, schools, equipment ---

    pub fn skill(&self, skill: SkillType) -> Option<SkillLevel> {
        self.skills.get(&skill).copied()
    }

    pub fn skill_mastery(&self, skill: SkillType) -> Option<Mastery> {
        self.skills.get(&skill).map(|s| s.mastery)
    }

    pub fn school_mastery(&self, school: MagicSchool) -> Option<Mastery> {
        self.schools.get(&school).map(|s| s.mastery)
    }

    pub fn knows_spell(&self, spell_id: &str) -> bool {
        self.schools.values().any(|s| s.knows(spell_id))
    }

    /// Add a spell to a school's spellbook
    pub fn learn_spell(&mut self, school: MagicSchool, spell_id: &str) -> Result<(), ActionRefusal> {
        if self.knows_spell(spell_id) {
            return Err(ActionRefusal::SpellAlreadyKnown {
                name: self.name.clone(),
                spell: spell_id.to_string(),
            });
        }
        let progress = self.schools.entry(school).or_default();
        progress.known_spells.push(spell_id.to_string());
        if self.ready_spell.is_none() {
            self.ready_spell = Some(spell_id.to_string());
        }
        Ok(())
    }

    /// Raise a skill's mastery one rank. Returns the new rank.
    pub fn raise_skill_mastery(&mut self, skill: SkillType) -> Mastery {
        let entry = self.skills.entry(skill).or_default();
        entry.mastery = entry.mastery.next();
        entry.mastery
    }

    pub fn raise_school_mastery(&mut self, school: MagicSchool) -> Mastery {
        let entry = self.schools.entry(school).or_default();
        entry.mastery = entry.mastery.next();
        entry.mastery
    }

    pub fn main_weapon(&self) -> Option<&Item> {
        self.equipment.get(&EquipSlot::MainHand)
    }

    /// Spell cast by default: the readied spell, else a spell item in the spell slot
    pub fn equipped_spell(&self) -> Option<&str> {
        self.ready_spell.as_deref().or_else(|| {
            self.equipment
                .get(&EquipSlot::Spell)
                .and_then(|item| item.spell.as_deref())
        })
    }

    /// Armor class from equipment plus armor mastery ranks
    pub fn armor_class_base(&self) -> i32 {
        self.equipment
            .values()
            .map(|item| {
                let mastery_bonus = item
                    .skill
                    .filter(|s| s.is_armor())
                    .and_then(|s| self.skill_mastery(s))
                    .map_or(0, |m| m.rank() * ARMOR_MASTERY_AC_PER_RANK);
                item.attribute("armor_class_base") + mastery_bonus
            })
            .sum()
    }

    /// Spend a free stat point
    pub fn assign_stat_point(&mut self, stat: Stat) -> Result<(), ActionRefusal> {
        if self.free_stat_points == 0 {
            return Err(ActionRefusal::NoStatPoints);
        }
        if !self.stats.raise(stat) {
            return Err(ActionRefusal::StatAtMaximum);
        }
        self.free_stat_points -= 1;
        self.recompute_derived();
        Ok(())
    }

    /// Frame timers that run every frame in both modes
    pub fn tick_timers(&mut self) {
        self.action_cooldown = self.action_cooldown.saturating_sub(1);
        self.damage_blink = self.damage_blink.saturating_sub(1);
    }
}

#[cfg(test)]
pub(crate) fn test_character(name: &str) -> Character {
    let mut character = Character {
        name: name.to_string(),
        class: "knight".to_string(),
        level: 1,
        growth: Growth {
            hp_base: 30,
            hp_per_level: 5,
            sp_base: 10,
            sp_per_level: 2,
        },
        ..Default::default()
    };
    character.recompute_derived();
    character.hit_points = character.max_hit_points;
    character.spell_points = character.max_spell_points;
    character
}
