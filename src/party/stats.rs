//! Character attributes, conditions, skills and magic schools.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_STAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Might,
    Intellect,
    Personality,
    Endurance,
    Accuracy,
    Speed,
    Luck,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Might,
        Stat::Intellect,
        Stat::Personality,
        Stat::Endurance,
        Stat::Accuracy,
        Stat::Speed,
        Stat::Luck,
    ];
}

/// The seven base stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub might: i32,
    pub intellect: i32,
    pub personality: i32,
    pub endurance: i32,
    pub accuracy: i32,
    pub speed: i32,
    pub luck: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            might: 10,
            intellect: 10,
            personality: 10,
            endurance: 10,
            accuracy: 10,
            speed: 10,
            luck: 10,
        }
    }
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Might => self.might,
            Stat::Intellect => self.intellect,
            Stat::Personality => self.personality,
            Stat::Endurance => self.endurance,
            Stat::Accuracy => self.accuracy,
            Stat::Speed => self.speed,
            Stat::Luck => self.luck,
        }
    }

    fn slot_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Might => &mut self.might,
            Stat::Intellect => &mut self.intellect,
            Stat::Personality => &mut self.personality,
            Stat::Endurance => &mut self.endurance,
            Stat::Accuracy => &mut self.accuracy,
            Stat::Speed => &mut self.speed,
            Stat::Luck => &mut self.luck,
        }
    }

    /// Set a stat, clamped to [0, MAX_STAT]
    pub fn set(&mut self, stat: Stat, value: i32) {
        *self.slot_mut(stat) = value.clamp(0, MAX_STAT);
    }

    /// Raise a stat by one. Returns false at the cap.
    pub fn raise(&mut self, stat: Stat) -> bool {
        let slot = self.slot_mut(stat);
        if *slot >= MAX_STAT {
            return false;
        }
        *slot += 1;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Normal,
    Poisoned,
    Diseased,
    Cursed,
    Asleep,
    Fear,
    Paralyzed,
    Unconscious,
    Dead,
    Stone,
    Eradicated,
}

impl Condition {
    /// Conditions that stop a character from acting at all
    pub fn incapacitates(&self) -> bool {
        matches!(
            self,
            Condition::Asleep
                | Condition::Paralyzed
                | Condition::Unconscious
                | Condition::Dead
                | Condition::Stone
                | Condition::Eradicated
        )
    }

    /// Conditions that count as "out of the fight" for game-over purposes
    pub fn is_down(&self) -> bool {
        matches!(
            self,
            Condition::Unconscious | Condition::Dead | Condition::Stone | Condition::Eradicated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mastery {
    #[default]
    Novice,
    Expert,
    Master,
    Grandmaster,
}

impl Mastery {
    /// Ranks above Novice (0..=3)
    pub fn rank(&self) -> i32 {
        match self {
            Mastery::Novice => 0,
            Mastery::Expert => 1,
            Mastery::Master => 2,
            Mastery::Grandmaster => 3,
        }
    }

    /// Next rank, clamped at Grandmaster
    pub fn next(&self) -> Mastery {
        match self {
            Mastery::Novice => Mastery::Expert,
            Mastery::Expert => Mastery::Master,
            Mastery::Master | Mastery::Grandmaster => Mastery::Grandmaster,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    Sword,
    Dagger,
    Axe,
    Mace,
    Spear,
    Staff,
    Bow,
    LeatherArmor,
    ChainArmor,
    PlateArmor,
    Shield,
}

impl SkillType {
    pub fn is_armor(&self) -> bool {
        matches!(
            self,
            SkillType::LeatherArmor | SkillType::ChainArmor | SkillType::PlateArmor | SkillType::Shield
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillLevel {
    pub level: u32,
    pub mastery: Mastery,
}

impl Default for SkillLevel {
    fn default() -> Self {
        Self {
            level: 1,
            mastery: Mastery::Novice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicSchool {
    Fire,
    Air,
    Water,
    Earth,
    Spirit,
    Mind,
    Body,
    Light,
    Dark,
}

/// Level, mastery and spellbook of one magic school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolProgress {
    pub level: u32,
    pub mastery: Mastery,
    pub cast_count: u32,
    pub known_spells: Vec<String>,
}

impl Default for SchoolProgress {
    fn default() -> Self {
        Self {
            level: 1,
            mastery: Mastery::Novice,
            cast_count: 0,
            known_spells: Vec::new(),
        }
    }
}

impl SchoolProgress {
    pub fn knows(&self, spell_id: &str) -> bool {
        self.known_spells.iter().any(|s| s == spell_id)
    }
}
