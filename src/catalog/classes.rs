use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Keyed;
use crate::party::{MagicSchool, Mastery, SkillLevel, SkillType, Stats};

#[derive(Debug, Clone, Deserialize)]
pub struct StartingSchool {
    pub school: MagicSchool,
    #[serde(default)]
    pub mastery: Mastery,
    #[serde(default)]
    pub known_spells: Vec<String>,
}

/// One option offered by a level-gated choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelChoiceOption {
    LearnSpell { school: MagicSchool, spell: String },
    SkillMastery { skill: SkillType },
    SchoolMastery { school: MagicSchool },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelChoice {
    pub level: u32,
    pub options: Vec<LevelChoiceOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub base_stats: Stats,
    pub hp_base: i32,
    pub hp_per_level: i32,
    #[serde(default)]
    pub sp_base: i32,
    #[serde(default)]
    pub sp_per_level: i32,
    #[serde(default)]
    pub skills: BTreeMap<SkillType, SkillLevel>,
    #[serde(default)]
    pub schools: Vec<StartingSchool>,
    #[serde(default)]
    pub starting_equipment: Vec<String>,
    #[serde(default)]
    pub level_choices: Vec<LevelChoice>,
}

impl ClassDef {
    pub fn is_caster(&self) -> bool {
        !self.schools.is_empty()
    }

    pub fn has_school(&self, school: MagicSchool) -> bool {
        self.schools.iter().any(|s| s.school == school)
    }

    /// Choice offered on reaching `level`, if any
    pub fn choice_at(&self, level: u32) -> Option<&LevelChoice> {
        self.level_choices.iter().find(|c| c.level == level)
    }
}

impl Keyed for ClassDef {
    const CATALOG: &'static str = "class";

    fn key(&self) -> &str {
        &self.key
    }
}
