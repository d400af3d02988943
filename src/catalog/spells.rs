use serde::{Deserialize, Serialize};

use super::Keyed;
use crate::constants::MAGIC_SPEED_TILES;
use crate::party::MagicSchool;

fn default_magic_speed() -> f32 {
    MAGIC_SPEED_TILES
}

/// Named timed party buffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityEffect {
    TorchLight,
    WizardEye,
    WalkOnWater,
    Bless,
    WaterBreathing,
}

impl UtilityEffect {
    pub const ALL: [UtilityEffect; 5] = [
        UtilityEffect::TorchLight,
        UtilityEffect::WizardEye,
        UtilityEffect::WalkOnWater,
        UtilityEffect::Bless,
        UtilityEffect::WaterBreathing,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            UtilityEffect::TorchLight => "torch_light",
            UtilityEffect::WizardEye => "wizard_eye",
            UtilityEffect::WalkOnWater => "walk_on_water",
            UtilityEffect::Bless => "bless",
            UtilityEffect::WaterBreathing => "water_breathing",
        }
    }

    /// Icon token shown in the status bar
    pub fn icon(&self) -> &'static str {
        match self {
            UtilityEffect::TorchLight => "icon_torch",
            UtilityEffect::WizardEye => "icon_eye",
            UtilityEffect::WalkOnWater => "icon_waves",
            UtilityEffect::Bless => "icon_halo",
            UtilityEffect::WaterBreathing => "icon_bubble",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpellEffect {
    Projectile {
        base_damage: i32,
        #[serde(default = "default_magic_speed")]
        speed_tiles: f32,
    },
    Heal {
        base_heal: i32,
    },
    Utility {
        utility: UtilityEffect,
        duration_sec: u32,
        /// Torch radius in tiles, bless stat bonus
        #[serde(default)]
        magnitude: i32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    pub school: MagicSchool,
    #[serde(default = "default_spell_level")]
    pub level: u32,
    pub sp_cost: i32,
    /// Gold asked by spell traders
    #[serde(default)]
    pub price: u32,
    pub effect: SpellEffect,
    #[serde(default)]
    pub description: String,
}

fn default_spell_level() -> u32 {
    1
}

impl SpellDef {
    pub fn is_battle_spell(&self) -> bool {
        !matches!(self.effect, SpellEffect::Utility { .. })
    }
}

impl Keyed for SpellDef {
    const CATALOG: &'static str = "spell";

    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_tags_parse() {
        let yaml = r#"
- id: torch
  name: Torch Light
  school: fire
  sp_cost: 1
  effect: { kind: utility, utility: torch_light, duration_sec: 60, magnitude: 4 }
- id: spark
  name: Spark
  school: air
  sp_cost: 2
  effect: { kind: projectile, base_damage: 5 }
"#;
        let spells: Vec<SpellDef> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spells[0].effect,
            SpellEffect::Utility {
                utility: UtilityEffect::TorchLight,
                duration_sec: 60,
                magnitude: 4
            }
        );
        assert!(!spells[0].is_battle_spell());
        assert_eq!(
            spells[1].effect,
            SpellEffect::Projectile {
                base_damage: 5,
                speed_tiles: MAGIC_SPEED_TILES
            }
        );
        assert_eq!(spells[1].level, 1);
    }
}
