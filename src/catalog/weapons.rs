use serde::Deserialize;

use super::Keyed;
use crate::constants::ARROW_SPEED_TILES;
use crate::party::{SkillType, Stat};

fn default_projectile_speed() -> f32 {
    ARROW_SPEED_TILES
}

/// Weapon definition. Damage scales with a primary and optional secondary stat.
#[derive(Debug, Clone, Deserialize)]
pub struct WeaponDef {
    pub key: String,
    pub name: String,
    pub skill: SkillType,
    pub base_damage: i32,
    pub primary_stat: Stat,
    #[serde(default)]
    pub secondary_stat: Option<Stat>,
    #[serde(default)]
    pub crit_chance: i32,
    #[serde(default)]
    pub hit_bonus: i32,
    /// Ranged weapons fire arrows instead of swinging
    #[serde(default)]
    pub ranged: bool,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed_tiles: f32,
}

impl Keyed for WeaponDef {
    const CATALOG: &'static str = "weapon";

    fn key(&self) -> &str {
        &self.key
    }
}
