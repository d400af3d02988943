use serde::Deserialize;

use super::Keyed;
use crate::constants::DEFAULT_ATTACK_COOLDOWN_FRAMES;
use crate::tile::Habitat;

fn default_attack_cooldown() -> u32 {
    DEFAULT_ATTACK_COOLDOWN_FRAMES
}

fn default_attack_radius() -> f32 {
    1.2
}

fn default_vision() -> f32 {
    8.0
}

fn default_speed() -> f32 {
    1.5
}

fn default_half_size() -> f32 {
    20.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonsterDef {
    pub key: String,
    pub name: String,
    pub hit_points: i32,
    pub damage_min: i32,
    pub damage_max: i32,
    #[serde(default = "default_attack_radius")]
    pub attack_radius_tiles: f32,
    #[serde(default = "default_vision")]
    pub vision_tiles: f32,
    /// Movement speed in tiles per second
    #[serde(default = "default_speed")]
    pub speed_tiles: f32,
    #[serde(default)]
    pub habitat: Habitat,
    #[serde(default = "default_attack_cooldown")]
    pub attack_cooldown_frames: u32,
    #[serde(default)]
    pub projectile_weapon: Option<String>,
    #[serde(default)]
    pub projectile_spell: Option<String>,
    /// Percent chance per landed melee hit
    #[serde(default)]
    pub poison_chance: u32,
    #[serde(default)]
    pub poison_duration_sec: u32,
    #[serde(default)]
    pub fireburst_chance: u32,
    #[serde(default)]
    pub fireburst_damage: i32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub gold: u32,
    /// Fraction of max hit points below which the monster flees (0 = never)
    #[serde(default)]
    pub flee_threshold: f32,
    /// Collision half extent in world units
    #[serde(default = "default_half_size")]
    pub half_size: f32,
}

impl MonsterDef {
    pub fn is_ranged(&self) -> bool {
        self.projectile_weapon.is_some() || self.projectile_spell.is_some()
    }
}

impl Keyed for MonsterDef {
    const CATALOG: &'static str = "monster";

    fn key(&self) -> &str {
        &self.key
    }
}
