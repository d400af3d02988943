use serde::Deserialize;

use super::{Keyed, TileCatalog};
use crate::error::CatalogError;
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcKind {
    SpellTrader,
    Merchant,
    Encounter,
    Generic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncounterMonsterDef {
    pub species: String,
    pub count_min: u32,
    pub count_max: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncounterRewardsDef {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub quest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncounterDef {
    pub monsters: Vec<EncounterMonsterDef>,
    #[serde(default)]
    pub rewards: EncounterRewardsDef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    pub kind: NpcKind,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub dialogue: Vec<String>,
    /// Spells offered by a spell trader
    #[serde(default)]
    pub spells: Vec<String>,
    /// Items stocked by a merchant
    #[serde(default)]
    pub items: Vec<String>,
    /// Quest offered by a generic NPC
    #[serde(default)]
    pub quest: Option<String>,
    #[serde(default)]
    pub encounter: Option<EncounterDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapMonsterDef {
    pub species: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StartDef {
    pub x: i32,
    pub y: i32,
    /// Facing in degrees, 0 = east
    #[serde(default)]
    pub angle_deg: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDef {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub biome: String,
    #[serde(default)]
    pub floor_color: [u8; 3],
    pub start: StartDef,
    pub tiles: Vec<String>,
    #[serde(default)]
    pub npcs: Vec<NpcDef>,
    #[serde(default)]
    pub monsters: Vec<MapMonsterDef>,
}

impl MapDef {
    pub fn build_grid(&self, legend: &TileCatalog) -> Result<Grid, CatalogError> {
        let grid = legend.parse_rows(&self.key, &self.tiles)?;
        if !grid.is_walkable(self.start.x, self.start.y) {
            return Err(CatalogError::InvalidMap {
                map: self.key.clone(),
                details: format!("start ({}, {}) is not walkable", self.start.x, self.start.y),
            });
        }
        Ok(grid)
    }
}

impl Keyed for MapDef {
    const CATALOG: &'static str = "map";

    fn key(&self) -> &str {
        &self.key
    }
}
