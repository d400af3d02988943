//! Tile enumerants and walkability rules.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Empty,
    Floor,
    Grass,
    Clearing,
    Wall,
    Tree,
    Rock,
    ShallowWater,
    DeepWater,
    VioletTeleporter,
    RedTeleporter,
}

/// Which tiles a creature can stand on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Habitat {
    #[default]
    Ground,
    Flying,
    Aquatic,
}

/// Teleporters only connect to endpoints of the same colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleporterKind {
    Violet,
    Red,
}

impl TileType {
    /// Walls, trees and rocks stop everything, flying or not.
    pub fn is_solid(&self) -> bool {
        matches!(
            self,
            TileType::Empty | TileType::Wall | TileType::Tree | TileType::Rock
        )
    }

    pub fn is_water(&self) -> bool {
        matches!(self, TileType::ShallowWater | TileType::DeepWater)
    }

    /// Plain ground walkability (no habitat, no walk-on-water)
    pub fn is_walkable(&self) -> bool {
        self.walkable_for(Habitat::Ground, false)
    }

    /// Whether a creature with the given habitat may occupy this tile.
    /// `walk_on_water` lets ground walkers cross deep water.
    pub fn walkable_for(&self, habitat: Habitat, walk_on_water: bool) -> bool {
        if self.is_solid() {
            return false;
        }
        match habitat {
            Habitat::Ground => *self != TileType::DeepWater || walk_on_water,
            Habitat::Flying => true,
            Habitat::Aquatic => self.is_water(),
        }
    }

    pub fn blocks_vision(&self) -> bool {
        matches!(
            self,
            TileType::Wall | TileType::Empty | TileType::Tree | TileType::Rock
        )
    }

    pub fn teleporter_kind(&self) -> Option<TeleporterKind> {
        match self {
            TileType::VioletTeleporter => Some(TeleporterKind::Violet),
            TileType::RedTeleporter => Some(TeleporterKind::Red),
            _ => None,
        }
    }
}
