//! Tile legend: map characters to tile types and floor colours.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::grid::Grid;
use crate::tile::TileType;

#[derive(Debug, Clone, Deserialize)]
pub struct TileDef {
    /// Character used in map rows
    pub symbol: char,
    pub tile: TileType,
    /// RGB colour for minimap and untextured floors
    #[serde(default)]
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    by_symbol: BTreeMap<char, TileDef>,
}

impl TileCatalog {
    pub fn from_yaml(source: &str, path: &str) -> Result<Self, CatalogError> {
        let defs: Vec<TileDef> = serde_yaml::from_str(source).map_err(|err| CatalogError::Parse {
            path: path.to_string(),
            details: err.to_string(),
        })?;
        Ok(Self::from_defs(defs))
    }

    pub fn from_defs(defs: impl IntoIterator<Item = TileDef>) -> Self {
        Self {
            by_symbol: defs.into_iter().map(|def| (def.symbol, def)).collect(),
        }
    }

    pub fn tile_for(&self, symbol: char) -> Option<TileType> {
        self.by_symbol.get(&symbol).map(|def| def.tile)
    }

    /// Colour of the first legend entry for a tile type
    pub fn color(&self, tile: TileType) -> [u8; 3] {
        self.by_symbol
            .values()
            .find(|def| def.tile == tile)
            .map(|def| def.color)
            .unwrap_or([0, 0, 0])
    }

    /// Parse map rows into a grid. Every row must have the same width and
    /// every character must be in the legend.
    pub fn parse_rows(&self, map: &str, rows: &[String]) -> Result<Grid, CatalogError> {
        let mut parsed = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let mut line = Vec::with_capacity(row.len());
            for (x, symbol) in row.chars().enumerate() {
                let tile = self.tile_for(symbol).ok_or_else(|| CatalogError::InvalidMap {
                    map: map.to_string(),
                    details: format!("unknown tile '{symbol}' at ({x}, {y})"),
                })?;
                line.push(tile);
            }
            parsed.push(line);
        }
        if parsed.is_empty() {
            return Err(CatalogError::InvalidMap {
                map: map.to_string(),
                details: "map has no rows".to_string(),
            });
        }
        Grid::from_rows(parsed).ok_or_else(|| CatalogError::InvalidMap {
            map: map.to_string(),
            details: "rows have different widths".to_string(),
        })
    }
}
