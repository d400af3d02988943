use glam::Vec2;

use crate::constants::TILE_SIZE;
use crate::tile::{Habitat, TileType};

/// Width x height tile matrix of one map.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileType>,
}

impl Grid {
    /// A grid filled with a single tile type.
    pub fn filled(width: usize, height: usize, tile: TileType) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width * height],
        }
    }

    /// Build from rows; returns None if any row has the wrong width.
    pub fn from_rows(rows: Vec<Vec<TileType>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    pub fn get(&self, x: i32, y: i32) -> Option<TileType> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.tiles[y as usize * self.width + x as usize])
    }

    pub fn set(&mut self, x: i32, y: i32, tile: TileType) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.tiles[y as usize * self.width + x as usize] = tile;
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).map(|t| t.is_walkable()).unwrap_or(false)
    }

    pub fn walkable_for(&self, x: i32, y: i32, habitat: Habitat, walk_on_water: bool) -> bool {
        self.get(x, y)
            .map(|t| t.walkable_for(habitat, walk_on_water))
            .unwrap_or(false)
    }

    /// Tile under a world-space point
    pub fn tile_at(&self, pos: Vec2) -> Option<TileType> {
        let (x, y) = world_to_tile(pos);
        self.get(x, y)
    }

    /// Nearest tile (by ring search) satisfying `accept`, starting at
    /// `start_radius` and widening until the whole grid has been covered.
    pub fn nearest_tile(
        &self,
        origin: (i32, i32),
        start_radius: i32,
        accept: impl Fn(i32, i32) -> bool,
    ) -> Option<(i32, i32)> {
        if accept(origin.0, origin.1) {
            return Some(origin);
        }
        let max_radius = self.width.max(self.height) as i32 + origin.0.abs() + origin.1.abs();
        let mut radius = start_radius.max(1);
        while radius <= max_radius {
            let mut best: Option<((i32, i32), i32)> = None;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let (x, y) = (origin.0 + dx, origin.1 + dy);
                    if !accept(x, y) {
                        continue;
                    }
                    let dist = dx * dx + dy * dy;
                    if best.map_or(true, |(_, d)| dist < d) {
                        best = Some(((x, y), dist));
                    }
                }
            }
            if let Some((tile, _)) = best {
                return Some(tile);
            }
            radius += 1;
        }
        None
    }
}

/// Tile coordinates containing a world-space point
pub fn world_to_tile(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / TILE_SIZE).floor() as i32,
        (pos.y / TILE_SIZE).floor() as i32,
    )
}

/// World-space centre of a tile
pub fn tile_center(x: i32, y: i32) -> Vec2 {
    Vec2::new((x as f32 + 0.5) * TILE_SIZE, (y as f32 + 0.5) * TILE_SIZE)
}

/// Distance between two points measured in tiles
pub fn tile_distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b) / TILE_SIZE
}
