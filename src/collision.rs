//! Collision registry for the current map.
//!
//! Keeps one axis-aligned box per registered id and answers movement
//! queries against the tile grid and every other box. Boxes are updated
//! incrementally when entities move, spawn, or die.

use std::collections::HashMap;

use glam::Vec2;

use crate::grid::{world_to_tile, Grid};
use crate::tile::Habitat;

/// Collision id of the party's box
pub const PLAYER_ID: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Monster,
    Projectile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEntity {
    pub kind: EntityKind,
    pub center: Vec2,
    pub half_size: Vec2,
    pub habitat: Habitat,
    /// Firing entity, for projectiles
    pub owner: Option<String>,
}

impl CollisionEntity {
    fn overlaps_at(&self, center: Vec2, other: &CollisionEntity) -> bool {
        let delta = (center - other.center).abs();
        let reach = self.half_size + other.half_size;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Tile walkability for the current map
#[derive(Debug, Clone)]
struct TileChecker {
    grid: Grid,
    walk_on_water: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CollisionSystem {
    entities: HashMap<String, CollisionEntity>,
    tiles: Option<TileChecker>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point tile queries at a new map
    pub fn update_tile_checker(&mut self, grid: &Grid, walk_on_water: bool) {
        self.tiles = Some(TileChecker {
            grid: grid.clone(),
            walk_on_water,
        });
    }

    pub fn set_walk_on_water(&mut self, walk_on_water: bool) {
        if let Some(tiles) = self.tiles.as_mut() {
            tiles.walk_on_water = walk_on_water;
        }
    }

    pub fn walk_on_water(&self) -> bool {
        self.tiles.as_ref().is_some_and(|t| t.walk_on_water)
    }

    /// Register an entity. Registering an id again replaces its box.
    pub fn register_entity(&mut self, id: &str, entity: CollisionEntity) {
        self.entities.insert(id.to_string(), entity);
    }

    pub fn register_box(&mut self, id: &str, kind: EntityKind, center: Vec2, half_size: f32, habitat: Habitat) {
        self.register_entity(
            id,
            CollisionEntity {
                kind,
                center,
                half_size: Vec2::splat(half_size),
                habitat,
                owner: None,
            },
        );
    }

    pub fn update_entity(&mut self, id: &str, center: Vec2) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.center = center;
        }
    }

    pub fn unregister_entity(&mut self, id: &str) {
        self.entities.remove(id);
    }

    /// Drop every box (map switch)
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn get(&self, id: &str) -> Option<&CollisionEntity> {
        self.entities.get(id)
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.entities.get(id).map(|e| e.center)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(|k| k.as_str())
    }

    fn tile_blocked(&self, point: Vec2, habitat: Habitat, walk_on_water: bool) -> bool {
        let Some(tiles) = self.tiles.as_ref() else {
            return false;
        };
        let (x, y) = world_to_tile(point);
        !tiles.grid.walkable_for(x, y, habitat, walk_on_water)
    }

    /// Whether the tile under a point blocks the given habitat
    pub fn is_tile_blocked(&self, point: Vec2, habitat: Habitat) -> bool {
        self.tile_blocked(point, habitat, self.walk_on_water())
    }

    fn box_blocked(&self, center: Vec2, half_size: Vec2, habitat: Habitat, walk_on_water: bool) -> bool {
        let inset = half_size - Vec2::splat(0.01);
        [
            Vec2::new(-inset.x, -inset.y),
            Vec2::new(inset.x, -inset.y),
            Vec2::new(-inset.x, inset.y),
            Vec2::new(inset.x, inset.y),
        ]
        .iter()
        .any(|corner| self.tile_blocked(center + *corner, habitat, walk_on_water))
    }

    /// Whether any corner of a box centred at `center` lands on a blocking tile
    pub fn is_box_blocked(&self, center: Vec2, half_size: Vec2, habitat: Habitat) -> bool {
        self.box_blocked(center, half_size, habitat, self.walk_on_water())
    }

    /// Whether an entity's box at `center` would overlap blocking tiles.
    /// Walk-on-water only carries the party.
    fn blocks_entity(&self, entity: &CollisionEntity, center: Vec2) -> bool {
        let walk_on_water = self.walk_on_water() && entity.kind == EntityKind::Player;
        self.box_blocked(center, entity.half_size, entity.habitat, walk_on_water)
    }

    /// Whether a registered entity currently stands on blocking tiles
    pub fn is_stranded(&self, id: &str) -> bool {
        self.entities
            .get(id)
            .is_some_and(|entity| self.blocks_entity(entity, entity.center))
    }

    /// Whether `id` may move its box to `center`. Blocked by tiles and by any
    /// other non-projectile box, except the entity itself and its owner.
    pub fn can_move_to(&self, id: &str, center: Vec2) -> bool {
        let Some(mover) = self.entities.get(id) else {
            return false;
        };
        if self.blocks_entity(mover, center) {
            return false;
        }
        !self.entities.iter().any(|(other_id, other)| {
            other_id != id
                && other.kind != EntityKind::Projectile
                && mover.owner.as_deref() != Some(other_id.as_str())
                && other.owner.as_deref() != Some(id)
                && mover.overlaps_at(center, other)
        })
    }

    /// Ids of every box overlapping `id`'s box, sorted for stable iteration
    pub fn overlapping(&self, id: &str) -> Vec<String> {
        let Some(subject) = self.entities.get(id) else {
            return Vec::new();
        };
        let mut hits: Vec<String> = self
            .entities
            .iter()
            .filter(|(other_id, other)| *other_id != id && subject.overlaps_at(subject.center, other))
            .map(|(other_id, _)| other_id.clone())
            .collect();
        hits.sort();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TILE_SIZE;
    use crate::grid::tile_center;
    use crate::tile::TileType;

    fn open_system() -> CollisionSystem {
        let mut grid = Grid::filled(10, 10, TileType::Floor);
        grid.set(5, 5, TileType::Wall);
        grid.set(6, 5, TileType::DeepWater);
        let mut system = CollisionSystem::new();
        system.update_tile_checker(&grid, false);
        system
    }

    #[test]
    fn test_register_twice_updates_instead_of_duplicating() {
        let mut system = open_system();
        system.register_box("m1", EntityKind::Monster, tile_center(1, 1), 20.0, Habitat::Ground);
        system.register_box("m1", EntityKind::Monster, tile_center(2, 2), 20.0, Habitat::Ground);
        assert_eq!(system.len(), 1);
        assert_eq!(system.position("m1"), Some(tile_center(2, 2)));
    }

    #[test]
    fn test_walls_and_deep_water_block() {
        let mut system = open_system();
        system.register_box("player", EntityKind::Player, tile_center(4, 5), 16.0, Habitat::Ground);
        assert!(!system.can_move_to("player", tile_center(5, 5)));
        assert!(!system.can_move_to("player", tile_center(6, 5)));
        system.set_walk_on_water(true);
        assert!(system.can_move_to("player", tile_center(6, 5)));
    }

    #[test]
    fn test_habitat_consulted() {
        let mut system = open_system();
        system.register_box("fish", EntityKind::Monster, tile_center(6, 5), 20.0, Habitat::Aquatic);
        system.register_box("bat", EntityKind::Monster, tile_center(6, 4), 20.0, Habitat::Flying);
        assert!(!system.can_move_to("fish", tile_center(6, 6)));
        assert!(system.can_move_to("bat", tile_center(7, 4)));
        assert!(!system.can_move_to("bat", tile_center(5, 5)));
        // Occupied by the fish
        assert!(!system.can_move_to("bat", tile_center(6, 5)));
    }

    #[test]
    fn test_entities_block_each_other_but_not_self() {
        let mut system = open_system();
        system.register_box("a", EntityKind::Monster, tile_center(1, 1), 20.0, Habitat::Ground);
        system.register_box("b", EntityKind::Monster, tile_center(2, 1), 20.0, Habitat::Ground);
        assert!(system.can_move_to("a", tile_center(1, 1) + Vec2::new(4.0, 0.0)));
        assert!(!system.can_move_to("a", tile_center(2, 1) - Vec2::new(TILE_SIZE / 4.0, 0.0)));
    }

    #[test]
    fn test_projectiles_ignore_owner_and_do_not_block() {
        let mut system = open_system();
        system.register_box("player", EntityKind::Player, tile_center(1, 1), 16.0, Habitat::Ground);
        system.register_entity(
            "arrow",
            CollisionEntity {
                kind: EntityKind::Projectile,
                center: tile_center(1, 1),
                half_size: Vec2::splat(6.0),
                habitat: Habitat::Flying,
                owner: Some("player".to_string()),
            },
        );
        assert!(system.can_move_to("arrow", tile_center(1, 1)));
        assert!(system.can_move_to("player", tile_center(1, 1) + Vec2::new(2.0, 0.0)));
        assert_eq!(system.overlapping("player"), vec!["arrow".to_string()]);
    }

    #[test]
    fn test_walk_on_water_carries_only_the_party() {
        let mut system = open_system();
        system.set_walk_on_water(true);
        system.register_box("m1", EntityKind::Monster, tile_center(6, 4), 20.0, Habitat::Ground);
        assert!(!system.can_move_to("m1", tile_center(6, 5)));
        system.register_box("m2", EntityKind::Monster, tile_center(6, 5), 20.0, Habitat::Ground);
        assert!(system.is_stranded("m2"));
        assert!(!system.is_stranded("m1"));
    }

    #[test]
    fn test_unregister() {
        let mut system = open_system();
        system.register_box("a", EntityKind::Monster, tile_center(1, 1), 20.0, Habitat::Ground);
        system.unregister_entity("a");
        assert!(!system.contains("a"));
        assert!(!system.can_move_to("a", tile_center(1, 1)));
    }
}
