//! One loaded map: tile grid plus the ECS world holding its monsters and NPCs.

use std::collections::BTreeMap;

use glam::Vec2;
use hecs::{Entity, World};

use crate::catalog::{Catalogs, MapDef, MonsterDef, NpcDef};
use crate::components::{Health, MonsterId, Npc, Position};
use crate::error::CatalogError;
use crate::grid::{tile_center, Grid};
use crate::spawning::{mark_encounter_member, spawn_monster, spawn_npc};
use crate::systems::encounter::RewardsId;
use crate::tile::TeleporterKind;

pub struct GameMap {
    pub key: String,
    pub name: String,
    pub grid: Grid,
    pub world: World,
    /// Party start in world units
    pub start: Vec2,
    pub start_angle: f32,
    pub biome: String,
    pub floor_color: [u8; 3],
    /// Dialogue, stock and encounter data of the NPCs on this map
    npc_defs: BTreeMap<String, NpcDef>,
    next_serial: u64,
}

impl GameMap {
    /// An empty map over an existing grid
    pub fn new(key: &str, grid: Grid, start: (i32, i32)) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            grid,
            world: World::new(),
            start: tile_center(start.0, start.1),
            start_angle: 0.0,
            biome: String::new(),
            floor_color: [0, 0, 0],
            npc_defs: BTreeMap::new(),
            next_serial: 0,
        }
    }

    /// Build from a map definition, spawning its monsters and NPCs
    pub fn from_def(def: &MapDef, catalogs: &Catalogs) -> Result<Self, CatalogError> {
        let grid = def.build_grid(&catalogs.tiles)?;
        let mut map = Self::new(&def.key, grid, (def.start.x, def.start.y));
        map.name = if def.name.is_empty() {
            def.key.clone()
        } else {
            def.name.clone()
        };
        map.start_angle = def.start.angle_deg.to_radians();
        map.biome = def.biome.clone();
        map.floor_color = def.floor_color;
        for spec in &def.monsters {
            let monster = catalogs.monsters.get(&spec.species)?;
            map.spawn_monster(monster, tile_center(spec.x, spec.y));
        }
        for npc in &def.npcs {
            map.add_npc(npc.clone());
        }
        Ok(map)
    }

    /// Fresh monster id unique within this map
    pub fn next_monster_id(&mut self) -> String {
        self.next_serial += 1;
        format!("{}:m{}", self.key, self.next_serial)
    }

    pub fn spawn_monster(&mut self, def: &MonsterDef, pos: Vec2) -> (Entity, String) {
        let id = self.next_monster_id();
        let entity = spawn_monster(&mut self.world, def, id.clone(), pos);
        (entity, id)
    }

    /// Spawn a monster belonging to an encounter group
    pub fn spawn_encounter_monster(
        &mut self,
        def: &MonsterDef,
        pos: Vec2,
        rewards: Option<RewardsId>,
    ) -> (Entity, String) {
        let (entity, id) = self.spawn_monster(def, pos);
        mark_encounter_member(&mut self.world, entity, rewards);
        (entity, id)
    }

    pub fn monster_entity(&self, id: &str) -> Option<Entity> {
        self.world
            .query::<&MonsterId>()
            .iter()
            .find(|(_, mid)| mid.0 == id)
            .map(|(e, _)| e)
    }

    /// Monsters still standing
    pub fn live_monster_count(&self) -> usize {
        self.world
            .query::<&Health>()
            .with::<&MonsterId>()
            .iter()
            .filter(|(_, h)| !h.is_dead())
            .count()
    }

    /// Ids and positions of every monster, sorted by id
    pub fn monster_positions(&self) -> Vec<(String, Vec2)> {
        let mut out: Vec<(String, Vec2)> = self
            .world
            .query::<(&MonsterId, &Position)>()
            .iter()
            .map(|(_, (id, pos))| (id.0.clone(), pos.0))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn teleporter_tiles(&self) -> Vec<(TeleporterKind, i32, i32)> {
        let mut out = Vec::new();
        for y in 0..self.grid.height as i32 {
            for x in 0..self.grid.width as i32 {
                if let Some(kind) = self.grid.get(x, y).and_then(|t| t.teleporter_kind()) {
                    out.push((kind, x, y));
                }
            }
        }
        out
    }

    pub fn add_npc(&mut self, def: NpcDef) -> Entity {
        let entity = spawn_npc(&mut self.world, &def);
        self.npc_defs.insert(def.id.clone(), def);
        entity
    }

    pub fn npc_def(&self, npc_id: &str) -> Option<&NpcDef> {
        self.npc_defs.get(npc_id)
    }

    pub fn npc_entity(&self, npc_id: &str) -> Option<Entity> {
        self.world
            .query::<&Npc>()
            .iter()
            .find(|(_, npc)| npc.id == npc_id)
            .map(|(e, _)| e)
    }

    pub fn visited_flags(&self) -> BTreeMap<String, bool> {
        self.world
            .query::<&Npc>()
            .iter()
            .map(|(_, npc)| (npc.id.clone(), npc.visited))
            .collect()
    }

    pub fn set_visited(&mut self, npc_id: &str, visited: bool) {
        for (_, npc) in self.world.query_mut::<&mut Npc>() {
            if npc.id == npc_id {
                npc.visited = visited;
            }
        }
    }

    /// Remove every monster (before restoring a saved monster list)
    pub fn clear_monsters(&mut self) {
        let ids: Vec<Entity> = self
            .world
            .query::<&MonsterId>()
            .iter()
            .map(|(e, _)| e)
            .collect();
        for entity in ids {
            let _ = self.world.despawn(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawning::test_monster_def;
    use crate::tile::TileType;

    #[test]
    fn test_monster_ids_are_unique_and_prefixed() {
        let mut map = GameMap::new("forest", Grid::filled(8, 8, TileType::Floor), (1, 1));
        let def = test_monster_def("goblin");
        let (_, a) = map.spawn_monster(&def, tile_center(2, 2));
        let (_, b) = map.spawn_monster(&def, tile_center(3, 2));
        assert_ne!(a, b);
        assert!(a.starts_with("forest:"));
        assert_eq!(map.live_monster_count(), 2);
        assert!(map.monster_entity(&b).is_some());
        map.clear_monsters();
        assert_eq!(map.live_monster_count(), 0);
    }

    #[test]
    fn test_teleporter_tiles() {
        let mut grid = Grid::filled(5, 5, TileType::Floor);
        grid.set(1, 3, TileType::RedTeleporter);
        let map = GameMap::new("cave", grid, (0, 0));
        assert_eq!(map.teleporter_tiles(), vec![(TeleporterKind::Red, 1, 3)]);
    }
}
