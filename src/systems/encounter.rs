//! NPC-triggered encounters and their shared rewards.
//!
//! All monsters of one encounter point at the same `EncounterRewards` record
//! in an arena by index. The reward is granted once, when the last living
//! monster of the group dies.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use hecs::World;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{EncounterDef, EncounterRewardsDef, MonsterCatalog};
use crate::components::{EncounterMember, Health};
use crate::constants::*;
use crate::error::CatalogError;
use crate::grid::{world_to_tile, tile_center};
use crate::map::GameMap;

/// Index into the rewards arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RewardsId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRewards {
    pub gold: u32,
    pub experience: u32,
    pub message: String,
    pub quest: Option<String>,
    pub granted: bool,
}

impl From<&EncounterRewardsDef> for EncounterRewards {
    fn from(def: &EncounterRewardsDef) -> Self {
        Self {
            gold: def.gold,
            experience: def.experience,
            message: def.message.clone(),
            quest: def.quest.clone(),
            granted: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardsArena {
    entries: Vec<EncounterRewards>,
}

impl RewardsArena {
    pub fn insert(&mut self, rewards: EncounterRewards) -> RewardsId {
        self.entries.push(rewards);
        RewardsId(self.entries.len() - 1)
    }

    pub fn get(&self, id: RewardsId) -> Option<&EncounterRewards> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: RewardsId) -> Option<&mut EncounterRewards> {
        self.entries.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A monster placed by `start_encounter`
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedMonster {
    pub id: String,
    pub species: String,
    pub position: Vec2,
    pub half_size: f32,
}

/// Spawn an encounter's monsters around `center`. Each species rolls a count
/// in `[count_min, count_max]`; each monster gets up to
/// `ENCOUNTER_SPAWN_ATTEMPTS` random 3 to 5 tile offsets to find a walkable
/// tile. Failed placements are logged and skipped.
pub fn start_encounter(
    map: &mut GameMap,
    center: Vec2,
    encounter: &EncounterDef,
    monsters: &MonsterCatalog,
    arena: &mut RewardsArena,
    rng: &mut impl Rng,
) -> Result<Vec<SpawnedMonster>, CatalogError> {
    // Every species resolves before the arena or the world is touched
    let groups = encounter
        .monsters
        .iter()
        .map(|spec| monsters.get(&spec.species).map(|def| (spec, def)))
        .collect::<Result<Vec<_>, _>>()?;

    let rewards = arena.insert(EncounterRewards::from(&encounter.rewards));
    let mut spawned = Vec::new();
    let mut taken: BTreeSet<(i32, i32)> = BTreeSet::new();
    taken.insert(world_to_tile(center));

    for (spec, def) in groups {
        let (lo, hi) = (spec.count_min.min(spec.count_max), spec.count_max.max(spec.count_min));
        let count = rng.gen_range(lo..=hi);
        for _ in 0..count {
            let mut placed = None;
            for _ in 0..ENCOUNTER_SPAWN_ATTEMPTS {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let dist = rng.gen_range(ENCOUNTER_SPAWN_MIN_TILES..=ENCOUNTER_SPAWN_MAX_TILES) * TILE_SIZE;
                let (tx, ty) = world_to_tile(center + Vec2::from_angle(angle) * dist);
                if taken.contains(&(tx, ty)) || !map.grid.walkable_for(tx, ty, def.habitat, false) {
                    continue;
                }
                placed = Some((tx, ty));
                break;
            }
            let Some(tile) = placed else {
                log::warn!("Could not place {} for encounter near {:?}", def.name, world_to_tile(center));
                continue;
            };
            taken.insert(tile);
            let position = tile_center(tile.0, tile.1);
            let (_, id) = map.spawn_encounter_monster(def, position, Some(rewards));
            spawned.push(SpawnedMonster {
                id,
                species: def.key.clone(),
                position,
                half_size: def.half_size,
            });
        }
    }
    log::info!("Encounter started with {} monsters", spawned.len());
    Ok(spawned)
}

/// Reward groups whose last living member died this frame. `dead` lists the
/// rewards pointer of every encounter monster reaped this frame; `world` is
/// the map after reaping. Each returned id is marked granted.
pub fn resolve_finished_groups(
    dead: &[Option<RewardsId>],
    world: &World,
    arena: &mut RewardsArena,
) -> Vec<RewardsId> {
    let groups: BTreeSet<RewardsId> = dead.iter().flatten().copied().collect();
    if groups.is_empty() {
        return Vec::new();
    }
    let mut alive: BTreeMap<RewardsId, usize> = BTreeMap::new();
    for (_, (member, health)) in world.query::<(&EncounterMember, &Health)>().iter() {
        if let Some(id) = member.rewards {
            if !health.is_dead() {
                *alive.entry(id).or_default() += 1;
            }
        }
    }
    let mut finished = Vec::new();
    for id in groups {
        if alive.get(&id).copied().unwrap_or(0) > 0 {
            continue;
        }
        let Some(entry) = arena.get_mut(id) else {
            continue;
        };
        if entry.granted {
            continue;
        }
        entry.granted = true;
        finished.push(id);
    }
    finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EncounterMonsterDef};
    use crate::grid::Grid;
    use crate::spawning::test_monster_def;
    use crate::tile::TileType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rewards(gold: u32) -> EncounterRewards {
        EncounterRewards {
            gold,
            experience: 1,
            message: String::new(),
            quest: None,
            granted: false,
        }
    }

    #[test]
    fn test_group_granted_only_when_all_dead() {
        let mut map = GameMap::new("t", Grid::filled(20, 20, TileType::Floor), (1, 1));
        let mut arena = RewardsArena::default();
        let shared = arena.insert(rewards(10));
        let def = test_monster_def("goblin");
        let (a, _) = map.spawn_encounter_monster(&def, tile_center(3, 3), Some(shared));
        let (b, _) = map.spawn_encounter_monster(&def, tile_center(4, 3), Some(shared));

        // One dies, one remains
        map.world.despawn(a).unwrap();
        assert!(resolve_finished_groups(&[Some(shared)], &map.world, &mut arena).is_empty());

        map.world.despawn(b).unwrap();
        assert_eq!(resolve_finished_groups(&[Some(shared)], &map.world, &mut arena), vec![shared]);
        // Never twice
        assert!(resolve_finished_groups(&[Some(shared)], &map.world, &mut arena).is_empty());
    }

    #[test]
    fn test_same_frame_deaths_grant_once() {
        let map = GameMap::new("t", Grid::filled(20, 20, TileType::Floor), (1, 1));
        let mut arena = RewardsArena::default();
        let shared = arena.insert(rewards(10));
        let other = arena.insert(rewards(7));
        let finished = resolve_finished_groups(&[Some(shared), Some(shared)], &map.world, &mut arena);
        assert_eq!(finished, vec![shared]);
        assert!(!arena.get(other).unwrap().granted);
    }

    #[test]
    fn test_start_encounter_spawns_on_walkable_tiles() {
        let mut grid = Grid::filled(30, 30, TileType::Floor);
        for x in 0..30 {
            grid.set(x, 12, TileType::Wall);
        }
        let mut map = GameMap::new("t", grid, (15, 15));
        let monsters = Catalog::from_defs(vec![test_monster_def("goblin")]);
        let encounter = EncounterDef {
            monsters: vec![EncounterMonsterDef {
                species: "goblin".to_string(),
                count_min: 3,
                count_max: 3,
            }],
            rewards: EncounterRewardsDef::default(),
        };
        let mut arena = RewardsArena::default();
        let mut rng = StdRng::seed_from_u64(3);
        let spawned = start_encounter(&mut map, tile_center(15, 15), &encounter, &monsters, &mut arena, &mut rng)
            .unwrap();
        assert!(spawned.len() <= 3);
        assert_eq!(arena.len(), 1);
        for monster in &spawned {
            let (x, y) = world_to_tile(monster.position);
            assert!(map.grid.is_walkable(x, y));
        }
        assert_eq!(map.live_monster_count(), spawned.len());
    }

    #[test]
    fn test_spawn_failure_does_not_abort() {
        let mut map = GameMap::new("t", Grid::filled(3, 3, TileType::Floor), (1, 1));
        let monsters = Catalog::from_defs(vec![test_monster_def("goblin")]);
        let encounter = EncounterDef {
            monsters: vec![EncounterMonsterDef {
                species: "goblin".to_string(),
                count_min: 2,
                count_max: 2,
            }],
            rewards: EncounterRewardsDef::default(),
        };
        let mut arena = RewardsArena::default();
        let mut rng = StdRng::seed_from_u64(1);
        let spawned = start_encounter(&mut map, tile_center(1, 1), &encounter, &monsters, &mut arena, &mut rng)
            .unwrap();
        assert!(spawned.is_empty());
    }

    #[test]
    fn test_unknown_species_leaves_world_and_arena_untouched() {
        let mut map = GameMap::new("t", Grid::filled(30, 30, TileType::Floor), (15, 15));
        let monsters = Catalog::from_defs(vec![test_monster_def("goblin")]);
        let encounter = EncounterDef {
            monsters: vec![
                EncounterMonsterDef {
                    species: "goblin".to_string(),
                    count_min: 2,
                    count_max: 2,
                },
                EncounterMonsterDef {
                    species: "basilisk".to_string(),
                    count_min: 1,
                    count_max: 1,
                },
            ],
            rewards: EncounterRewardsDef::default(),
        };
        let mut arena = RewardsArena::default();
        let mut rng = StdRng::seed_from_u64(5);
        let result = start_encounter(&mut map, tile_center(15, 15), &encounter, &monsters, &mut arena, &mut rng);
        assert!(matches!(result, Err(CatalogError::MissingKey { .. })));
        assert!(arena.is_empty());
        assert_eq!(map.live_monster_count(), 0);
    }
}
