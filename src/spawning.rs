//! Data-driven monster and NPC spawning.
//!
//! Monster bundles are assembled from catalog definitions so new species
//! need no code changes.

use glam::Vec2;
use hecs::{Entity, World};

use crate::catalog::{MonsterDef, NpcDef};
use crate::components::{
    BodySize, Bounty, EncounterMember, Health, MonsterAI, MonsterAttack, MonsterId, Npc, Position,
    Species,
};
use crate::grid::tile_center;
use crate::systems::encounter::RewardsId;

/// Spawn a monster of the given species at a world position
pub fn spawn_monster(world: &mut World, def: &MonsterDef, id: String, pos: Vec2) -> Entity {
    world.spawn((
        Position(pos),
        MonsterId(id),
        Species {
            key: def.key.clone(),
            name: def.name.clone(),
        },
        Health::new(def.hit_points),
        MonsterAI::from_def(def),
        MonsterAttack::from_def(def),
        def.habitat,
        BodySize(def.half_size),
        Bounty {
            experience: def.experience,
            gold: def.gold,
        },
    ))
}

/// Tag a monster as part of an encounter group
pub fn mark_encounter_member(world: &mut World, entity: Entity, rewards: Option<RewardsId>) {
    // Entity was just spawned by the caller
    let _ = world.insert_one(entity, EncounterMember { rewards });
}

pub fn spawn_npc(world: &mut World, def: &NpcDef) -> Entity {
    world.spawn((
        Position(tile_center(def.x, def.y)),
        Npc {
            id: def.id.clone(),
            name: def.name.clone(),
            kind: def.kind,
            visited: false,
        },
    ))
}

#[cfg(test)]
pub(crate) fn test_monster_def(key: &str) -> MonsterDef {
    MonsterDef {
        key: key.to_string(),
        name: key.to_string(),
        hit_points: 20,
        damage_min: 2,
        damage_max: 4,
        attack_radius_tiles: 1.2,
        vision_tiles: 8.0,
        speed_tiles: 1.5,
        habitat: crate::tile::Habitat::Ground,
        attack_cooldown_frames: 90,
        projectile_weapon: None,
        projectile_spell: None,
        poison_chance: 0,
        poison_duration_sec: 0,
        fireburst_chance: 0,
        fireburst_damage: 0,
        experience: 10,
        gold: 3,
        flee_threshold: 0.0,
        half_size: 20.0,
    }
}
