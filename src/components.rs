//! ECS components for monsters and NPCs living in a map's `hecs::World`.

use glam::Vec2;

use crate::catalog::{MonsterDef, NpcKind};
use crate::systems::encounter::RewardsId;

/// Continuous world-space position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

/// Stable id shared with the collision system and save files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonsterId(pub String);

/// Catalog key and display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    pub key: String,
    pub name: String,
}

/// Health component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn percentage(&self) -> f32 {
        (self.current as f32 / self.max.max(1) as f32).clamp(0.0, 1.0)
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonsterState {
    #[default]
    Idle,
    Wandering,
    Pursuing,
    Attacking,
    Fleeing,
    Dead,
}

/// Per-monster AI state machine
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterAI {
    pub state: MonsterState,
    /// Frames until the next attack while Attacking; wander frames otherwise
    pub state_timer: u32,
    /// Acts in turn-based monster turns even when out of vision
    pub engaged: bool,
    pub vision: f32,
    pub attack_radius: f32,
    /// Tiles per second
    pub speed: f32,
    pub attack_cooldown: u32,
    pub flee_threshold: f32,
    pub lost_sight_timer: u32,
    pub wander_dir: Vec2,
    /// Set while boxed in so the warning is logged once
    pub stuck: bool,
}

impl MonsterAI {
    pub fn from_def(def: &MonsterDef) -> Self {
        Self {
            state: MonsterState::Idle,
            state_timer: 0,
            engaged: false,
            vision: def.vision_tiles,
            attack_radius: def.attack_radius_tiles,
            speed: def.speed_tiles,
            attack_cooldown: def.attack_cooldown_frames,
            flee_threshold: def.flee_threshold,
            lost_sight_timer: 0,
            wander_dir: Vec2::ZERO,
            stuck: false,
        }
    }
}

/// How a monster hurts the party
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterAttack {
    pub damage_min: i32,
    pub damage_max: i32,
    pub projectile_weapon: Option<String>,
    pub projectile_spell: Option<String>,
    pub poison_chance: u32,
    pub poison_duration_sec: u32,
    pub fireburst_chance: u32,
    pub fireburst_damage: i32,
}

impl MonsterAttack {
    pub fn from_def(def: &MonsterDef) -> Self {
        Self {
            damage_min: def.damage_min,
            damage_max: def.damage_max.max(def.damage_min),
            projectile_weapon: def.projectile_weapon.clone(),
            projectile_spell: def.projectile_spell.clone(),
            poison_chance: def.poison_chance,
            poison_duration_sec: def.poison_duration_sec,
            fireburst_chance: def.fireburst_chance,
            fireburst_damage: def.fireburst_damage,
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.projectile_weapon.is_some() || self.projectile_spell.is_some()
    }
}

/// Collision half extent in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySize(pub f32);

/// Spawned by an encounter; shares its rewards record with the rest of the group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterMember {
    pub rewards: Option<RewardsId>,
}

/// Experience and gold granted on death
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounty {
    pub experience: u32,
    pub gold: u32,
}

/// Non-player character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub kind: NpcKind,
    pub visited: bool,
}
