//! Core game state - owns the simulation data.
//!
//! Everything a save slot captures lives here, plus the transient
//! collision registry and projectile set of the current map. Loading a
//! save builds a whole new `GameState` and swaps it in.

use glam::Vec2;

use crate::camera::Camera;
use crate::catalog::{Catalogs, UtilityEffect};
use crate::collision::{CollisionSystem, EntityKind, PLAYER_ID};
use crate::components::{BodySize, Health, MonsterId, Position};
use crate::config::GameConfig;
use crate::constants::PLAYER_HALF_SIZE;
use crate::error::CatalogError;
use crate::level_up::LevelUpQueue;
use crate::map::GameMap;
use crate::map_manager::MapManager;
use crate::party::Party;
use crate::quests::QuestManager;
use crate::systems::combat::DeadSet;
use crate::systems::encounter::RewardsArena;
use crate::systems::projectile::ProjectileSet;
use crate::tile::Habitat;
use crate::time_system::TurnScheduler;

/// Core game state - owns all simulation data.
pub struct GameState {
    pub party: Party,

    /// The camera is the party's location on the current map
    pub camera: Camera,

    pub scheduler: TurnScheduler,

    /// Every loaded map, the current map key and the teleporter registry
    pub maps: MapManager,

    pub quests: QuestManager,

    pub level_ups: LevelUpQueue,

    /// Shared encounter rewards, indexed by `RewardsId`
    pub rewards: RewardsArena,

    /// Boxes of the current map only
    pub collision: CollisionSystem,

    pub projectiles: ProjectileSet,

    /// Monsters killed this frame, reaped at end of frame
    pub dead: DeadSet,

    pub game_over: bool,
}

impl GameState {
    /// Fresh game from the configured roster and the catalog maps
    pub fn new(config: &GameConfig, catalogs: &Catalogs) -> Result<Self, CatalogError> {
        let mut party = Party::from_roster(&config.party, &catalogs.classes, &catalogs.items)?;
        party.gold = config.starting_gold;
        party.food = config.starting_food;
        let maps = MapManager::load_all(catalogs, &config.starting_map)?;
        log::info!(
            "New game on '{}' with {} party members",
            maps.current_key(),
            party.len()
        );
        Ok(Self::from_parts(party, maps))
    }

    /// State around an already built party and map set, camera at the
    /// current map's start
    pub fn from_parts(party: Party, maps: MapManager) -> Self {
        let start = maps.current();
        let camera = Camera::new(start.start, start.start_angle);
        let mut state = Self {
            party,
            camera,
            scheduler: TurnScheduler::default(),
            maps,
            quests: QuestManager::default(),
            level_ups: LevelUpQueue::default(),
            rewards: RewardsArena::default(),
            collision: CollisionSystem::new(),
            projectiles: ProjectileSet::new(),
            dead: DeadSet::default(),
            game_over: false,
        };
        state.rebuild_collision();
        state
    }

    /// Single-map state for tests and tools
    pub fn with_map(party: Party, map: GameMap) -> Self {
        Self::from_parts(party, MapManager::new(map))
    }

    pub fn current_map(&self) -> &GameMap {
        self.maps.current()
    }

    pub fn walk_on_water(&self) -> bool {
        self.party.effects.is_active(UtilityEffect::WalkOnWater)
    }

    /// Drop every box and register the party plus the current map's live
    /// monsters again
    pub fn rebuild_collision(&mut self) {
        self.projectiles.clear(&mut self.collision);
        self.collision.clear();
        let walk_on_water = self.walk_on_water();
        let map = self.maps.current();
        self.collision.update_tile_checker(&map.grid, walk_on_water);
        self.collision.register_box(
            PLAYER_ID,
            EntityKind::Player,
            self.camera.position,
            PLAYER_HALF_SIZE,
            Habitat::Ground,
        );
        for (_, (id, pos, size, health, habitat)) in map
            .world
            .query::<(&MonsterId, &Position, &BodySize, &Health, &Habitat)>()
            .iter()
        {
            if health.is_dead() {
                continue;
            }
            self.collision
                .register_box(&id.0, EntityKind::Monster, pos.0, size.0, *habitat);
        }
    }

    /// Register one monster box on the current map
    pub fn register_monster(&mut self, id: &str, position: Vec2, half_size: f32, habitat: Habitat) {
        self.collision
            .register_box(id, EntityKind::Monster, position, half_size, habitat);
    }

    /// Move the party, keeping its collision box in step
    pub fn place_party(&mut self, position: Vec2) {
        self.camera.position = position;
        self.collision.update_entity(PLAYER_ID, position);
    }

    /// Make another loaded map current. Projectiles and boxes of the old map
    /// are dropped before the new map registers its own. Unknown keys are
    /// logged and leave everything unchanged.
    pub fn switch_map(&mut self, key: &str, position: Vec2) -> bool {
        if !self.maps.contains(key) {
            log::warn!("Cannot switch to unknown map '{key}'");
            return false;
        }
        self.maps.switch_to(key);
        self.camera.position = position;
        self.rebuild_collision();
        true
    }
}
