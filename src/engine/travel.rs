//! Map travel: teleporter tiles, diving into deep water and resurfacing.

use glam::Vec2;

use crate::catalog::UtilityEffect;
use crate::collision::PLAYER_ID;
use crate::constants::RETURN_SEARCH_START_RADIUS;
use crate::events::GameEvent;
use crate::grid::{tile_center, world_to_tile};
use crate::map_manager::Endpoint;
use crate::systems::effects::UnderwaterReturn;
use crate::tile::TileType;

use super::Game;

impl Game {
    /// Step-on triggers for the tile the party just entered
    pub(super) fn after_party_moved(&mut self) {
        let tile = self.state.camera.tile();
        if tile == self.last_tile {
            return;
        }
        self.last_tile = tile;

        let Some(kind) = self
            .state
            .current_map()
            .grid
            .get(tile.0, tile.1)
            .and_then(|t| t.teleporter_kind())
        else {
            return;
        };
        let from = Endpoint {
            map: self.state.maps.current_key().to_string(),
            x: tile.0,
            y: tile.1,
        };
        let Some(destination) = self
            .state
            .maps
            .teleporters
            .choose_destination(kind, &from, self.now_ms, &mut self.rng)
        else {
            return;
        };
        log::info!(
            "Teleporting from {}:{:?} to {}:({}, {})",
            from.map,
            tile,
            destination.map,
            destination.x,
            destination.y
        );
        self.travel_to(&destination.map, tile_center(destination.x, destination.y));
        self.log.push("The teleporter hums and the world shifts");
    }

    /// Dive when the party walks into deep water while breathing water.
    /// Returns whether the party left the map.
    pub(super) fn try_dive(&mut self, target: Vec2) -> bool {
        let effects = &self.state.party.effects;
        if !effects.is_active(UtilityEffect::WaterBreathing) || effects.is_active(UtilityEffect::WalkOnWater) {
            return false;
        }
        if self.state.current_map().grid.tile_at(target) != Some(TileType::DeepWater) {
            return false;
        }
        let underwater = self.config.underwater_map.clone();
        let Some(start) = self.state.maps.get(&underwater).map(|m| m.start) else {
            log::warn!("Underwater map '{underwater}' is not loaded");
            return false;
        };
        if self.state.maps.current_key() == underwater {
            return false;
        }
        let shore = self.state.camera.position;
        self.state.party.effects.underwater_return = Some(UnderwaterReturn {
            map: self.state.maps.current_key().to_string(),
            x: shore.x,
            y: shore.y,
        });
        self.travel_to(&underwater, start);
        self.log.push("The party dives beneath the surface");
        true
    }

    /// Bring the party back to where it dove in. Lands on the nearest tile
    /// the party box fits on, clear of monsters. Without a usable return
    /// point the party surfaces at the start of the starting map.
    pub(super) fn underwater_return(&mut self) {
        let (key, spot) = match self.state.party.effects.underwater_return.take() {
            Some(back) if self.state.maps.contains(&back.map) => (back.map, Some(Vec2::new(back.x, back.y))),
            Some(back) => {
                log::warn!("Return map '{}' is not loaded", back.map);
                (self.config.starting_map.clone(), None)
            }
            None => {
                log::warn!("Water breathing ended underwater with no return point");
                (self.config.starting_map.clone(), None)
            }
        };
        let Some(start) = self.state.maps.get(&key).map(|m| m.start) else {
            log::error!("Cannot surface: map '{key}' is not loaded");
            return;
        };
        // Switch first so the surface map's monsters have collision boxes
        self.travel_to(&key, spot.unwrap_or(start));

        let state = &self.state;
        let map = state.current_map();
        let origin = world_to_tile(state.camera.position);
        let landing = map
            .grid
            .nearest_tile(origin, RETURN_SEARCH_START_RADIUS, |x, y| {
                map.grid.is_walkable(x, y) && state.collision.can_move_to(PLAYER_ID, tile_center(x, y))
            })
            .map_or(map.start, |(x, y)| tile_center(x, y));
        self.state.place_party(landing);
        self.last_tile = self.state.camera.tile();
        self.log.push("The party surfaces, gasping for air");
    }

    /// Switch maps (or warp within one) and announce it
    fn travel_to(&mut self, key: &str, position: Vec2) {
        let from = self.state.maps.current_key().to_string();
        if from == key {
            self.state.place_party(position);
        } else if !self.state.switch_map(key, position) {
            return;
        } else {
            self.events.push(GameEvent::MapSwitched {
                from,
                to: key.to_string(),
            });
        }
        self.last_tile = self.state.camera.tile();
    }
}
