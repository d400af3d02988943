//! Save slots.
//!
//! A save is one JSON record holding the party, the turn scheduler, every
//! loaded map's monsters and NPC flags, quest progress and played time.
//! Encounter rewards shared by several monsters are written once and
//! referenced by index, so the sharing survives the round-trip.
//!
//! Loading builds a complete new `GameState` on the side and swaps it in
//! only when every reference resolved; a failed load leaves the running
//! game untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::catalog::Catalogs;
use crate::components::{EncounterMember, Health, MonsterAI, MonsterId, Position, Species};
use crate::constants::SAVE_SLOT_COUNT;
use crate::error::SaveError;
use crate::level_up::LevelUpQueue;
use crate::map::GameMap;
use crate::map_manager::MapManager;
use crate::party::Party;
use crate::quests::{QuestManager, QuestProgress};
use crate::systems::encounter::{EncounterRewards, RewardsArena, RewardsId};
use crate::time_system::TurnScheduler;

use super::{Game, GameState};

pub const SAVE_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedCamera {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// One monster as written to a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMonster {
    pub species: String,
    pub x: f32,
    pub y: f32,
    pub hit_points: i32,
    #[serde(default)]
    pub encounter: bool,
    /// Index into `SaveData::encounter_rewards`
    #[serde(default)]
    pub rewards: Option<usize>,
    #[serde(default)]
    pub engaged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub version: u32,
    pub current_map: String,
    pub camera: SavedCamera,
    pub scheduler: TurnScheduler,
    pub party: Party,
    /// Monsters per map key
    pub monsters: BTreeMap<String, Vec<SavedMonster>>,
    /// Version 1 saves kept a single list for the current map
    pub monster_list: Vec<SavedMonster>,
    pub encounter_rewards: Vec<EncounterRewards>,
    /// NPC visited flags per map key
    pub npc_visited: BTreeMap<String, BTreeMap<String, bool>>,
    pub quests: Vec<QuestProgress>,
    pub level_ups: LevelUpQueue,
    pub played_ns: u64,
}

/// `save_dir/saveN.json` for slots 1 through `SAVE_SLOT_COUNT`
pub fn slot_path(save_dir: &std::path::Path, slot: u8) -> Result<PathBuf, SaveError> {
    if slot == 0 || slot > SAVE_SLOT_COUNT {
        return Err(SaveError::InvalidSlot(slot));
    }
    Ok(save_dir.join(format!("save{slot}.json")))
}

// =============================================================================
// CAPTURE
// =============================================================================

/// Live monsters of one map. Rewards pointers are renumbered through
/// `compact` in order of first appearance.
fn save_monsters(
    map: &GameMap,
    arena: &RewardsArena,
    compact: &mut BTreeMap<RewardsId, usize>,
    rewards: &mut Vec<EncounterRewards>,
) -> Vec<SavedMonster> {
    let mut rows: Vec<(String, SavedMonster)> = Vec::new();
    for (entity, (id, species, pos, health, ai)) in map
        .world
        .query::<(&MonsterId, &Species, &Position, &Health, &MonsterAI)>()
        .iter()
    {
        if health.is_dead() {
            continue;
        }
        let member = map.world.get::<&EncounterMember>(entity).ok().map(|m| *m);
        let index = member.and_then(|m| m.rewards).and_then(|rid| {
            if let Some(index) = compact.get(&rid) {
                return Some(*index);
            }
            let record = arena.get(rid)?.clone();
            rewards.push(record);
            compact.insert(rid, rewards.len() - 1);
            Some(rewards.len() - 1)
        });
        rows.push((
            id.0.clone(),
            SavedMonster {
                species: species.key.clone(),
                x: pos.0.x,
                y: pos.0.y,
                hit_points: health.current,
                encounter: member.is_some(),
                rewards: index,
                engaged: ai.engaged,
            },
        ));
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter().map(|(_, m)| m).collect()
}

impl GameState {
    pub fn to_save_data(&self, played_ns: u64) -> SaveData {
        puffin::profile_function!();
        let mut compact = BTreeMap::new();
        let mut encounter_rewards = Vec::new();
        let mut monsters = BTreeMap::new();
        let mut npc_visited = BTreeMap::new();
        for map in self.maps.maps() {
            monsters.insert(
                map.key.clone(),
                save_monsters(map, &self.rewards, &mut compact, &mut encounter_rewards),
            );
            let flags = map.visited_flags();
            if !flags.is_empty() {
                npc_visited.insert(map.key.clone(), flags);
            }
        }
        SaveData {
            version: SAVE_VERSION,
            current_map: self.maps.current_key().to_string(),
            camera: SavedCamera {
                x: self.camera.position.x,
                y: self.camera.position.y,
                angle: self.camera.angle(),
            },
            scheduler: self.scheduler.clone(),
            party: self.party.clone(),
            monsters,
            monster_list: Vec::new(),
            encounter_rewards,
            npc_visited,
            quests: self.quests.progress(),
            level_ups: self.level_ups.clone(),
            played_ns,
        }
    }

    // =========================================================================
    // RESTORE
    // =========================================================================

    /// Build a complete state from a save. Maps come fresh from the
    /// catalogs, then take the saved monsters and flags.
    pub fn from_save_data(data: SaveData, catalogs: &Catalogs) -> Result<Self, SaveError> {
        puffin::profile_function!();
        if !catalogs.maps.contains(&data.current_map) {
            return Err(SaveError::UnknownMap(data.current_map));
        }
        for member in &data.party.members {
            catalogs.classes.get(&member.class)?;
        }
        let mut maps = MapManager::load_all(catalogs, &data.current_map)?;

        let mut rewards = RewardsArena::default();
        let ids: Vec<RewardsId> = data
            .encounter_rewards
            .iter()
            .map(|record| rewards.insert(record.clone()))
            .collect();

        let mut saved_monsters = data.monsters;
        if saved_monsters.is_empty() && !data.monster_list.is_empty() {
            log::info!("Legacy save: monster list belongs to '{}'", data.current_map);
            saved_monsters.insert(data.current_map.clone(), data.monster_list);
        }
        for (key, list) in &saved_monsters {
            let Some(map) = maps.get_mut(key) else {
                log::warn!("Save lists monsters for unknown map '{key}'");
                continue;
            };
            restore_monsters(map, list, &ids, catalogs)?;
        }
        for (key, flags) in &data.npc_visited {
            let Some(map) = maps.get_mut(key) else {
                continue;
            };
            for (npc, visited) in flags {
                map.set_visited(npc, *visited);
            }
        }

        let mut quests = QuestManager::default();
        for progress in &data.quests {
            let def = catalogs.quests.get(&progress.id)?;
            quests.restore_quest_progress(def, progress.status, progress.count, progress.claimed);
        }

        let mut party = data.party;
        party.effects.rebuild_status();
        if party.selected >= party.len() {
            party.selected = 0;
        }

        let mut state = GameState::from_parts(party, maps);
        state.camera = Camera::new(Vec2::new(data.camera.x, data.camera.y), data.camera.angle);
        state.scheduler = data.scheduler;
        state.quests = quests;
        state.level_ups = data.level_ups;
        state.rewards = rewards;
        state.rebuild_collision();
        Ok(state)
    }
}

fn restore_monsters(
    map: &mut GameMap,
    saved: &[SavedMonster],
    ids: &[RewardsId],
    catalogs: &Catalogs,
) -> Result<(), SaveError> {
    map.clear_monsters();
    for monster in saved {
        let def = catalogs.monsters.get(&monster.species)?;
        let position = Vec2::new(monster.x, monster.y);
        let (entity, _) = if monster.encounter {
            let rewards = monster.rewards.and_then(|i| ids.get(i).copied());
            map.spawn_encounter_monster(def, position, rewards)
        } else {
            map.spawn_monster(def, position)
        };
        if let Ok((health, ai)) = map.world.query_one_mut::<(&mut Health, &mut MonsterAI)>(entity) {
            health.current = monster.hit_points.min(health.max);
            ai.engaged = monster.engaged;
        }
    }
    Ok(())
}

// =============================================================================
// SLOTS
// =============================================================================

impl Game {
    pub fn save_data(&self) -> SaveData {
        self.state.to_save_data(self.played_ns())
    }

    /// Replace the running game with a saved one
    pub fn restore(&mut self, data: SaveData) -> Result<(), SaveError> {
        let played_ns = data.played_ns;
        let state = GameState::from_save_data(data, &self.catalogs)?;
        self.state = state;
        self.set_played_ns(played_ns);
        self.last_tile = self.state.camera.tile();
        self.ui.dialog = None;
        self.ui.menu = None;
        self.ui.main_menu = false;
        Ok(())
    }

    pub fn save(&self, slot: u8) -> Result<PathBuf, SaveError> {
        let path = slot_path(&self.config.save_dir, slot)?;
        let data = self.save_data();
        fs::create_dir_all(&self.config.save_dir)?;
        fs::write(&path, serde_json::to_string_pretty(&data)?)?;
        log::info!("Saved slot {slot} to {}", path.display());
        Ok(path)
    }

    pub fn load(&mut self, slot: u8) -> Result<(), SaveError> {
        let path = slot_path(&self.config.save_dir, slot)?;
        if !path.exists() {
            return Err(SaveError::NotFound(slot));
        }
        let data: SaveData = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if data.version > SAVE_VERSION {
            log::warn!("Slot {slot} was written by a newer version ({})", data.version);
        }
        self.restore(data)?;
        log::info!("Loaded slot {slot}");
        Ok(())
    }

    pub(super) fn save_slot(&mut self, slot: u8) -> Result<(), SaveError> {
        match self.save(slot) {
            Ok(_) => {
                self.log.push("Game saved");
                Ok(())
            }
            Err(err) => {
                log::error!("Save to slot {slot} failed: {err}");
                self.log.push("Save failed");
                Err(err)
            }
        }
    }

    pub(super) fn load_slot(&mut self, slot: u8) -> Result<(), SaveError> {
        match self.load(slot) {
            Ok(()) => {
                self.log.push("Game loaded");
                Ok(())
            }
            Err(err) => {
                log::error!("Load from slot {slot} failed: {err}");
                self.log.push("Load failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{shipped, UtilityEffect};
    use crate::config::GameConfig;

    fn new_game() -> Game {
        let mut config = GameConfig::default();
        config.save_dir = std::env::temp_dir().join(format!("party-crawler-save-{}", std::process::id()));
        Game::with_seed(config, Arc::new(shipped()), 11).unwrap()
    }

    #[test]
    fn test_slot_range() {
        let dir = std::path::Path::new("saves");
        assert!(matches!(slot_path(dir, 0), Err(SaveError::InvalidSlot(0))));
        assert!(matches!(slot_path(dir, 6), Err(SaveError::InvalidSlot(6))));
        assert_eq!(slot_path(dir, 3).unwrap(), dir.join("save3.json"));
    }

    #[test]
    fn test_round_trip_keeps_party_and_monsters() {
        let mut game = new_game();
        game.state_mut().party.gold = 777;
        game.state_mut().party.effects.apply(UtilityEffect::TorchLight, 120, 4);
        let monsters_before = game.state().current_map().live_monster_count();
        let data = game.save_data();
        let json = serde_json::to_string(&data).unwrap();

        let mut other = new_game();
        other.restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(other.state().party.gold, 777);
        assert_eq!(other.state().current_map().live_monster_count(), monsters_before);
        assert!(other.state().party.effects.status_by_id().contains_key("torch_light"));
    }

    #[test]
    fn test_unknown_map_leaves_game_untouched() {
        let mut game = new_game();
        let mut data = game.save_data();
        data.current_map = "atlantis".to_string();
        data.party.gold = 1;
        assert!(matches!(game.restore(data), Err(SaveError::UnknownMap(_))));
        assert_ne!(game.state().party.gold, 1);
    }

    #[test]
    fn test_load_missing_slot() {
        let mut game = new_game();
        assert!(matches!(game.load(5), Err(SaveError::NotFound(5))));
    }
}
