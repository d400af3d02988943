//! Read-only view of the world for renderers.
//!
//! Built fresh every frame by `Game::snapshot()`. Borrows from the game, so
//! nothing here can change simulation state.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::camera::Camera;
use crate::catalog::UtilityEffect;
use crate::components::{Health, MonsterId, MonsterAI, MonsterState, Npc, Position, Species};
use crate::grid::Grid;
use crate::party::Condition;
use crate::systems::effects::UtilityStatus;
use crate::systems::projectile::{Projectile, SlashEffect};
use crate::time_system::TurnMode;

use super::Game;

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterSprite {
    pub id: String,
    pub species: String,
    pub name: String,
    pub position: Vec2,
    pub state: MonsterState,
    /// Remaining hit points as a fraction of the maximum
    pub health: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcSprite {
    pub id: String,
    pub name: String,
    pub position: Vec2,
    pub visited: bool,
}

/// Portrait bars of one party member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBar {
    pub name: String,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub spell_points: i32,
    pub max_spell_points: i32,
    pub condition: Condition,
    pub selected: bool,
    /// Frames until the member can act again
    pub cooldown: u32,
}

pub struct WorldSnapshot<'a> {
    pub map_key: &'a str,
    pub map_name: &'a str,
    pub camera: Camera,
    pub grid: &'a Grid,
    pub floor_color: [u8; 3],
    pub monsters: Vec<MonsterSprite>,
    pub npcs: Vec<NpcSprite>,
    pub projectiles: &'a [Projectile],
    pub slashes: &'a [SlashEffect],
    pub party: Vec<MemberBar>,
    pub gold: u32,
    pub food: u32,
    pub status: BTreeMap<&'static str, &'a UtilityStatus>,
    /// Light radius in tiles, when a torch burns
    pub torch_radius: Option<f32>,
    pub wizard_eye: bool,
    pub map_overlay: bool,
    pub mode: TurnMode,
    pub log: Vec<&'a str>,
    /// FPS overlay text when enabled
    pub fps: Option<String>,
    pub game_over: bool,
}

impl Game {
    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        puffin::profile_function!();
        let map = self.state.current_map();

        let mut monsters: Vec<MonsterSprite> = map
            .world
            .query::<(&MonsterId, &Species, &Position, &Health, &MonsterAI)>()
            .iter()
            .map(|(_, (id, species, pos, health, ai))| MonsterSprite {
                id: id.0.clone(),
                species: species.key.clone(),
                name: species.name.clone(),
                position: pos.0,
                state: ai.state,
                health: health.current.max(0) as f32 / health.max.max(1) as f32,
            })
            .collect();
        // Stable draw order
        monsters.sort_by(|a, b| a.id.cmp(&b.id));

        let npcs = map
            .world
            .query::<(&Npc, &Position)>()
            .iter()
            .map(|(_, (npc, pos))| NpcSprite {
                id: npc.id.clone(),
                name: npc.name.clone(),
                position: pos.0,
                visited: npc.visited,
            })
            .collect();

        let party = &self.state.party;
        let bars = party
            .members
            .iter()
            .enumerate()
            .map(|(index, c)| MemberBar {
                name: c.name.clone(),
                hit_points: c.hit_points,
                max_hit_points: c.max_hit_points,
                spell_points: c.spell_points,
                max_spell_points: c.max_spell_points,
                condition: c.condition(),
                selected: index == party.selected,
                cooldown: c.action_cooldown,
            })
            .collect();

        let effects = &party.effects;
        WorldSnapshot {
            map_key: &map.key,
            map_name: &map.name,
            camera: self.state.camera,
            grid: &map.grid,
            floor_color: map.floor_color,
            monsters,
            npcs,
            projectiles: self.state.projectiles.projectiles(),
            slashes: self.state.projectiles.slashes(),
            party: bars,
            gold: party.gold,
            food: party.food,
            status: effects.status_by_id(),
            torch_radius: effects
                .is_active(UtilityEffect::TorchLight)
                .then_some(effects.torch_radius),
            wizard_eye: effects.is_active(UtilityEffect::WizardEye),
            map_overlay: self.ui.map_overlay,
            mode: self.state.scheduler.mode,
            log: self.log.lines().collect(),
            fps: self.metrics.show_fps.then(|| self.metrics.overlay()),
            game_over: self.state.game_over,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::shipped;
    use crate::config::GameConfig;
    use crate::engine::GameState;
    use crate::grid::tile_center;
    use crate::map::GameMap;
    use crate::party::{test_character, Party};
    use crate::spawning::test_monster_def;
    use crate::tile::TileType;

    #[test]
    fn test_snapshot_lists_monsters_and_bars() {
        let mut map = GameMap::new("field", Grid::filled(10, 10, TileType::Floor), (1, 1));
        map.spawn_monster(&test_monster_def("goblin"), tile_center(5, 5));
        let state = GameState::with_map(
            Party::new(vec![test_character("Ayla"), test_character("Bren")]),
            map,
        );
        let game = Game::from_state(GameConfig::default(), Arc::new(shipped()), state, 1);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.map_key, "field");
        assert_eq!(snapshot.monsters.len(), 1);
        assert_eq!(snapshot.monsters[0].health, 1.0);
        assert_eq!(snapshot.party.len(), 2);
        assert!(snapshot.party[0].selected);
        assert!(snapshot.torch_radius.is_none());
        assert!(snapshot.fps.is_none());
    }
}
