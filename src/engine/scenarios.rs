//! Whole-frame scenarios run through `Game::update`.

use std::sync::Arc;

use glam::Vec2;

use super::{Game, GameState};
use crate::catalog::{shipped, Catalogs, ItemCatalogExt, UtilityEffect};
use crate::collision::PLAYER_ID;
use crate::components::{Health, MonsterAI, MonsterState, Position};
use crate::config::GameConfig;
use crate::error::ActionRefusal;
use crate::events::GameEvent;
use crate::grid::{tile_center, Grid};
use crate::input::{FrameInput, Intent, MoveDir};
use crate::catalog::LevelChoiceOption;
use crate::level_up::LevelUpRequest;
use crate::map::GameMap;
use crate::party::{test_character, Character, Condition, EquipSlot, Party, SkillType};
use crate::spawning::test_monster_def;
use crate::systems::effects::UnderwaterReturn;
use crate::systems::encounter::{EncounterRewards, RewardsId};
use crate::systems::projectile::{Launch, ProjectileKind, ProjectileOwner};
use crate::tile::TileType;
use crate::time_system::{Turn, TurnMode};

const FRAME_MS: u64 = 16;

fn catalogs() -> Arc<Catalogs> {
    Arc::new(shipped())
}

fn game_on(map: GameMap, members: Vec<Character>) -> Game {
    let state = GameState::with_map(Party::new(members), map);
    Game::from_state(GameConfig::default(), catalogs(), state, 42)
}

fn shipped_game() -> Game {
    Game::with_seed(GameConfig::default(), catalogs(), 42).unwrap()
}

fn frame(game: &mut Game, n: u64, intents: Vec<Intent>) {
    game.update(&FrameInput::new(n * FRAME_MS, intents));
}

fn monster_ai(game: &Game, id: &str) -> MonsterAI {
    let map = game.state().current_map();
    let entity = map.monster_entity(id).unwrap();
    let ai = (*map.world.get::<&MonsterAI>(entity).unwrap()).clone();
    ai
}

fn monster_pos(game: &Game, id: &str) -> Vec2 {
    let map = game.state().current_map();
    let entity = map.monster_entity(id).unwrap();
    let pos = map.world.get::<&Position>(entity).unwrap().0;
    pos
}

fn monster_hp(game: &Game, id: &str) -> i32 {
    let map = game.state().current_map();
    let entity = map.monster_entity(id).unwrap();
    let hp = map.world.get::<&Health>(entity).unwrap().current;
    hp
}

fn aim(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

fn turn_based(game: &mut Game) {
    if game.state().scheduler.mode != TurnMode::TurnBased {
        game.state_mut().scheduler.toggle_mode();
    }
}

// =============================================================================
// TURN-BASED PACK ENGAGEMENT
// =============================================================================

#[test]
fn test_ranged_hit_engages_nearby_pack_in_turn_based_mode() {
    let mut map = GameMap::new("s1", Grid::filled(40, 40, TileType::Floor), (1, 1));
    let mut goblin = test_monster_def("goblin");
    goblin.hit_points = 500;
    let orc = test_monster_def("orc");
    let (_, hit) = map.spawn_monster(&goblin, tile_center(12, 13));
    let (_, near) = map.spawn_monster(&goblin, tile_center(18, 13));
    let (_, far) = map.spawn_monster(&goblin, tile_center(22, 13));
    let (_, other) = map.spawn_monster(&orc, tile_center(12, 19));

    let catalogs = catalogs();
    let mut archer = test_character("Tobin");
    archer
        .equipment
        .insert(EquipSlot::MainHand, catalogs.items.instantiate("shortbow").unwrap());
    let state = GameState::with_map(Party::new(vec![archer]), map);
    let mut game = Game::from_state(GameConfig::default(), catalogs, state, 42);
    turn_based(&mut game);

    let origin = tile_center(1, 1);
    game.set_camera(origin, aim(origin, tile_center(12, 13)));
    game.attack().unwrap();
    for n in 0..150 {
        frame(&mut game, n, Vec::new());
        if game.state().projectiles.is_empty() {
            break;
        }
    }
    assert!(monster_hp(&game, &hit) < 500);

    assert!(monster_ai(&game, &hit).engaged);
    assert!(monster_ai(&game, &near).engaged);
    assert!(!monster_ai(&game, &far).engaged);
    assert!(!monster_ai(&game, &other).engaged);

    let hit_before = monster_pos(&game, &hit);
    let far_before = monster_pos(&game, &far);
    let other_before = monster_pos(&game, &other);
    game.state_mut().scheduler.register_step();
    frame(&mut game, 200, Vec::new());
    assert_eq!(game.state().scheduler.turn, Turn::Party);

    // Far beyond vision, but engaged
    assert_ne!(monster_pos(&game, &hit), hit_before);
    assert_eq!(monster_pos(&game, &far), far_before);
    assert_eq!(monster_pos(&game, &other), other_before);
}

// =============================================================================
// ENCOUNTER REWARDS
// =============================================================================

fn rewards(gold: u32, experience: u32, quest: Option<&str>) -> EncounterRewards {
    EncounterRewards {
        gold,
        experience,
        message: String::new(),
        quest: quest.map(str::to_string),
        granted: false,
    }
}

#[test]
fn test_shared_encounter_reward_pays_once() {
    let goblin = test_monster_def("goblin");
    let mut map = GameMap::new("s2", Grid::filled(20, 20, TileType::Floor), (1, 1));
    let mut state_rewards = crate::systems::encounter::RewardsArena::default();
    let shared = state_rewards.insert(rewards(10, 5, Some("encounter_a")));
    let separate = state_rewards.insert(rewards(7, 3, None));
    let (_, first) = map.spawn_encounter_monster(&goblin, tile_center(12, 12), Some(shared));
    let (_, second) = map.spawn_encounter_monster(&goblin, tile_center(13, 12), Some(shared));
    map.spawn_encounter_monster(&goblin, tile_center(15, 15), Some(separate));

    let mut game = game_on(map, vec![test_character("Ayla")]);
    game.state_mut().rewards = state_rewards;
    let gold = game.state().party.gold;

    game.hit_monster(&first, 1000, false, "Ayla");
    game.hit_monster(&second, 1000, false, "Ayla");
    frame(&mut game, 0, Vec::new());
    frame(&mut game, 1, Vec::new());

    assert_eq!(game.state().party.gold, gold + 10);
    assert!(game.state().rewards.get(RewardsId(0)).unwrap().granted);
    assert!(!game.state().rewards.get(RewardsId(1)).unwrap().granted);
    assert_eq!(game.state().current_map().live_monster_count(), 1);
    let grants = game
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::RewardsGranted { .. }))
        .count();
    assert_eq!(grants, 1);
}

// =============================================================================
// MONSTER PROJECTILES
// =============================================================================

#[test]
fn test_ranged_monster_fires_one_projectile_then_it_lands() {
    let mut caster = test_monster_def("imp");
    caster.projectile_spell = Some("firebolt".to_string());
    caster.attack_radius_tiles = 6.0;
    let mut map = GameMap::new("s3", Grid::filled(12, 12, TileType::Floor), (2, 2));
    let (entity, id) = map.spawn_monster(&caster, tile_center(6, 2));
    {
        let ai = map.world.query_one_mut::<&mut MonsterAI>(entity).unwrap();
        ai.state = MonsterState::Attacking;
        ai.state_timer = 1;
    }
    let mut target = test_character("Ayla");
    // No dodging
    target.stats.luck = 0;
    let mut game = game_on(map, vec![target]);
    let hp = game.state().party.members[0].hit_points;

    frame(&mut game, 0, Vec::new());
    let shots = game.state().projectiles.projectiles();
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].owner, ProjectileOwner::Monster(id.clone()));
    assert_eq!(
        shots[0].kind,
        ProjectileKind::Magic {
            spell: "firebolt".to_string()
        }
    );
    assert_eq!(shots[0].source_name, "imp");
    assert_eq!(game.state().party.members[0].hit_points, hp);

    for n in 1..60 {
        frame(&mut game, n, Vec::new());
        if game.state().projectiles.is_empty() {
            break;
        }
    }
    assert!(game.state().projectiles.is_empty());
    assert!(game.state().party.members[0].hit_points < hp);
}

// =============================================================================
// SAVE AND RESTORE OF BUFFS
// =============================================================================

#[test]
fn test_active_buffs_survive_save_and_restore() {
    let mut game = shipped_game();
    {
        let effects = &mut game.state_mut().party.effects;
        effects.apply(UtilityEffect::TorchLight, 120, 4);
        effects.apply(UtilityEffect::Bless, 60, 2);
        effects.apply(UtilityEffect::WaterBreathing, 25, 0);
        effects.underwater_return = Some(UnderwaterReturn {
            map: "forest".to_string(),
            x: 96.0,
            y: 128.0,
        });
    }
    let walk_on_water = game.state().collision.walk_on_water();
    let json = serde_json::to_string(&game.save_data()).unwrap();

    let mut other = shipped_game();
    other.restore(serde_json::from_str(&json).unwrap()).unwrap();
    let effects = &other.state().party.effects;
    assert_eq!(effects.torch_light.duration, 120);
    assert_eq!(effects.torch_radius, 4.0);
    assert_eq!(effects.bless.duration, 60);
    assert_eq!(effects.bless_bonus, 2);
    assert_eq!(effects.water_breathing.duration, 25);
    assert_eq!(
        effects.underwater_return,
        Some(UnderwaterReturn {
            map: "forest".to_string(),
            x: 96.0,
            y: 128.0,
        })
    );
    let status = effects.status_by_id();
    assert_eq!(status["torch_light"].remaining, 120);
    assert_eq!(status["bless"].remaining, 60);
    assert_eq!(other.state().collision.walk_on_water(), walk_on_water);
}

// =============================================================================
// PROJECTILE COLLISION ORDER
// =============================================================================

fn fast_shot(origin: Vec2) -> Launch {
    Launch {
        kind: ProjectileKind::Arrow {
            weapon: "shortbow".to_string(),
        },
        owner: ProjectileOwner::Party(0),
        source_name: "Tobin".to_string(),
        origin,
        direction: Vec2::X,
        speed_tiles: 200.0,
        damage: 7,
        critical: false,
    }
}

fn s5_game() -> (Game, String) {
    let mut map = GameMap::new("s5", Grid::filled(16, 16, TileType::Floor), (1, 1));
    let (_, id) = map.spawn_monster(&test_monster_def("goblin"), tile_center(6, 5));
    let mut game = game_on(map, vec![test_character("Tobin")]);
    turn_based(&mut game);
    (game, id)
}

#[test]
fn test_projectile_overlapping_monster_hits_before_moving() {
    let (mut game, id) = s5_game();
    let state = game.state_mut();
    state
        .projectiles
        .launch(&mut state.collision, fast_shot(tile_center(6, 5) - Vec2::new(10.0, 0.0)));

    frame(&mut game, 0, Vec::new());
    assert_eq!(monster_hp(&game, &id), 13);
    assert!(game.state().projectiles.is_empty());
    assert!(game
        .pending_events()
        .any(|e| matches!(e, GameEvent::MonsterHit { damage: 7, .. })));
}

#[test]
fn test_fast_projectile_stops_at_monster_instead_of_skipping() {
    let (mut game, id) = s5_game();
    let center = tile_center(6, 5);
    let state = game.state_mut();
    state
        .projectiles
        .launch(&mut state.collision, fast_shot(tile_center(3, 5)));

    frame(&mut game, 0, Vec::new());
    assert_eq!(monster_hp(&game, &id), 20);
    let shot = &game.state().projectiles.projectiles()[0];
    assert!(shot.position.x < center.x);

    frame(&mut game, 1, Vec::new());
    assert_eq!(monster_hp(&game, &id), 13);
    assert!(game.state().projectiles.is_empty());
}

// =============================================================================
// MODE SWAP
// =============================================================================

#[test]
fn test_mode_swap_keeps_cooldown_but_gates_by_turn() {
    let catalogs = catalogs();
    let mut sorcerer =
        Character::from_class("Ilsa", catalogs.classes.get("sorcerer").unwrap(), &catalogs.items).unwrap();
    sorcerer.stats.speed = 50;
    sorcerer.ready_spell = Some("firebolt".to_string());
    let map = GameMap::new("s6", Grid::filled(16, 16, TileType::Floor), (2, 2));
    let state = GameState::with_map(Party::new(vec![sorcerer]), map);
    let mut game = Game::from_state(GameConfig::default(), catalogs, state, 42);

    game.cast_equipped_spell(None).unwrap();
    assert_eq!(game.state().party.members[0].action_cooldown, 30);
    assert_eq!(game.cast_equipped_spell(None), Err(ActionRefusal::OnCooldown));

    frame(&mut game, 0, vec![Intent::ToggleMode]);
    assert_eq!(game.state().scheduler.mode, TurnMode::TurnBased);
    let cooldown = game.state().party.members[0].action_cooldown;
    assert!(cooldown > 0 && cooldown < 30);

    let sp = game.state().party.members[0].spell_points;
    for n in 1..400 {
        frame(&mut game, n, Vec::new());
    }
    assert_eq!(game.state().party.members[0].action_cooldown, 0);
    assert_eq!(game.state().party.members[0].spell_points, sp);

    // Two actions per Party turn, whatever the cooldown says
    game.cast_equipped_spell(None).unwrap();
    assert!(game.state().party.members[0].action_cooldown > 0);
    game.cast_equipped_spell(None).unwrap();
    assert_eq!(game.state().scheduler.turn, Turn::Monster);
    assert_eq!(game.cast_equipped_spell(None), Err(ActionRefusal::NotPartyTurn));
}

// =============================================================================
// TRAVEL
// =============================================================================

#[test]
fn test_stepping_on_teleporter_moves_to_partner() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(7, 3), 0.0);
    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "forest");
    assert_eq!(game.camera().tile(), (21, 13));
}

#[test]
fn test_dive_and_resurface() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(3, 10), 0.0);
    game.state_mut()
        .party
        .effects
        .apply(UtilityEffect::WaterBreathing, 600, 0);

    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "lake_bottom");
    let back = game.state().party.effects.underwater_return.clone().unwrap();
    assert_eq!(back.map, "forest");
    assert!(game
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::MapSwitched { to, .. } if to.as_str() == "lake_bottom")));

    game.dispel(UtilityEffect::WaterBreathing);
    frame(&mut game, 1, Vec::new());
    assert_eq!(game.state().maps.current_key(), "forest");
    assert_eq!(game.camera().tile(), (3, 10));
    assert!(game.state().party.effects.underwater_return.is_none());
}

#[test]
fn test_deep_water_blocks_without_water_breathing() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(3, 10), 0.0);
    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "forest");
    assert_eq!(game.camera().tile(), (3, 10));
}

#[test]
fn test_surfacing_avoids_monster_on_return_tile() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(3, 10), 0.0);
    game.state_mut()
        .party
        .effects
        .apply(UtilityEffect::WaterBreathing, 600, 0);
    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "lake_bottom");

    game.state_mut()
        .maps
        .get_mut("forest")
        .unwrap()
        .spawn_monster(&test_monster_def("goblin"), tile_center(3, 10));
    game.dispel(UtilityEffect::WaterBreathing);
    frame(&mut game, 1, Vec::new());

    assert_eq!(game.state().maps.current_key(), "forest");
    let (x, y) = game.camera().tile();
    assert_ne!((x, y), (3, 10));
    assert!(game.state().current_map().grid.is_walkable(x, y));
    assert!(game
        .state()
        .collision
        .can_move_to(PLAYER_ID, game.camera().position));
}

#[test]
fn test_surfacing_without_return_point_lands_on_starting_map() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(3, 10), 0.0);
    game.state_mut()
        .party
        .effects
        .apply(UtilityEffect::WaterBreathing, 600, 0);
    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "lake_bottom");

    game.state_mut().party.effects.underwater_return = None;
    game.dispel(UtilityEffect::WaterBreathing);
    frame(&mut game, 1, Vec::new());
    assert_eq!(game.state().maps.current_key(), "forest");
    assert_eq!(game.camera().tile(), (2, 2));
}

// =============================================================================
// TURN-END SPELL POINTS
// =============================================================================

/// Three members with 10 max SP: one low, one full, one unconscious
fn spell_point_game() -> Game {
    let mut members = vec![
        test_character("Ilsa"),
        test_character("Maren"),
        test_character("Roderick"),
    ];
    for member in &mut members {
        member.max_spell_points = 10;
    }
    members[0].spell_points = 3;
    members[1].spell_points = 10;
    members[2].spell_points = 2;
    members[2].hit_points = 0;
    members[2].add_condition(Condition::Unconscious);
    let map = GameMap::new("sp", Grid::filled(12, 12, TileType::Floor), (2, 2));
    let mut game = game_on(map, members);
    turn_based(&mut game);
    game
}

fn spell_points(game: &Game) -> Vec<i32> {
    game.state().party.members.iter().map(|c| c.spell_points).collect()
}

#[test]
fn test_second_action_ends_turn_and_restores_a_spell_point() {
    let mut game = spell_point_game();
    game.attack().unwrap();
    assert_eq!(spell_points(&game), vec![3, 10, 2]);
    assert_eq!(game.state().scheduler.turn, Turn::Party);

    game.attack().unwrap();
    assert_eq!(game.state().scheduler.turn, Turn::Monster);
    assert_eq!(spell_points(&game), vec![4, 10, 2]);
}

#[test]
fn test_grid_step_ends_turn_and_restores_a_spell_point() {
    let mut game = spell_point_game();
    game.set_camera(tile_center(2, 2), 0.0);
    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.camera().tile(), (3, 2));
    assert_eq!(spell_points(&game), vec![4, 10, 2]);
}

#[test]
fn test_dive_ends_turn_and_restores_a_spell_point() {
    let mut game = shipped_game();
    turn_based(&mut game);
    game.set_camera(tile_center(3, 10), 0.0);
    game.state_mut()
        .party
        .effects
        .apply(UtilityEffect::WaterBreathing, 600, 0);
    for member in &mut game.state_mut().party.members {
        member.spell_points = 0;
    }

    frame(&mut game, 0, vec![Intent::Move(MoveDir::Forward)]);
    assert_eq!(game.state().maps.current_key(), "lake_bottom");
    let expected: Vec<i32> = game
        .state()
        .party
        .members
        .iter()
        .map(|c| c.max_spell_points.min(1))
        .collect();
    assert_eq!(spell_points(&game), expected);
    assert!(expected.iter().sum::<i32>() > 0);
}

// =============================================================================
// LEVEL-UP PROMPTS
// =============================================================================

#[test]
fn test_level_up_choice_needs_open_prompt() {
    let map = GameMap::new("lvl", Grid::filled(8, 8, TileType::Floor), (2, 2));
    let mut game = game_on(map, vec![test_character("Roderick")]);
    game.state_mut().level_ups.push(LevelUpRequest {
        member: 0,
        level: 2,
        options: vec![LevelChoiceOption::SkillMastery {
            skill: SkillType::Sword,
        }],
        selection: 0,
    });

    assert_eq!(game.choose_level_up(0), Err(ActionRefusal::NoLevelUpOpen));
    assert_eq!(game.confirm_level_up(), Err(ActionRefusal::NoLevelUpOpen));
    assert_eq!(game.state().level_ups.len(), 1);

    frame(&mut game, 0, Vec::new());
    assert!(game.state().level_ups.is_open());
    game.choose_level_up(0).unwrap();
    assert!(game.state().level_ups.is_empty());
}
