//! Monster AI decision-making and behavior.
//!
//! Planning is a pure function over a snapshot of one monster plus the
//! player position; it returns the monster's next AI state and an action.
//! Plans are applied serially afterwards, so every monster decides against
//! the same frame state.

use glam::Vec2;
use hecs::Entity;

use crate::collision::CollisionSystem;
use crate::components::{Health, MonsterAI, MonsterAttack, MonsterId, MonsterState, Position, Species};
use crate::constants::*;
use crate::grid::{tile_center, tile_distance, world_to_tile, Grid};
use crate::map::GameMap;

/// Read-only view of one live monster
#[derive(Debug, Clone)]
pub struct MonsterView {
    pub entity: Entity,
    pub id: String,
    pub name: String,
    pub species: String,
    pub position: Vec2,
    pub health: Health,
    pub ai: MonsterAI,
    pub attack: MonsterAttack,
}

/// Random draws for one monster's plan, taken from the shared generator
/// before planning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiRolls {
    /// 0..100
    pub wander: u32,
    /// Radians
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiAction {
    Idle,
    /// Real-time movement delta for this frame
    Move(Vec2),
    /// One grid step, with a fallback step if the first is blocked
    Step { primary: Vec2, fallback: Vec2 },
    Melee,
    Ranged,
}

#[derive(Debug, Clone)]
pub struct AiPlan {
    pub entity: Entity,
    pub id: String,
    pub ai: MonsterAI,
    pub action: AiAction,
}

/// Snapshot every live monster of a map, sorted by id
pub fn snapshot_monsters(map: &GameMap) -> Vec<MonsterView> {
    let mut views: Vec<MonsterView> = map
        .world
        .query::<(&MonsterId, &Species, &Position, &Health, &MonsterAI, &MonsterAttack)>()
        .iter()
        .filter(|(_, (_, _, _, health, _, _))| !health.is_dead())
        .map(|(entity, (id, species, pos, health, ai, attack))| MonsterView {
            entity,
            id: id.0.clone(),
            name: species.name.clone(),
            species: species.key.clone(),
            position: pos.0,
            health: *health,
            ai: ai.clone(),
            attack: attack.clone(),
        })
        .collect();
    views.sort_by(|a, b| a.id.cmp(&b.id));
    views
}

/// Check if there's a clear line of sight between two points.
/// Uses Bresenham's line algorithm over tiles; the end tiles never block.
pub fn has_line_of_sight(grid: &Grid, from: Vec2, to: Vec2) -> bool {
    let (x0, y0) = world_to_tile(from);
    let (x1, y1) = world_to_tile(to);
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);

    while x != x1 || y != y1 {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
        if x == x1 && y == y1 {
            break;
        }
        if grid.get(x, y).map_or(true, |t| t.blocks_vision()) {
            return false;
        }
    }
    true
}

fn can_see(view: &MonsterView, grid: &Grid, player: Vec2) -> bool {
    tile_distance(view.position, player) <= view.ai.vision && has_line_of_sight(grid, view.position, player)
}

fn in_attack_range(view: &MonsterView, distance: f32, sees: bool) -> bool {
    // Ranged attackers need a clear shot
    distance <= view.ai.attack_radius && (sees || !view.attack.is_ranged())
}

fn attack_action(view: &MonsterView) -> AiAction {
    if view.attack.is_ranged() {
        AiAction::Ranged
    } else {
        AiAction::Melee
    }
}

/// Real-time state machine, run once per frame per monster
pub fn plan_realtime(view: &MonsterView, grid: &Grid, player: Vec2, rolls: AiRolls) -> AiPlan {
    let mut ai = view.ai.clone();
    let distance = tile_distance(view.position, player);
    let sees = can_see(view, grid, player);
    let per_frame = ai.speed * TILE_SIZE / TICKS_PER_SECOND as f32;
    let toward = (player - view.position).normalize_or_zero();
    if sees {
        ai.lost_sight_timer = 0;
    }
    if ai.flee_threshold > 0.0
        && view.health.percentage() < ai.flee_threshold
        && !matches!(ai.state, MonsterState::Fleeing | MonsterState::Dead)
    {
        log::debug!("{} flees", view.id);
        ai.state = MonsterState::Fleeing;
    }

    let action = match ai.state {
        MonsterState::Dead => AiAction::Idle,
        MonsterState::Idle => {
            if sees {
                ai.state = MonsterState::Pursuing;
            } else if rolls.wander < IDLE_WANDER_CHANCE {
                ai.state = MonsterState::Wandering;
                ai.state_timer = WANDER_DURATION_FRAMES;
                ai.wander_dir = Vec2::from_angle(rolls.angle);
            }
            AiAction::Idle
        }
        MonsterState::Wandering => {
            if sees {
                ai.state = MonsterState::Pursuing;
                AiAction::Idle
            } else {
                ai.state_timer = ai.state_timer.saturating_sub(1);
                if ai.state_timer == 0 {
                    ai.state = MonsterState::Idle;
                }
                AiAction::Move(ai.wander_dir * per_frame * WANDER_SPEED_FACTOR)
            }
        }
        MonsterState::Pursuing => {
            if in_attack_range(view, distance, sees) {
                ai.state = MonsterState::Attacking;
                // Strike on the next frame
                ai.state_timer = 1;
                AiAction::Idle
            } else if sees {
                AiAction::Move(toward * per_frame)
            } else {
                ai.lost_sight_timer += 1;
                if ai.lost_sight_timer >= LOST_SIGHT_TIMEOUT_FRAMES {
                    ai.state = MonsterState::Wandering;
                    ai.state_timer = WANDER_DURATION_FRAMES;
                    ai.wander_dir = Vec2::from_angle(rolls.angle);
                    ai.lost_sight_timer = 0;
                    AiAction::Idle
                } else {
                    AiAction::Move(toward * per_frame)
                }
            }
        }
        MonsterState::Attacking => {
            if !in_attack_range(view, distance, sees) {
                ai.state = MonsterState::Pursuing;
                AiAction::Idle
            } else {
                ai.state_timer = ai.state_timer.saturating_sub(1);
                if ai.state_timer == 0 {
                    ai.state_timer = ai.attack_cooldown.max(1);
                    attack_action(view)
                } else {
                    AiAction::Idle
                }
            }
        }
        MonsterState::Fleeing => {
            if distance > ai.vision {
                ai.state = MonsterState::Idle;
                AiAction::Idle
            } else {
                AiAction::Move(-toward * per_frame)
            }
        }
    };

    AiPlan {
        entity: view.entity,
        id: view.id.clone(),
        ai,
        action,
    }
}

/// Turn-based Monster turn: engaged monsters (in vision, or flagged by a
/// hit or pack engagement) attack if in range, otherwise take one grid
/// step toward the party. Everyone else holds still.
pub fn plan_turn(view: &MonsterView, grid: &Grid, player: Vec2) -> AiPlan {
    let mut ai = view.ai.clone();
    let distance = tile_distance(view.position, player);
    let sees = can_see(view, grid, player);

    let action = if !(sees || ai.engaged) {
        AiAction::Idle
    } else if in_attack_range(view, distance, sees) {
        ai.state = MonsterState::Attacking;
        attack_action(view)
    } else {
        ai.state = MonsterState::Pursuing;
        let offset = player - view.position;
        let x_step = Vec2::new(offset.x.signum() * TILE_SIZE, 0.0);
        let y_step = Vec2::new(0.0, offset.y.signum() * TILE_SIZE);
        let (primary, fallback) = if offset.x.abs() >= offset.y.abs() {
            (x_step, y_step)
        } else {
            (y_step, x_step)
        };
        AiAction::Step { primary, fallback }
    };

    AiPlan {
        entity: view.entity,
        id: view.id.clone(),
        ai,
        action,
    }
}

/// Write a plan back: AI state, then any movement through the collision
/// system. Attacks are left to the caller.
pub fn apply_plan(map: &mut GameMap, collision: &mut CollisionSystem, plan: &AiPlan) {
    if let Ok(ai) = map.world.query_one_mut::<&mut MonsterAI>(plan.entity) {
        if ai.state != plan.ai.state {
            log::debug!("{}: {:?} -> {:?}", plan.id, ai.state, plan.ai.state);
        }
        let stuck = ai.stuck;
        *ai = plan.ai.clone();
        ai.stuck = stuck;
    }
    match plan.action {
        AiAction::Move(delta) => {
            move_monster(
                map,
                collision,
                plan.entity,
                &plan.id,
                &[delta, Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)],
            );
        }
        AiAction::Step { primary, fallback } => {
            move_monster(map, collision, plan.entity, &plan.id, &[primary, fallback]);
        }
        AiAction::Idle | AiAction::Melee | AiAction::Ranged => {}
    }
}

/// Try each movement delta in order; the first one the collision system
/// allows is taken. Returns whether the monster moved.
fn move_monster(
    map: &mut GameMap,
    collision: &mut CollisionSystem,
    entity: Entity,
    id: &str,
    candidates: &[Vec2],
) -> bool {
    let Ok(pos) = map.world.query_one_mut::<&mut Position>(entity) else {
        return false;
    };
    for delta in candidates.iter().filter(|d| **d != Vec2::ZERO) {
        let target = pos.0 + *delta;
        if collision.can_move_to(id, target) {
            pos.0 = target;
            collision.update_entity(id, target);
            return true;
        }
    }
    false
}

const NEIGHBORS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Move a monster whose tile has become impassable to an adjacent free
/// tile. With none free it stays put and warns once until it gets loose.
pub fn unstick(map: &mut GameMap, collision: &mut CollisionSystem, entity: Entity, id: &str) {
    if !collision.is_stranded(id) {
        if let Ok(ai) = map.world.query_one_mut::<&mut MonsterAI>(entity) {
            ai.stuck = false;
        }
        return;
    }
    let Some(center) = collision.position(id) else {
        return;
    };
    let (tx, ty) = world_to_tile(center);
    let free = NEIGHBORS
        .iter()
        .map(|(dx, dy)| tile_center(tx + dx, ty + dy))
        .find(|c| collision.can_move_to(id, *c));
    match free {
        Some(target) => {
            if let Ok((pos, ai)) = map.world.query_one_mut::<(&mut Position, &mut MonsterAI)>(entity) {
                pos.0 = target;
                ai.stuck = false;
            }
            collision.update_entity(id, target);
            log::debug!("{} moved off an impassable tile", id);
        }
        None => {
            if let Ok(ai) = map.world.query_one_mut::<&mut MonsterAI>(entity) {
                if !ai.stuck {
                    ai.stuck = true;
                    log::warn!("{} is stuck at {:?}", id, (tx, ty));
                }
            }
        }
    }
}

/// Turn-based pack engagement: a hit wakes every live monster of the same
/// species within `PACK_ENGAGE_RADIUS_TILES` of the victim. Returns the ids
/// newly engaged.
pub fn pack_engage(map: &mut GameMap, hit_id: &str) -> Vec<String> {
    let Some(entity) = map.monster_entity(hit_id) else {
        return Vec::new();
    };
    let Ok((species, origin)) = map
        .world
        .query_one_mut::<(&Species, &Position)>(entity)
        .map(|(s, p)| (s.key.clone(), p.0))
    else {
        return Vec::new();
    };

    let mut woken = Vec::new();
    for (_, (id, other, pos, health, ai)) in map
        .world
        .query_mut::<(&MonsterId, &Species, &Position, &Health, &mut MonsterAI)>()
    {
        if id.0 == hit_id || other.key != species || health.is_dead() || ai.engaged {
            continue;
        }
        if tile_distance(origin, pos.0) <= PACK_ENGAGE_RADIUS_TILES + 1e-3 {
            ai.engaged = true;
            woken.push(id.0.clone());
        }
    }
    woken.sort();
    if !woken.is_empty() {
        log::debug!("{} wakes {:?}", hit_id, woken);
    }
    woken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{EntityKind, PLAYER_ID};
    use crate::components::BodySize;
    use crate::spawning::test_monster_def;
    use crate::tile::{Habitat, TileType};

    fn open_map() -> GameMap {
        GameMap::new("t", Grid::filled(40, 40, TileType::Floor), (1, 1))
    }

    fn register_all(map: &GameMap, player: Vec2) -> CollisionSystem {
        let mut collision = CollisionSystem::new();
        collision.update_tile_checker(&map.grid, false);
        collision.register_box(PLAYER_ID, EntityKind::Player, player, PLAYER_HALF_SIZE, Habitat::Ground);
        for (_, (id, pos, size)) in map.world.query::<(&MonsterId, &Position, &BodySize)>().iter() {
            collision.register_box(&id.0, EntityKind::Monster, pos.0, size.0, Habitat::Ground);
        }
        collision
    }

    fn view(map: &GameMap, id: &str) -> MonsterView {
        snapshot_monsters(map).into_iter().find(|v| v.id == id).unwrap()
    }

    const NO_WANDER: AiRolls = AiRolls {
        wander: 99,
        angle: 0.0,
    };

    #[test]
    fn test_line_of_sight_blocked_by_walls() {
        let mut grid = Grid::filled(10, 10, TileType::Floor);
        assert!(has_line_of_sight(&grid, tile_center(1, 1), tile_center(8, 1)));
        grid.set(4, 1, TileType::Wall);
        assert!(!has_line_of_sight(&grid, tile_center(1, 1), tile_center(8, 1)));
        assert!(has_line_of_sight(&grid, tile_center(1, 1), tile_center(4, 1)));
    }

    #[test]
    fn test_sees_player_then_pursues_then_attacks() {
        let mut map = open_map();
        let (_, id) = map.spawn_monster(&test_monster_def("goblin"), tile_center(5, 1));
        let player = tile_center(1, 1);

        let plan = plan_realtime(&view(&map, &id), &map.grid, player, NO_WANDER);
        assert_eq!(plan.ai.state, MonsterState::Pursuing);

        let mut collision = register_all(&map, player);
        apply_plan(&mut map, &mut collision, &plan);
        let plan = plan_realtime(&view(&map, &id), &map.grid, player, NO_WANDER);
        assert!(matches!(plan.action, AiAction::Move(d) if d.x < 0.0));
        apply_plan(&mut map, &mut collision, &plan);
        let moved = view(&map, &id).position;
        assert!(moved.x < tile_center(5, 1).x);
        assert_eq!(collision.position(&id), Some(moved));

        // Within reach: switch to attacking, strike on the following frame
        let entity = map.monster_entity(&id).unwrap();
        map.world.get::<&mut Position>(entity).unwrap().0 = tile_center(2, 1);
        let plan = plan_realtime(&view(&map, &id), &map.grid, player, NO_WANDER);
        assert_eq!(plan.ai.state, MonsterState::Attacking);
        apply_plan(&mut map, &mut collision, &plan);
        let plan = plan_realtime(&view(&map, &id), &map.grid, player, NO_WANDER);
        assert_eq!(plan.action, AiAction::Melee);
        assert_eq!(plan.ai.state_timer, 90);
    }

    #[test]
    fn test_idle_monster_may_wander() {
        let mut map = open_map();
        let (_, id) = map.spawn_monster(&test_monster_def("goblin"), tile_center(30, 30));
        let plan = plan_realtime(
            &view(&map, &id),
            &map.grid,
            tile_center(1, 1),
            AiRolls {
                wander: 0,
                angle: 0.0,
            },
        );
        assert_eq!(plan.ai.state, MonsterState::Wandering);
        assert_eq!(plan.ai.wander_dir, Vec2::X);
    }

    #[test]
    fn test_turn_plan_only_moves_engaged_monsters() {
        let mut map = open_map();
        let def = test_monster_def("goblin");
        let (near, near_id) = map.spawn_monster(&def, tile_center(12, 13));
        let (_, far_id) = map.spawn_monster(&def, tile_center(22, 13));
        let player = tile_center(1, 1);
        map.world.get::<&mut MonsterAI>(near).unwrap().engaged = true;

        let plan = plan_turn(&view(&map, &far_id), &map.grid, player);
        assert_eq!(plan.action, AiAction::Idle);

        let plan = plan_turn(&view(&map, &near_id), &map.grid, player);
        let mut collision = register_all(&map, player);
        apply_plan(&mut map, &mut collision, &plan);
        assert_eq!(view(&map, &near_id).position, tile_center(12, 12));
    }

    #[test]
    fn test_pack_engage_same_species_within_radius() {
        let mut map = open_map();
        let goblin = test_monster_def("goblin");
        let orc = test_monster_def("orc");
        let (_, hit) = map.spawn_monster(&goblin, tile_center(12, 13));
        let (_, pack) = map.spawn_monster(&goblin, tile_center(18, 13));
        let (_, far) = map.spawn_monster(&goblin, tile_center(22, 13));
        let (_, other) = map.spawn_monster(&orc, tile_center(12, 19));

        assert_eq!(pack_engage(&mut map, &hit), vec![pack.clone()]);
        assert!(view(&map, &pack).ai.engaged);
        assert!(!view(&map, &far).ai.engaged);
        assert!(!view(&map, &other).ai.engaged);
    }

    #[test]
    fn test_stranded_monster_steps_off_or_stays_quietly() {
        let mut map = open_map();
        let (entity, id) = map.spawn_monster(&test_monster_def("goblin"), tile_center(5, 5));
        let mut collision = register_all(&map, tile_center(1, 1));

        map.grid.set(5, 5, TileType::DeepWater);
        collision.update_tile_checker(&map.grid, false);
        unstick(&mut map, &mut collision, entity, &id);
        let moved = view(&map, &id).position;
        assert_ne!(moved, tile_center(5, 5));
        assert!(!collision.is_stranded(&id));

        let (entity, id) = map.spawn_monster(&test_monster_def("goblin"), tile_center(20, 20));
        collision.register_box(&id, EntityKind::Monster, tile_center(20, 20), 20.0, Habitat::Ground);
        for y in 19..=21 {
            for x in 19..=21 {
                map.grid.set(x, y, TileType::DeepWater);
            }
        }
        collision.update_tile_checker(&map.grid, false);
        unstick(&mut map, &mut collision, entity, &id);
        unstick(&mut map, &mut collision, entity, &id);
        assert_eq!(view(&map, &id).position, tile_center(20, 20));
        assert!(view(&map, &id).ai.stuck);
    }
}
