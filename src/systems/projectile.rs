//! Arrows, magic projectiles and melee slash visuals.
//!
//! Projectile lifecycle, once per frame:
//! 1. Collide at current positions: the monster pass (party-owned shots),
//!    then the player pass (monster-owned shots), each in creation order
//! 2. Advance by velocity, swept in short samples against blocking tiles;
//!    a shot that touches a valid target stops there and hits next frame
//! 3. Reap inactive projectiles and unregister them from collision
//!
//! Damage is rolled at launch; impacts are returned to the caller, which
//! applies them to monsters or the party.

use glam::Vec2;

use crate::collision::{CollisionEntity, CollisionSystem, EntityKind, PLAYER_ID};
use crate::constants::*;
use crate::tile::Habitat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectileOwner {
    /// Index of the party member who fired
    Party(usize),
    /// Monster id
    Monster(String),
}

impl ProjectileOwner {
    fn collision_id(&self) -> String {
        match self {
            ProjectileOwner::Party(_) => PLAYER_ID.to_string(),
            ProjectileOwner::Monster(id) => id.clone(),
        }
    }

    pub fn is_party(&self) -> bool {
        matches!(self, ProjectileOwner::Party(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Weapon key, for damage lookup and sprite selection
    Arrow { weapon: String },
    /// Spell id
    Magic { spell: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Collision id
    pub id: String,
    pub kind: ProjectileKind,
    pub owner: ProjectileOwner,
    /// Shooter's name for combat messages
    pub source_name: String,
    pub position: Vec2,
    /// World units per frame
    pub velocity: Vec2,
    pub damage: i32,
    pub critical: bool,
    /// Frames left before the shot fizzles
    pub life: u32,
    pub active: bool,
}

/// Pure visual for a melee swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashEffect {
    pub position: Vec2,
    pub frame: u32,
    pub max_frames: u32,
    pub active: bool,
}

/// Box a party-owned projectile can hit
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBox {
    pub id: String,
    pub center: Vec2,
    pub half_size: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactTarget {
    Monster(String),
    Party,
}

/// A projectile that struck something this frame
#[derive(Debug, Clone, PartialEq)]
pub struct Impact {
    pub projectile: String,
    pub target: ImpactTarget,
    pub owner: ProjectileOwner,
    pub kind: ProjectileKind,
    pub source_name: String,
    pub position: Vec2,
    pub damage: i32,
    pub critical: bool,
}

impl Impact {
    fn new(projectile: &Projectile, target: ImpactTarget) -> Self {
        Self {
            projectile: projectile.id.clone(),
            target,
            owner: projectile.owner.clone(),
            kind: projectile.kind.clone(),
            source_name: projectile.source_name.clone(),
            position: projectile.position,
            damage: projectile.damage,
            critical: projectile.critical,
        }
    }
}

/// What to fire
#[derive(Debug, Clone)]
pub struct Launch {
    pub kind: ProjectileKind,
    pub owner: ProjectileOwner,
    pub source_name: String,
    pub origin: Vec2,
    pub direction: Vec2,
    pub speed_tiles: f32,
    pub damage: i32,
    pub critical: bool,
}

fn overlaps(point: Vec2, center: Vec2, half_size: f32) -> bool {
    let delta = (point - center).abs();
    let reach = half_size + PROJECTILE_HALF_SIZE;
    delta.x < reach && delta.y < reach
}

/// Nearest monster box overlapping a point
fn monster_at<'a>(point: Vec2, monsters: &'a [TargetBox]) -> Option<&'a TargetBox> {
    monsters
        .iter()
        .filter(|m| overlaps(point, m.center, m.half_size))
        .min_by(|a, b| {
            a.center
                .distance_squared(point)
                .total_cmp(&b.center.distance_squared(point))
        })
}

/// All live projectiles and slash visuals of the current map
#[derive(Debug, Clone, Default)]
pub struct ProjectileSet {
    projectiles: Vec<Projectile>,
    slashes: Vec<SlashEffect>,
    next_serial: u64,
}

impl ProjectileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projectiles in creation order
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn slashes(&self) -> &[SlashEffect] {
        &self.slashes
    }

    pub fn get(&self, id: &str) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.projectiles.iter().filter(|p| p.active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Fire a projectile and register its collision box. Returns its id.
    pub fn launch(&mut self, collision: &mut CollisionSystem, launch: Launch) -> String {
        self.next_serial += 1;
        let id = format!("projectile:{}", self.next_serial);
        let velocity = launch.direction.normalize_or_zero() * launch.speed_tiles * TILE_SIZE
            / TICKS_PER_SECOND as f32;
        collision.register_entity(
            &id,
            CollisionEntity {
                kind: EntityKind::Projectile,
                center: launch.origin,
                half_size: Vec2::splat(PROJECTILE_HALF_SIZE),
                habitat: Habitat::Flying,
                owner: Some(launch.owner.collision_id()),
            },
        );
        log::debug!("{} launches {}", launch.source_name, id);
        self.projectiles.push(Projectile {
            id: id.clone(),
            kind: launch.kind,
            owner: launch.owner,
            source_name: launch.source_name,
            position: launch.origin,
            velocity,
            damage: launch.damage,
            critical: launch.critical,
            life: PROJECTILE_LIFETIME_FRAMES,
            active: true,
        });
        id
    }

    /// Run one projectile frame. `monsters` are the live monster boxes of
    /// the current map; `player` is the party position.
    pub fn step(
        &mut self,
        collision: &mut CollisionSystem,
        monsters: &[TargetBox],
        player: Vec2,
    ) -> Vec<Impact> {
        puffin::profile_function!();
        let mut impacts = Vec::new();

        // Monster pass
        for projectile in self.projectiles.iter_mut().filter(|p| p.active && p.owner.is_party()) {
            if let Some(target) = monster_at(projectile.position, monsters) {
                projectile.active = false;
                impacts.push(Impact::new(projectile, ImpactTarget::Monster(target.id.clone())));
            }
        }

        // Player pass
        for projectile in self.projectiles.iter_mut().filter(|p| p.active && !p.owner.is_party()) {
            if overlaps(projectile.position, player, PLAYER_HALF_SIZE) {
                projectile.active = false;
                impacts.push(Impact::new(projectile, ImpactTarget::Party));
            }
        }

        for projectile in self.projectiles.iter_mut().filter(|p| p.active) {
            advance(projectile, collision, monsters, player);
        }

        self.reap(collision);
        impacts
    }

    fn reap(&mut self, collision: &mut CollisionSystem) {
        self.projectiles.retain(|p| {
            if !p.active {
                collision.unregister_entity(&p.id);
            }
            p.active
        });
    }

    /// Drop every projectile (map switch)
    pub fn clear(&mut self, collision: &mut CollisionSystem) {
        for projectile in &self.projectiles {
            collision.unregister_entity(&projectile.id);
        }
        self.projectiles.clear();
        self.slashes.clear();
    }

    pub fn spawn_slash(&mut self, position: Vec2) {
        self.slashes.push(SlashEffect {
            position,
            frame: 0,
            max_frames: SLASH_EFFECT_FRAMES,
            active: true,
        });
    }

    /// Advance slash animations and drop exhausted ones
    pub fn tick_slashes(&mut self) {
        for slash in self.slashes.iter_mut() {
            slash.frame += 1;
            if slash.frame >= slash.max_frames {
                slash.active = false;
            }
        }
        self.slashes.retain(|s| s.active);
    }
}

/// Move one projectile by its velocity in samples no longer than
/// `PROJECTILE_SWEEP_STEP`. Stops short of blocking tiles (and fizzles),
/// or at the first sample touching a target it may hit.
fn advance(projectile: &mut Projectile, collision: &mut CollisionSystem, monsters: &[TargetBox], player: Vec2) {
    projectile.life = projectile.life.saturating_sub(1);
    if projectile.life == 0 {
        projectile.active = false;
        return;
    }
    let distance = projectile.velocity.length();
    let samples = (distance / PROJECTILE_SWEEP_STEP).ceil().max(1.0) as u32;
    let delta = projectile.velocity / samples as f32;
    for _ in 0..samples {
        let next = projectile.position + delta;
        if collision.is_tile_blocked(next, Habitat::Flying) {
            projectile.active = false;
            break;
        }
        projectile.position = next;
        let touching = if projectile.owner.is_party() {
            monster_at(next, monsters).is_some()
        } else {
            overlaps(next, player, PLAYER_HALF_SIZE)
        };
        if touching {
            break;
        }
    }
    collision.update_entity(&projectile.id, projectile.position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{tile_center, Grid};
    use crate::tile::TileType;

    fn collision() -> CollisionSystem {
        let mut grid = Grid::filled(20, 20, TileType::Floor);
        grid.set(10, 5, TileType::Wall);
        let mut system = CollisionSystem::new();
        system.update_tile_checker(&grid, false);
        system
    }

    fn arrow(owner: ProjectileOwner, origin: Vec2, direction: Vec2, speed_tiles: f32) -> Launch {
        Launch {
            kind: ProjectileKind::Arrow {
                weapon: "shortbow".to_string(),
            },
            owner,
            source_name: "Tobin".to_string(),
            origin,
            direction,
            speed_tiles,
            damage: 5,
            critical: false,
        }
    }

    fn goblin_at(x: i32, y: i32) -> TargetBox {
        TargetBox {
            id: "goblin".to_string(),
            center: tile_center(x, y),
            half_size: 20.0,
        }
    }

    #[test]
    fn test_hit_at_current_position_before_moving() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        let monster = goblin_at(5, 5);
        // Fast enough to jump several tiles past the goblin in one frame
        let id = set.launch(
            &mut system,
            arrow(ProjectileOwner::Party(0), monster.center, Vec2::X, 600.0),
        );
        let impacts = set.step(&mut system, &[monster], tile_center(1, 1));
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].target, ImpactTarget::Monster("goblin".to_string()));
        assert_eq!(impacts[0].position, tile_center(5, 5));
        assert!(set.is_empty());
        assert!(!system.contains(&id));
    }

    #[test]
    fn test_sweep_stops_at_target_instead_of_tunneling() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        let monster = goblin_at(6, 2);
        set.launch(
            &mut system,
            arrow(ProjectileOwner::Party(0), tile_center(2, 2), Vec2::X, 600.0),
        );
        assert!(set.step(&mut system, &[monster.clone()], tile_center(0, 0)).is_empty());
        let position = set.projectiles()[0].position;
        assert!(position.x < monster.center.x);
        assert_eq!(system.position(&set.projectiles()[0].id), Some(position));

        let impacts = set.step(&mut system, &[monster], tile_center(0, 0));
        assert_eq!(impacts.len(), 1);
    }

    #[test]
    fn test_owner_cannot_hit_itself() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        let player = tile_center(3, 3);
        set.launch(&mut system, arrow(ProjectileOwner::Party(1), player, Vec2::Y, 12.0));
        assert!(set.step(&mut system, &[], player).is_empty());
        assert_eq!(set.active_count(), 1);

        let monster = goblin_at(3, 8);
        set.launch(
            &mut system,
            arrow(ProjectileOwner::Monster("goblin".to_string()), monster.center, -Vec2::Y, 12.0),
        );
        let impacts = set.step(&mut system, &[monster], tile_center(15, 15));
        assert!(impacts.is_empty());
    }

    #[test]
    fn test_monster_shot_hits_party() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        let player = tile_center(3, 3);
        set.launch(
            &mut system,
            arrow(ProjectileOwner::Monster("m1".to_string()), tile_center(3, 5), -Vec2::Y, 8.0),
        );
        let mut impacts = Vec::new();
        for _ in 0..60 {
            impacts.extend(set.step(&mut system, &[], player));
            if !impacts.is_empty() {
                break;
            }
        }
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].target, ImpactTarget::Party);
        assert!(set.is_empty());
    }

    #[test]
    fn test_walls_stop_projectiles() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        set.launch(
            &mut system,
            arrow(ProjectileOwner::Party(0), tile_center(8, 5), Vec2::X, 600.0),
        );
        let impacts = set.step(&mut system, &[goblin_at(12, 5)], tile_center(0, 0));
        assert!(impacts.is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_creation_order_is_hit_order() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        let monster = goblin_at(5, 5);
        let first = set.launch(&mut system, arrow(ProjectileOwner::Party(0), monster.center, Vec2::X, 1.0));
        let second = set.launch(&mut system, arrow(ProjectileOwner::Party(2), monster.center, Vec2::X, 1.0));
        let impacts = set.step(&mut system, &[monster], tile_center(0, 0));
        let order: Vec<&str> = impacts.iter().map(|i| i.projectile.as_str()).collect();
        assert_eq!(order, vec![first.as_str(), second.as_str()]);
    }

    #[test]
    fn test_projectiles_expire() {
        let mut system = collision();
        let mut set = ProjectileSet::new();
        set.launch(&mut system, arrow(ProjectileOwner::Party(0), tile_center(1, 1), Vec2::ZERO, 0.0));
        for _ in 0..PROJECTILE_LIFETIME_FRAMES {
            set.step(&mut system, &[], tile_center(15, 15));
        }
        assert!(set.is_empty());
        assert!(system.is_empty());
    }

    #[test]
    fn test_slashes_reaped_when_exhausted() {
        let mut set = ProjectileSet::new();
        set.spawn_slash(Vec2::ZERO);
        for _ in 0..SLASH_EFFECT_FRAMES - 1 {
            set.tick_slashes();
        }
        assert_eq!(set.slashes().len(), 1);
        set.tick_slashes();
        assert!(set.slashes().is_empty());
    }
}
