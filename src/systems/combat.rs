//! Combat system functions: damage formulas, hit application and dead-monster reaping.

use glam::Vec2;
use hecs::Entity;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{SpellDef, SpellEffect, WeaponDef};
use crate::collision::CollisionSystem;
use crate::components::{
    Bounty, EncounterMember, Health, MonsterAI, MonsterAttack, MonsterId, MonsterState, Position,
    Species,
};
use crate::constants::*;
use crate::events::{CombatLog, EventQueue, GameEvent};
use crate::map::GameMap;
use crate::party::{Mastery, Party, Stat, Stats};

// =============================================================================
// FORMULAS
// =============================================================================

/// Base, stat bonus and total of a spell roll. Tooltips and combat share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpellRoll {
    pub base: i32,
    pub stat_bonus: i32,
    pub total: i32,
}

fn mastery_rank(mastery: Option<Mastery>) -> i32 {
    mastery.map_or(0, |m| m.rank())
}

/// Percent chance to hit, clamped to [MIN_HIT_CHANCE, MAX_HIT_CHANCE]
pub fn hit_chance(weapon: Option<&WeaponDef>, accuracy: i32) -> i32 {
    let bonus = weapon.map_or(0, |w| w.hit_bonus);
    (BASE_HIT_CHANCE + bonus + accuracy / HIT_ACCURACY_DIVISOR).clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
}

/// Percent chance of a critical hit
pub fn crit_chance(weapon: Option<&WeaponDef>, luck: i32) -> i32 {
    weapon.map_or(0, |w| w.crit_chance) + luck / CRIT_LUCK_DIVISOR
}

/// Weapon damage before armor: base plus mastery plus stat scaling
pub fn weapon_damage(weapon: &WeaponDef, stats: &Stats, mastery: Option<Mastery>) -> i32 {
    let base = weapon.base_damage + mastery_rank(mastery) * WEAPON_MASTERY_DAMAGE_PER_RANK;
    let primary = stats.get(weapon.primary_stat) / PRIMARY_STAT_DIVISOR;
    let secondary = weapon
        .secondary_stat
        .map_or(0, |s| stats.get(s) / SECONDARY_STAT_DIVISOR);
    base + primary + secondary
}

pub fn unarmed_damage(stats: &Stats) -> i32 {
    UNARMED_DAMAGE + stats.might / PRIMARY_STAT_DIVISOR
}

/// Projectile spell damage, scaling with Intellect
pub fn spell_damage(spell: &SpellDef, intellect: i32, mastery: Option<Mastery>) -> SpellRoll {
    let base = match &spell.effect {
        SpellEffect::Projectile { base_damage, .. } => *base_damage,
        _ => 0,
    } + mastery_rank(mastery) * MAGIC_MASTERY_MAGNITUDE_PER_RANK;
    let stat_bonus = intellect / SPELL_INTELLECT_DIVISOR;
    SpellRoll {
        base,
        stat_bonus,
        total: base + stat_bonus,
    }
}

/// Heal amount, scaling with Personality
pub fn heal_amount(spell: &SpellDef, personality: i32, mastery: Option<Mastery>) -> SpellRoll {
    let base = match &spell.effect {
        SpellEffect::Heal { base_heal } => *base_heal,
        _ => 0,
    } + mastery_rank(mastery) * MAGIC_MASTERY_MAGNITUDE_PER_RANK;
    let stat_bonus = personality / HEAL_PERSONALITY_DIVISOR;
    SpellRoll {
        base,
        stat_bonus,
        total: base + stat_bonus,
    }
}

/// Damage absorbed by armor
pub fn armor_reduction(base_ac: i32, endurance: i32) -> i32 {
    (base_ac + endurance / AC_SCALING_DIVISOR) / 2
}

/// Percent chance to dodge an incoming blow entirely
pub fn dodge_chance(luck: i32) -> i32 {
    luck / DODGE_LUCK_DIVISOR
}

pub fn roll_percent(rng: &mut impl Rng, chance: i32) -> bool {
    chance > 0 && rng.gen_range(0..100) < chance
}

// =============================================================================
// PARTY ATTACKS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
}

/// Roll a member's weapon attack. Ranged shots skip the hit roll; the
/// projectile itself has to connect.
pub fn roll_attack(party: &Party, member: usize, weapon: Option<&WeaponDef>, rng: &mut impl Rng) -> AttackRoll {
    let stats = party.effective_stats(member);
    let ranged = weapon.is_some_and(|w| w.ranged);
    let hit = ranged || roll_percent(rng, hit_chance(weapon, stats.accuracy));
    let critical = hit && roll_percent(rng, crit_chance(weapon, stats.luck));
    let base = match weapon {
        Some(w) => {
            let mastery = party.members.get(member).and_then(|c| c.skill_mastery(w.skill));
            weapon_damage(w, &stats, mastery)
        }
        None => unarmed_damage(&stats),
    };
    let damage = if critical { base * CRIT_DAMAGE_MULTIPLIER } else { base };
    AttackRoll { hit, critical, damage }
}

/// Nearest live monster inside the melee swing cone
pub fn find_melee_target(map: &GameMap, origin: Vec2, facing: Vec2) -> Option<String> {
    let facing = facing.normalize_or_zero();
    map.world
        .query::<(&MonsterId, &Position, &Health)>()
        .iter()
        .filter(|(_, (_, _, health))| !health.is_dead())
        .filter_map(|(_, (id, pos, _))| {
            let offset = pos.0 - origin;
            let distance = offset.length();
            if distance > MELEE_RANGE_TILES * TILE_SIZE {
                return None;
            }
            if distance > f32::EPSILON {
                let angle = facing.dot(offset / distance).clamp(-1.0, 1.0).acos();
                if angle > MELEE_HALF_ANGLE {
                    return None;
                }
            }
            Some((id.0.clone(), distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(id, _)| id)
}

// =============================================================================
// DAMAGE APPLICATION
// =============================================================================

/// Monster ids killed this frame, reaped at end of frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadSet {
    ids: Vec<String>,
}

impl DeadSet {
    pub fn push(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|d| d == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterHit {
    pub name: String,
    pub species: String,
    pub remaining: i32,
    pub killed: bool,
}

/// Damage a monster and mark it engaged. A kill goes into the dead set; the
/// monster stays in the world until reaped. Already-dead or unknown
/// monsters are ignored.
pub fn damage_monster(map: &mut GameMap, id: &str, damage: i32, dead: &mut DeadSet) -> Option<MonsterHit> {
    let entity = map.monster_entity(id)?;
    let (health, ai, species) = map
        .world
        .query_one_mut::<(&mut Health, &mut MonsterAI, &Species)>(entity)
        .ok()?;
    if health.is_dead() {
        return None;
    }
    health.current -= damage.max(0);
    ai.engaged = true;
    let killed = health.is_dead();
    if killed {
        ai.state = MonsterState::Dead;
        dead.push(id);
    }
    Some(MonsterHit {
        name: species.name.clone(),
        species: species.key.clone(),
        remaining: health.current.max(0),
        killed,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberHit {
    /// Target was already down
    Ignored,
    Dodged,
    Hit { damage: i32, knocked_out: bool },
}

/// Apply incoming damage to a member: dodge roll, then armor, never below 1
pub fn damage_member(party: &mut Party, member: usize, raw: i32, rng: &mut impl Rng) -> MemberHit {
    let Some(character) = party.members.get(member) else {
        return MemberHit::Ignored;
    };
    if !character.is_conscious() {
        return MemberHit::Ignored;
    }
    if roll_percent(rng, dodge_chance(party.effective_stat(member, Stat::Luck))) {
        return MemberHit::Dodged;
    }
    let reduction = armor_reduction(character.armor_class_base(), party.effective_stat(member, Stat::Endurance));
    let damage = (raw - reduction).max(1);
    let knocked_out = party.members[member].take_damage(damage);
    MemberHit::Hit { damage, knocked_out }
}

/// Resolve one monster blow against a random conscious member, including
/// poison and fireburst on a landed hit. Returns the struck member.
pub fn monster_strike(
    party: &mut Party,
    attacker: &str,
    attack: &MonsterAttack,
    rng: &mut impl Rng,
    events: &mut EventQueue,
    log: &mut CombatLog,
) -> Option<usize> {
    let target = *party.conscious_indices().choose(rng)?;
    let raw = rng.gen_range(attack.damage_min..=attack.damage_max.max(attack.damage_min));
    match damage_member(party, target, raw, rng) {
        MemberHit::Ignored => return None,
        MemberHit::Dodged => {
            log.push(format!("{} dodges {}", party.members[target].name, attacker));
            events.push(GameEvent::Dodged { member: target });
        }
        MemberHit::Hit { damage, knocked_out } => {
            log.push(format!("{} hits {} for {}", attacker, party.members[target].name, damage));
            events.push(GameEvent::PartyMemberHit { member: target, damage });
            if knocked_out {
                log.push(format!("{} is unconscious", party.members[target].name));
                events.push(GameEvent::PartyMemberDown { member: target });
            }
            apply_status_effects(party, target, attacker, attack, rng, events, log);
        }
    }
    Some(target)
}

/// Poison and fireburst rolls after a landed monster hit
pub fn apply_status_effects(
    party: &mut Party,
    target: usize,
    attacker: &str,
    attack: &MonsterAttack,
    rng: &mut impl Rng,
    events: &mut EventQueue,
    log: &mut CombatLog,
) {
    if attack.poison_chance > 0 && roll_percent(rng, attack.poison_chance as i32) {
        if let Some(victim) = party.members.get_mut(target) {
            if victim.is_conscious() {
                victim.poison(attack.poison_duration_sec * TICKS_PER_SECOND);
                log.push(format!("{} is poisoned", victim.name));
            }
        }
    }
    if attack.fireburst_chance > 0 && roll_percent(rng, attack.fireburst_chance as i32) {
        let standing = party.conscious_indices();
        if standing.is_empty() {
            return;
        }
        let share = attack.fireburst_damage / standing.len() as i32;
        log.push(format!("{} bursts into flame", attacker));
        for index in standing {
            if share <= 0 {
                break;
            }
            if party.members[index].take_damage(share) {
                log.push(format!("{} is unconscious", party.members[index].name));
                events.push(GameEvent::PartyMemberDown { member: index });
            } else {
                events.push(GameEvent::PartyMemberHit {
                    member: index,
                    damage: share,
                });
            }
        }
    }
}

// =============================================================================
// REAPING
// =============================================================================

/// A monster removed from the world at end of frame
#[derive(Debug, Clone, PartialEq)]
pub struct DeadMonster {
    pub id: String,
    pub species: String,
    pub name: String,
    pub position: Vec2,
    pub encounter: Option<EncounterMember>,
    pub bounty: Option<Bounty>,
}

/// Despawn every dead monster and drop its collision box
pub fn reap_dead_monsters(map: &mut GameMap, dead: &mut DeadSet, collision: &mut CollisionSystem) -> Vec<DeadMonster> {
    puffin::profile_function!();
    let mut ids = dead.take();
    for (_, (id, health)) in map.world.query::<(&MonsterId, &Health)>().iter() {
        if health.is_dead() && !ids.contains(&id.0) {
            ids.push(id.0.clone());
        }
    }

    let mut reaped = Vec::new();
    for id in ids {
        let Some(entity) = map.monster_entity(&id) else {
            continue;
        };
        let Some(info) = dead_monster_info(map, entity, &id) else {
            continue;
        };
        let _ = map.world.despawn(entity);
        collision.unregister_entity(&id);
        log::debug!("Reaped {}", id);
        reaped.push(info);
    }
    reaped
}

fn dead_monster_info(map: &GameMap, entity: Entity, id: &str) -> Option<DeadMonster> {
    let mut query = map
        .world
        .query_one::<(&Species, &Position, Option<&EncounterMember>, Option<&Bounty>)>(entity)
        .ok()?;
    let (species, pos, encounter, bounty) = query.get()?;
    Some(DeadMonster {
        id: id.to_string(),
        species: species.key.clone(),
        name: species.name.clone(),
        position: pos.0,
        encounter: encounter.copied(),
        bounty: bounty.copied(),
    })
}
