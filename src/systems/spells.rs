//! Spell casting.
//!
//! Resolves the spell a member has ready, checks and pays its cost, and
//! reports what the cast produced. Launching projectiles, starting timers
//! and spending turn actions are left to the caller, which owns those
//! subsystems.

use crate::catalog::{SpellCatalog, SpellDef, SpellEffect, UtilityEffect};
use crate::constants::TICKS_PER_SECOND;
use crate::error::ActionRefusal;
use crate::party::{Condition, EquipSlot, Party, Stat};
use crate::systems::combat::{heal_amount, spell_damage};

/// What a successful cast produced
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// A magic bolt to launch along the party's facing
    Projectile { damage: i32, speed_tiles: f32 },
    Healed { target: usize, amount: i32 },
    /// A timed party buff to start
    Utility {
        effect: UtilityEffect,
        frames: u32,
        magnitude: i32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub caster: usize,
    pub spell: String,
    pub spell_name: String,
    pub outcome: CastOutcome,
}

/// Whether `member` may cast `spell_id`: it is in one of their schools'
/// spellbooks or on a spell item in their spell slot
fn can_use_spell(party: &Party, member: usize, spell_id: &str) -> bool {
    party.members.get(member).is_some_and(|c| {
        c.knows_spell(spell_id)
            || c.equipment
                .get(&EquipSlot::Spell)
                .and_then(|item| item.spell.as_deref())
                == Some(spell_id)
    })
}

/// The spell `member` would cast with the cast intent
pub fn equipped_spell<'a>(party: &Party, member: usize, spells: &'a SpellCatalog) -> Result<&'a SpellDef, ActionRefusal> {
    let character = party.member(member)?;
    let id = character
        .equipped_spell()
        .ok_or_else(|| ActionRefusal::NotUsable(format!("{}'s spellbook", character.name)))?;
    let spell = spells
        .find(id)
        .ok_or_else(|| ActionRefusal::UnknownSpell(id.to_string()))?;
    if !can_use_spell(party, member, id) {
        return Err(ActionRefusal::SpellNotKnown {
            name: character.name.clone(),
            spell: spell.name.clone(),
        });
    }
    Ok(spell)
}

/// Most wounded member that can still be healed
pub fn most_wounded(party: &Party) -> Option<usize> {
    party
        .members
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.has_condition(Condition::Dead) && c.hit_points < c.max_hit_points)
        .min_by(|(_, a), (_, b)| {
            let ra = a.hit_points as f32 / a.max_hit_points.max(1) as f32;
            let rb = b.hit_points as f32 / b.max_hit_points.max(1) as f32;
            ra.total_cmp(&rb)
        })
        .map(|(i, _)| i)
}

/// Cast `spell` as `caster`. Heals go to `heal_target` when given, else to
/// the most wounded member. Nothing is changed on refusal.
pub fn cast_spell(
    party: &mut Party,
    caster: usize,
    spell: &SpellDef,
    heal_target: Option<usize>,
) -> Result<Cast, ActionRefusal> {
    let character = party.member(caster)?;
    if !character.can_act() {
        return Err(ActionRefusal::Incapacitated {
            name: character.name.clone(),
        });
    }
    if !can_use_spell(party, caster, &spell.id) {
        return Err(ActionRefusal::SpellNotKnown {
            name: character.name.clone(),
            spell: spell.name.clone(),
        });
    }
    if character.spell_points < spell.sp_cost {
        return Err(ActionRefusal::NotEnoughSpellPoints {
            needed: spell.sp_cost,
            have: character.spell_points,
        });
    }
    let mastery = character.school_mastery(spell.school);

    let outcome = match &spell.effect {
        SpellEffect::Projectile { speed_tiles, .. } => CastOutcome::Projectile {
            damage: spell_damage(spell, party.effective_stat(caster, Stat::Intellect), mastery).total,
            speed_tiles: *speed_tiles,
        },
        SpellEffect::Heal { .. } => {
            let target = match heal_target {
                Some(index) => {
                    let target = party.member(index)?;
                    if target.has_condition(Condition::Dead) {
                        return Err(ActionRefusal::NotUsable(format!("{} on {}", spell.name, target.name)));
                    }
                    index
                }
                None => most_wounded(party).unwrap_or(caster),
            };
            CastOutcome::Healed {
                target,
                amount: heal_amount(spell, party.effective_stat(caster, Stat::Personality), mastery).total,
            }
        }
        SpellEffect::Utility {
            utility,
            duration_sec,
            magnitude,
        } => CastOutcome::Utility {
            effect: *utility,
            frames: duration_sec * TICKS_PER_SECOND,
            magnitude: *magnitude,
        },
    };

    let character = &mut party.members[caster];
    character.spend_spell_points(spell.sp_cost)?;
    character.schools.entry(spell.school).or_default().cast_count += 1;
    let outcome = match outcome {
        CastOutcome::Healed { target, amount } => {
            let healed = party.members[target].heal(amount);
            CastOutcome::Healed { target, amount: healed }
        }
        other => other,
    };
    log::debug!("{} casts {}", party.members[caster].name, spell.name);
    Ok(Cast {
        caster,
        spell: spell.id.clone(),
        spell_name: spell.name.clone(),
        outcome,
    })
}
