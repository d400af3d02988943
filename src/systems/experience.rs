//! Experience and leveling system.

use crate::catalog::ClassCatalog;
use crate::constants::*;
use crate::events::{EventQueue, GameEvent};
use crate::level_up::{LevelUpQueue, LevelUpRequest};
use crate::party::{Character, Party};

/// XP needed to reach the next level
pub fn xp_for_level(level: u32) -> u32 {
    level.max(1) * XP_PER_LEVEL_MULTIPLIER
}

/// Calculate XP progress toward next level (0.0 to 1.0)
pub fn xp_progress(character: &Character) -> f32 {
    character.experience as f32 / xp_for_level(character.level) as f32
}

/// Add XP to a character. Returns every level reached, in order.
pub fn grant_xp(character: &mut Character, amount: u32) -> Vec<u32> {
    character.experience += amount;
    character.total_experience += amount;
    let mut reached = Vec::new();
    while character.experience >= xp_for_level(character.level) {
        character.experience -= xp_for_level(character.level);
        character.level += 1;
        reached.push(character.level);
    }
    reached
}

/// Split experience among conscious members and process level ups: one
/// free stat point per level, derived stats recomputed, and a choice
/// request queued for every level the class table names.
pub fn award_experience(
    party: &mut Party,
    amount: u32,
    classes: &ClassCatalog,
    queue: &mut LevelUpQueue,
    events: &mut EventQueue,
) {
    let receivers = party.conscious_indices();
    if receivers.is_empty() || amount == 0 {
        return;
    }
    let share = amount / receivers.len() as u32;
    for index in receivers {
        let member = &mut party.members[index];
        for level in grant_xp(member, share) {
            member.free_stat_points += 1;
            member.recompute_derived();
            log::info!("{} reached level {}", member.name, level);
            events.push(GameEvent::LevelUp { member: index, level });
            let choice = classes
                .find(&member.class)
                .and_then(|class| class.choice_at(level));
            if let Some(choice) = choice {
                queue.push(LevelUpRequest {
                    member: index,
                    level,
                    options: choice.options.clone(),
                    selection: 0,
                });
            }
        }
    }
}
