//! Party actions driven by input intents: movement, attacks, casting,
//! resting, and the menu and level-up prompts.

use std::sync::Arc;

use glam::Vec2;

use crate::camera::cardinal;
use crate::catalog::{SpellEffect, UtilityEffect};
use crate::collision::PLAYER_ID;
use crate::constants::*;
use crate::error::ActionRefusal;
use crate::events::GameEvent;
use crate::grid::tile_center;
use crate::input::{Intent, MoveDir, RotateDir};
use crate::party::{EquipSlot, Stat};
use crate::systems::combat::{find_melee_target, roll_attack};
use crate::systems::projectile::{Launch, ProjectileKind, ProjectileOwner};
use crate::systems::spells::{cast_spell, equipped_spell, Cast, CastOutcome};
use crate::time_system::{action_cooldown_frames, TurnMode};

use super::Game;

impl Game {
    pub(super) fn handle_intent(&mut self, intent: &Intent) {
        let world_action = matches!(
            intent,
            Intent::Move(_) | Intent::Rotate(_) | Intent::Attack | Intent::CastEquippedSpell | Intent::Interact | Intent::Rest
        );
        if world_action && self.ui.is_modal() {
            return;
        }
        match intent {
            Intent::Move(dir) => self.move_party(*dir),
            Intent::Rotate(dir) => self.rotate_party(*dir),
            Intent::Attack => {
                let _ = self.attack();
            }
            Intent::CastEquippedSpell => {
                let _ = self.cast_equipped_spell(None);
            }
            Intent::HealUnderCursor { target } => {
                let _ = self.cast_equipped_spell(Some(*target));
            }
            Intent::SelectCharacter(index) => {
                let result = self.state.party.select(*index);
                let _ = self.refuse(result);
            }
            Intent::OpenMenu(menu) => {
                self.ui.menu = if self.ui.menu == Some(*menu) { None } else { Some(*menu) };
            }
            Intent::OpenMainMenu => self.ui.main_menu = !self.ui.main_menu,
            Intent::SelectOption(option) => {
                if self.state.level_ups.is_open() {
                    let _ = self.choose_level_up(*option);
                } else if *option == 0 && self.ui.dialog.as_ref().is_some_and(|d| d.encounter_available) {
                    let _ = self.choose_combat();
                }
            }
            Intent::Confirm => {
                if self.state.level_ups.is_open() {
                    let _ = self.confirm_level_up();
                }
            }
            Intent::Cancel => {
                self.ui.dialog = None;
                self.ui.menu = None;
                self.ui.main_menu = false;
                self.state.level_ups.close();
            }
            Intent::ToggleMode => {
                let mode = self.state.scheduler.toggle_mode();
                self.log.push(match mode {
                    TurnMode::RealTime => "Real-time mode",
                    TurnMode::TurnBased => "Turn-based mode",
                });
            }
            Intent::Interact => {
                let _ = self.interact();
            }
            Intent::Rest => {
                let _ = self.rest();
            }
            Intent::MapOverlay => self.ui.map_overlay = !self.ui.map_overlay,
            Intent::ShowFps => self.metrics.show_fps = !self.metrics.show_fps,
            Intent::Save(slot) => {
                let _ = self.save_slot(*slot);
            }
            Intent::Load(slot) => {
                let _ = self.load_slot(*slot);
            }
            // Handled at the top of the frame
            Intent::ClickAt { .. } | Intent::Exit => {}
        }
    }

    // =========================================================================
    // MOVEMENT
    // =========================================================================

    fn move_party(&mut self, dir: MoveDir) {
        if self.state.party.all_down() {
            return;
        }
        let camera = self.state.camera;
        let direction = match dir {
            MoveDir::Forward => camera.forward(),
            MoveDir::Back => -camera.forward(),
            MoveDir::StrafeLeft => -camera.right(),
            MoveDir::StrafeRight => camera.right(),
        };

        if self.state.scheduler.is_turn_based() {
            // Held keys repeat every frame; refusals here stay quiet
            if self.state.scheduler.check_step().is_err() {
                return;
            }
            let (dx, dy) = cardinal(direction);
            let (tx, ty) = camera.tile();
            let target = tile_center(tx + dx, ty + dy);
            if !self.state.collision.can_move_to(PLAYER_ID, target) {
                if self.try_dive(target) {
                    self.end_turn_by_step();
                }
                return;
            }
            self.state.place_party(target);
            self.end_turn_by_step();
        } else {
            let delta = direction * PARTY_MOVE_SPEED_TILES * TILE_SIZE / TICKS_PER_SECOND as f32;
            let from = camera.position;
            let Some(target) = [delta, Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)]
                .into_iter()
                .filter(|d| *d != Vec2::ZERO)
                .map(|d| from + d)
                .find(|p| self.state.collision.can_move_to(PLAYER_ID, *p))
            else {
                self.try_dive(from + direction * TILE_SIZE * 0.5);
                return;
            };
            self.state.place_party(target);
        }
        self.after_party_moved();
    }

    /// A turn-based grid step ends the party turn; conscious members regain a spell point
    fn end_turn_by_step(&mut self) {
        if self.state.scheduler.register_step() {
            self.state.party.regenerate_spell_points();
        }
    }

    fn rotate_party(&mut self, dir: RotateDir) {
        let clockwise = dir == RotateDir::Right;
        if self.state.scheduler.is_turn_based() {
            if self.state.scheduler.rotation_ready() {
                self.state.camera.turn_quarter(clockwise);
                self.state.scheduler.register_rotation();
            }
        } else {
            let step = PARTY_TURN_SPEED / TICKS_PER_SECOND as f32;
            self.state.camera.rotate(if clockwise { step } else { -step });
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Member who performs the next attack. Real-time attacks rotate to the
    /// first member, from the selection onward, whose cooldown has run out.
    fn attacker(&self) -> Result<usize, ActionRefusal> {
        self.state.scheduler.check_action()?;
        let party = &self.state.party;
        let Some(first) = party.first_ready() else {
            return Err(ActionRefusal::Incapacitated {
                name: party.selected_member().map(|c| c.name.clone()).unwrap_or_default(),
            });
        };
        if self.state.scheduler.is_turn_based() {
            return Ok(first);
        }
        let n = party.len();
        (0..n)
            .map(|offset| (party.selected + offset) % n)
            .find(|&i| party.members[i].can_act() && party.members[i].action_cooldown == 0)
            .ok_or(ActionRefusal::OnCooldown)
    }

    /// Cooldown and turn bookkeeping after an attack or cast
    fn finish_action(&mut self, member: usize) {
        let speed = self.state.party.effective_stat(member, Stat::Speed);
        self.state.party.members[member].action_cooldown = action_cooldown_frames(speed);
        if self.state.scheduler.spend_action() {
            self.state.party.regenerate_spell_points();
        }
    }

    /// Melee swing or ranged shot with the attacker's main weapon
    pub fn attack(&mut self) -> Result<(), ActionRefusal> {
        let member = self.attacker();
        let member = self.refuse(member)?;
        let catalogs = Arc::clone(&self.catalogs);
        let weapon = match self.state.party.members[member]
            .main_weapon()
            .and_then(|item| item.weapon.clone())
        {
            Some(key) => match catalogs.weapons.find(&key) {
                Some(weapon) => Some(weapon),
                None => {
                    log::error!("Weapon '{key}' is missing from the catalog");
                    return self.refuse(Err(ActionRefusal::NotUsable(key)));
                }
            },
            None => None,
        };
        let roll = roll_attack(&self.state.party, member, weapon, &mut self.rng);
        let name = self.state.party.members[member].name.clone();
        let origin = self.state.camera.position;
        let facing = self.state.camera.forward();

        match weapon {
            Some(weapon) if weapon.ranged => {
                self.state.projectiles.launch(
                    &mut self.state.collision,
                    Launch {
                        kind: ProjectileKind::Arrow {
                            weapon: weapon.key.clone(),
                        },
                        owner: ProjectileOwner::Party(member),
                        source_name: name,
                        origin,
                        direction: facing,
                        speed_tiles: weapon.projectile_speed_tiles,
                        damage: roll.damage,
                        critical: roll.critical,
                    },
                );
            }
            _ => {
                self.state.projectiles.spawn_slash(origin + facing * TILE_SIZE * 0.75);
                match find_melee_target(self.state.current_map(), origin, facing) {
                    Some(target) if roll.hit => self.hit_monster(&target, roll.damage, roll.critical, &name),
                    Some(_) => {
                        self.log.push(format!("{name} misses"));
                        self.events.push(GameEvent::Missed { member });
                    }
                    None => {}
                }
            }
        }
        self.finish_action(member);
        Ok(())
    }

    /// Cast the selected member's equipped spell. `heal_target` aims a heal
    /// at a specific member.
    pub fn cast_equipped_spell(&mut self, heal_target: Option<usize>) -> Result<(), ActionRefusal> {
        let caster = self.state.party.selected;
        let ready = self.caster_ready(caster);
        self.refuse(ready)?;
        let catalogs = Arc::clone(&self.catalogs);
        let spell = equipped_spell(&self.state.party, caster, &catalogs.spells);
        let spell = self.refuse(spell)?;
        if heal_target.is_some() && !matches!(spell.effect, SpellEffect::Heal { .. }) {
            return self.refuse(Err(ActionRefusal::NotUsable(spell.name.clone())));
        }
        let cast = cast_spell(&mut self.state.party, caster, spell, heal_target);
        let cast = self.refuse(cast)?;
        self.apply_cast(cast);
        self.finish_action(caster);
        Ok(())
    }

    fn caster_ready(&self, caster: usize) -> Result<(), ActionRefusal> {
        self.state.scheduler.check_action()?;
        let character = self.state.party.member(caster)?;
        if !character.can_act() {
            return Err(ActionRefusal::Incapacitated {
                name: character.name.clone(),
            });
        }
        if !self.state.scheduler.is_turn_based() && character.action_cooldown > 0 {
            return Err(ActionRefusal::OnCooldown);
        }
        Ok(())
    }

    fn apply_cast(&mut self, cast: Cast) {
        let caster_name = self.state.party.members[cast.caster].name.clone();
        self.events.push(GameEvent::SpellCast {
            member: cast.caster,
            spell: cast.spell.clone(),
        });
        match cast.outcome {
            CastOutcome::Projectile { damage, speed_tiles } => {
                self.log.push(format!("{caster_name} casts {}", cast.spell_name));
                self.state.projectiles.launch(
                    &mut self.state.collision,
                    Launch {
                        kind: ProjectileKind::Magic { spell: cast.spell },
                        owner: ProjectileOwner::Party(cast.caster),
                        source_name: caster_name,
                        origin: self.state.camera.position,
                        direction: self.state.camera.forward(),
                        speed_tiles,
                        damage,
                        critical: false,
                    },
                );
            }
            CastOutcome::Healed { target, amount } => {
                let target_name = &self.state.party.members[target].name;
                self.log
                    .push(format!("{caster_name} heals {target_name} for {amount}"));
            }
            CastOutcome::Utility {
                effect,
                frames,
                magnitude,
            } => {
                self.state.party.effects.apply(effect, frames, magnitude);
                if effect == UtilityEffect::WalkOnWater {
                    self.state.collision.set_walk_on_water(true);
                }
                self.log.push(format!("{caster_name} casts {}", cast.spell_name));
            }
        }
    }

    /// End a utility effect early
    pub fn dispel(&mut self, effect: UtilityEffect) {
        self.state.party.effects.dispel(effect);
    }

    /// Eat and sleep: full HP and SP for every conscious member
    pub fn rest(&mut self) -> Result<(), ActionRefusal> {
        let nearby = self.enemies_nearby();
        let result = self.state.party.rest(nearby);
        self.refuse(result)?;
        self.log.push("The party rests");
        Ok(())
    }

    // =========================================================================
    // CHARACTER MANAGEMENT
    // =========================================================================

    pub fn assign_stat_point(&mut self, member: usize, stat: Stat) -> Result<(), ActionRefusal> {
        let result = self
            .state
            .party
            .member_mut(member)
            .and_then(|c| c.assign_stat_point(stat));
        self.refuse(result)
    }

    pub fn equip(&mut self, member: usize, inventory_index: usize) -> Result<(), ActionRefusal> {
        let result = self.state.party.equip(member, inventory_index, None);
        self.refuse(result)
    }

    pub fn unequip(&mut self, member: usize, slot: EquipSlot) -> Result<(), ActionRefusal> {
        let result = self.state.party.unequip(member, slot);
        self.refuse(result)
    }

    pub fn use_consumable(&mut self, member: usize, inventory_index: usize) -> Result<(), ActionRefusal> {
        let result = self.state.party.use_consumable(member, inventory_index);
        let message = self.refuse(result)?;
        self.log.push(message);
        Ok(())
    }

    pub fn discard(&mut self, inventory_index: usize) -> Result<(), ActionRefusal> {
        let result = self.state.party.discard(inventory_index);
        let item = self.refuse(result)?;
        self.log.push(format!("Discarded {}", item.name));
        Ok(())
    }

    /// Make a known spell the member's default cast
    pub fn ready_spell(&mut self, member: usize, spell_id: &str) -> Result<(), ActionRefusal> {
        let result = self.state.party.member_mut(member).and_then(|c| {
            if c.knows_spell(spell_id) {
                c.ready_spell = Some(spell_id.to_string());
                Ok(())
            } else {
                Err(ActionRefusal::SpellNotKnown {
                    name: c.name.clone(),
                    spell: spell_id.to_string(),
                })
            }
        });
        self.refuse(result)
    }

    // =========================================================================
    // LEVEL-UP PROMPTS
    // =========================================================================

    fn level_up_open(&self) -> Result<(), ActionRefusal> {
        if self.state.level_ups.is_open() {
            Ok(())
        } else {
            Err(ActionRefusal::NoLevelUpOpen)
        }
    }

    /// Answer the open level-up prompt with an option
    pub fn choose_level_up(&mut self, option: usize) -> Result<(), ActionRefusal> {
        let open = self.level_up_open();
        self.refuse(open)?;
        let result = self.state.level_ups.choose(option, &mut self.state.party);
        let choice = self.refuse(result)?;
        log::info!("Level-up choice: {:?}", choice);
        self.log.push("Level-up choice applied");
        Ok(())
    }

    /// Accept the highlighted option of the open prompt
    pub fn confirm_level_up(&mut self) -> Result<(), ActionRefusal> {
        let open = self.level_up_open();
        self.refuse(open)?;
        let result = self.state.level_ups.confirm(&mut self.state.party);
        let choice = self.refuse(result)?;
        log::info!("Level-up choice: {:?}", choice);
        self.log.push("Level-up choice applied");
        Ok(())
    }
}
