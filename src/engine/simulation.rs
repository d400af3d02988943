//! Game simulation - the per-frame pipeline.
//!
//! Order within a frame: exit check, mouse refresh, party tick, effect
//! timers, input, monsters, real-time melee contacts, projectiles, slash
//! visuals, dead-monster reaping with rewards, game-over check, metrics.
//! Monster planning reads a snapshot of the map; plans are applied one by
//! one afterwards, so no system sees a half-updated monster list.

use std::f32::consts::TAU;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{SpellEffect, UtilityEffect};
use crate::components::{BodySize, Health, MonsterId, MonsterState, Position};
use crate::constants::MAGIC_SPEED_TILES;
use crate::events::GameEvent;
use crate::input::{Click, FrameInput, Intent};
use crate::systems::ai::{
    apply_plan, pack_engage, plan_realtime, plan_turn, snapshot_monsters, unstick, AiAction, AiPlan, AiRolls,
    MonsterView,
};
use crate::systems::combat::{damage_member, damage_monster, monster_strike, reap_dead_monsters, MemberHit};
use crate::systems::encounter::{resolve_finished_groups, RewardsId};
use crate::systems::experience::award_experience;
use crate::systems::projectile::{Impact, ImpactTarget, Launch, ProjectileKind, ProjectileOwner, TargetBox};

use super::{Game, LoopControl};

impl Game {
    /// Advance the game by one frame
    pub fn update(&mut self, input: &FrameInput) -> LoopControl {
        puffin::GlobalProfiler::lock().new_frame();
        puffin::profile_function!();

        self.now_ms = input.now_ms;
        if input.intents.iter().any(|i| matches!(i, Intent::Exit)) {
            log::info!("Exit requested");
            return LoopControl::ExitRequested;
        }
        self.refresh_clicks(input);

        if !self.state.game_over {
            self.exploration_update(input);
        }

        self.metrics.record_frame(
            input.now_ms,
            self.state.current_map().live_monster_count(),
            self.state.projectiles.active_count(),
        );
        LoopControl::Continue
    }

    fn refresh_clicks(&mut self, input: &FrameInput) {
        for intent in &input.intents {
            if let Intent::ClickAt { x, y, button } = intent {
                self.clicks.enqueue(Click {
                    x: *x,
                    y: *y,
                    button: *button,
                    time_ms: input.now_ms,
                });
            }
        }
        self.clicks.prune(input.now_ms);
    }

    fn exploration_update(&mut self, input: &FrameInput) {
        puffin::profile_function!();
        self.tick_party();
        self.tick_effects();

        for intent in &input.intents {
            self.handle_intent(intent);
        }

        let melee = if self.state.scheduler.is_turn_based() {
            if self.state.scheduler.monster_turn_pending() {
                self.run_monster_turn();
            }
            Vec::new()
        } else {
            self.update_monsters_realtime()
        };
        self.resolve_melee_contacts(&melee);

        if !self.state.projectiles.is_empty() {
            self.step_projectiles();
        }
        self.state.projectiles.tick_slashes();

        self.reap_dead();
        self.check_game_over();
        if !self.state.level_ups.is_open() && !self.state.level_ups.is_empty() && self.ui.dialog.is_none() {
            self.state.level_ups.open();
        }
    }

    // =========================================================================
    // PARTY AND EFFECT TIMERS
    // =========================================================================

    fn tick_party(&mut self) {
        puffin::profile_scope!("party_tick");
        self.state.scheduler.tick();
        for (index, member) in self.state.party.members.iter_mut().enumerate() {
            member.tick_timers();
            let was_conscious = member.is_conscious();
            if let Some(damage) = member.tick_poison() {
                self.log.push(format!("{} suffers {} poison damage", member.name, damage));
                self.events.push(GameEvent::PartyMemberHit { member: index, damage });
                if was_conscious && !member.is_conscious() {
                    self.log.push(format!("{} is unconscious", member.name));
                    self.events.push(GameEvent::PartyMemberDown { member: index });
                }
            }
        }
        if self.state.scheduler.tick_regen() {
            self.state.party.regenerate_spell_points();
        }
    }

    fn tick_effects(&mut self) {
        puffin::profile_scope!("effects_tick");
        let expired = self.state.party.effects.tick();
        for effect in expired {
            log::debug!("{} expired", effect.id());
            match effect {
                UtilityEffect::WalkOnWater => {
                    self.state.collision.set_walk_on_water(false);
                    self.log.push("The party's feet sink back into the water");
                }
                UtilityEffect::WaterBreathing => {
                    self.log.push("Water breathing wears off");
                    if self.state.maps.current_key() == self.config.underwater_map {
                        self.underwater_return();
                    }
                }
                UtilityEffect::Bless => self.log.push("The blessing fades"),
                UtilityEffect::TorchLight => self.log.push("The torch goes out"),
                UtilityEffect::WizardEye => {}
            }
        }
        let walk_on_water = self.state.walk_on_water();
        if self.state.collision.walk_on_water() != walk_on_water {
            self.state.collision.set_walk_on_water(walk_on_water);
        }
    }

    // =========================================================================
    // MONSTERS
    // =========================================================================

    /// Real-time pass: every live monster plans against the same snapshot,
    /// then plans are applied in id order. Returns the monsters that struck
    /// in melee this frame.
    fn update_monsters_realtime(&mut self) -> Vec<MonsterView> {
        puffin::profile_scope!("monsters_realtime");
        let player = self.state.camera.position;
        let views = snapshot_monsters(self.state.maps.current());
        let rolls: Vec<AiRolls> = views
            .iter()
            .map(|_| AiRolls {
                wander: self.rng.gen_range(0..100),
                angle: self.rng.gen_range(0.0..TAU),
            })
            .collect();
        let plans: Vec<AiPlan> = {
            let grid = &self.state.maps.current().grid;
            views
                .iter()
                .zip(rolls)
                .map(|(view, rolls)| plan_realtime(view, grid, player, rolls))
                .collect()
        };
        self.apply_plans(&views, &plans)
    }

    /// Turn-based Monster turn: one resolution pass, then back to the party
    fn run_monster_turn(&mut self) {
        puffin::profile_scope!("monster_turn");
        let player = self.state.camera.position;
        let views = snapshot_monsters(self.state.maps.current());
        let plans: Vec<AiPlan> = {
            let grid = &self.state.maps.current().grid;
            views.iter().map(|view| plan_turn(view, grid, player)).collect()
        };
        let melee = self.apply_plans(&views, &plans);
        self.resolve_melee_contacts(&melee);
        self.state.scheduler.finish_monster_turn();
    }

    fn apply_plans(&mut self, views: &[MonsterView], plans: &[AiPlan]) -> Vec<MonsterView> {
        let mut melee = Vec::new();
        for (view, plan) in views.iter().zip(plans) {
            let map = self.state.maps.current_mut();
            apply_plan(map, &mut self.state.collision, plan);
            unstick(map, &mut self.state.collision, plan.entity, &plan.id);
            match plan.action {
                AiAction::Melee => melee.push(view.clone()),
                AiAction::Ranged => self.launch_monster_projectile(view),
                AiAction::Idle | AiAction::Move(_) | AiAction::Step { .. } => {}
            }
        }
        melee
    }

    fn resolve_melee_contacts(&mut self, attackers: &[MonsterView]) {
        for view in attackers {
            if self.state.party.all_down() {
                break;
            }
            monster_strike(
                &mut self.state.party,
                &view.name,
                &view.attack,
                &mut self.rng,
                &mut self.events,
                &mut self.log,
            );
        }
    }

    fn launch_monster_projectile(&mut self, view: &MonsterView) {
        let catalogs = Arc::clone(&self.catalogs);
        let (kind, speed_tiles) = if let Some(spell_id) = &view.attack.projectile_spell {
            let Some(spell) = catalogs.spells.find(spell_id) else {
                log::error!("{} casts unknown spell '{}'", view.name, spell_id);
                return;
            };
            let speed = match spell.effect {
                SpellEffect::Projectile { speed_tiles, .. } => speed_tiles,
                _ => MAGIC_SPEED_TILES,
            };
            (ProjectileKind::Magic { spell: spell.id.clone() }, speed)
        } else if let Some(weapon_key) = &view.attack.projectile_weapon {
            let Some(weapon) = catalogs.weapons.find(weapon_key) else {
                log::error!("{} shoots unknown weapon '{}'", view.name, weapon_key);
                return;
            };
            (
                ProjectileKind::Arrow {
                    weapon: weapon.key.clone(),
                },
                weapon.projectile_speed_tiles,
            )
        } else {
            return;
        };
        let attack = &view.attack;
        let damage = self
            .rng
            .gen_range(attack.damage_min..=attack.damage_max.max(attack.damage_min));
        let direction = (self.state.camera.position - view.position).normalize_or_zero();
        self.state.projectiles.launch(
            &mut self.state.collision,
            Launch {
                kind,
                owner: ProjectileOwner::Monster(view.id.clone()),
                source_name: view.name.clone(),
                origin: view.position,
                direction,
                speed_tiles,
                damage,
                critical: false,
            },
        );
    }

    /// Whether any live monster is hunting the party
    pub(super) fn enemies_nearby(&self) -> bool {
        let turn_based = self.state.scheduler.is_turn_based();
        snapshot_monsters(self.state.current_map()).iter().any(|view| {
            matches!(view.ai.state, MonsterState::Pursuing | MonsterState::Attacking)
                || (turn_based && view.ai.engaged)
        })
    }

    // =========================================================================
    // DAMAGE
    // =========================================================================

    /// Apply damage to a monster on the current map and report it
    pub(super) fn hit_monster(&mut self, id: &str, damage: i32, critical: bool, source: &str) {
        let map = self.state.maps.current_mut();
        let Some(hit) = damage_monster(map, id, damage, &mut self.state.dead) else {
            return;
        };
        let how = if critical { "critically hits" } else { "hits" };
        self.log.push(format!("{source} {how} {} for {damage}", hit.name));
        self.events.push(GameEvent::MonsterHit {
            monster: id.to_string(),
            damage,
            critical,
        });
        if self.state.scheduler.is_turn_based() {
            let woken = pack_engage(map, id);
            if !woken.is_empty() {
                log::debug!("{} woke {:?}", id, woken);
            }
        }
        if hit.killed {
            self.log.push(format!("{} dies", hit.name));
            self.events.push(GameEvent::MonsterKilled {
                monster: id.to_string(),
                species: hit.species,
            });
        }
    }

    fn step_projectiles(&mut self) {
        puffin::profile_scope!("projectiles");
        let targets: Vec<TargetBox> = self
            .state
            .current_map()
            .world
            .query::<(&MonsterId, &Position, &BodySize, &Health)>()
            .iter()
            .filter(|(_, (_, _, _, health))| !health.is_dead())
            .map(|(_, (id, pos, size, _))| TargetBox {
                id: id.0.clone(),
                center: pos.0,
                half_size: size.0,
            })
            .collect();
        let impacts = self
            .state
            .projectiles
            .step(&mut self.state.collision, &targets, self.state.camera.position);
        for impact in impacts {
            self.apply_impact(impact);
        }
    }

    fn apply_impact(&mut self, impact: Impact) {
        log::debug!("{} struck {:?}", impact.projectile, impact.target);
        match impact.target {
            ImpactTarget::Monster(id) => {
                self.hit_monster(&id, impact.damage, impact.critical, &impact.source_name);
            }
            ImpactTarget::Party => {
                if impact.owner.is_party() {
                    return;
                }
                let Some(target) = self.state.party.conscious_indices().choose(&mut self.rng).copied() else {
                    return;
                };
                let party = &mut self.state.party;
                match damage_member(party, target, impact.damage, &mut self.rng) {
                    MemberHit::Ignored => {}
                    MemberHit::Dodged => {
                        self.log
                            .push(format!("{} dodges {}'s shot", party.members[target].name, impact.source_name));
                        self.events.push(GameEvent::Dodged { member: target });
                    }
                    MemberHit::Hit { damage, knocked_out } => {
                        let name = party.members[target].name.clone();
                        self.log
                            .push(format!("{} hits {} for {}", impact.source_name, name, damage));
                        self.events.push(GameEvent::PartyMemberHit { member: target, damage });
                        if knocked_out {
                            self.log.push(format!("{name} is unconscious"));
                            self.events.push(GameEvent::PartyMemberDown { member: target });
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // REAPING AND REWARDS
    // =========================================================================

    fn reap_dead(&mut self) {
        puffin::profile_scope!("reap");
        let reaped = reap_dead_monsters(
            self.state.maps.current_mut(),
            &mut self.state.dead,
            &mut self.state.collision,
        );
        if reaped.is_empty() {
            return;
        }
        let mut groups: Vec<Option<RewardsId>> = Vec::new();
        for dead in &reaped {
            match (dead.encounter, dead.bounty) {
                (Some(member), _) => groups.push(member.rewards),
                (None, Some(bounty)) => self.grant(bounty.gold, bounty.experience),
                (None, None) => {}
            }
            for quest in self.state.quests.on_monster_killed(&dead.species) {
                self.announce_quest(&quest);
            }
        }
        let finished = resolve_finished_groups(&groups, &self.state.maps.current().world, &mut self.state.rewards);
        for id in finished {
            self.grant_encounter_rewards(id);
        }
    }

    /// Pay out a finished encounter. A linked quest the party holds takes
    /// over the payout and is claimed through the quest log.
    fn grant_encounter_rewards(&mut self, id: RewardsId) {
        let Some(rewards) = self.state.rewards.get(id).cloned() else {
            return;
        };
        log::info!("Encounter {:?} cleared", id);
        if !rewards.message.is_empty() {
            self.log.push(rewards.message.clone());
        }
        match rewards.quest.as_deref() {
            Some(quest) if self.state.quests.contains(quest) => {
                if self.state.quests.complete_encounter_quest(quest).is_some() {
                    self.announce_quest(quest);
                }
            }
            _ => self.grant(rewards.gold, rewards.experience),
        }
    }

    fn announce_quest(&mut self, quest_id: &str) {
        let name = self
            .state
            .quests
            .get(quest_id)
            .map_or_else(|| quest_id.to_string(), |q| q.def.name.clone());
        self.log.push(format!("Quest complete: {name}"));
        self.events.push(GameEvent::QuestCompleted {
            quest: quest_id.to_string(),
        });
    }

    /// Add gold and split experience among conscious members
    pub(super) fn grant(&mut self, gold: u32, experience: u32) {
        if gold == 0 && experience == 0 {
            return;
        }
        self.state.party.gold += gold;
        award_experience(
            &mut self.state.party,
            experience,
            &self.catalogs.classes,
            &mut self.state.level_ups,
            &mut self.events,
        );
        self.log
            .push(format!("The party gains {gold} gold and {experience} experience"));
        self.events.push(GameEvent::RewardsGranted { gold, experience });
    }

    fn check_game_over(&mut self) {
        if self.state.game_over || !self.state.party.all_down() {
            return;
        }
        self.state.game_over = true;
        log::info!("Game over after {} frames", self.metrics.frame);
        self.log.push("The party has fallen");
        self.events.push(GameEvent::GameOver);
    }
}
