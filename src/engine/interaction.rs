//! NPC interactions: dialogs, trading, quests and encounter fights.
//!
//! These are side effects the UI layer triggers from an open dialog. Each
//! returns a refusal without touching state when it cannot go ahead.

use std::sync::Arc;

use crate::catalog::{ItemCatalogExt, NpcKind};
use crate::components::{Npc, Position};
use crate::constants::{INTERACT_RANGE_TILES, TILE_SIZE};
use crate::error::ActionRefusal;
use crate::events::GameEvent;
use crate::systems::encounter::start_encounter;

use super::Game;

/// An open NPC dialog
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub npc: String,
    pub name: String,
    pub kind: NpcKind,
    pub lines: Vec<String>,
    /// Spells or items on offer
    pub stock: Vec<String>,
    pub quest: Option<String>,
    /// The `combat` choice is still available
    pub encounter_available: bool,
}

impl Game {
    /// Talk to the nearest NPC within reach
    pub fn interact(&mut self) -> Result<&Dialog, ActionRefusal> {
        let reach = INTERACT_RANGE_TILES * TILE_SIZE;
        let origin = self.state.camera.position;
        let map = self.state.current_map();
        let nearest = map
            .world
            .query::<(&Npc, &Position)>()
            .iter()
            .map(|(_, (npc, pos))| (npc.clone(), pos.0.distance(origin)))
            .filter(|(_, dist)| *dist <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((npc, _)) = nearest else {
            return self.refuse(Err(ActionRefusal::NoNpc));
        };
        let Some(def) = map.npc_def(&npc.id) else {
            log::error!("NPC '{}' has no definition on '{}'", npc.id, map.key);
            return self.refuse(Err(ActionRefusal::NoNpc));
        };

        let stock = match npc.kind {
            NpcKind::SpellTrader => def.spells.clone(),
            NpcKind::Merchant => def.items.clone(),
            NpcKind::Encounter | NpcKind::Generic => Vec::new(),
        };
        let dialog = Dialog {
            npc: npc.id.clone(),
            name: npc.name.clone(),
            kind: npc.kind,
            lines: def.dialogue.clone(),
            stock,
            quest: def.quest.clone(),
            encounter_available: npc.kind == NpcKind::Encounter && def.encounter.is_some() && !npc.visited,
        };
        if npc.kind != NpcKind::Encounter {
            self.state.maps.current_mut().set_visited(&npc.id, true);
        }
        log::debug!("Talking to {}", npc.name);
        Ok(self.ui.dialog.insert(dialog))
    }

    /// Answer an encounter NPC with `combat`: its monsters appear around it
    pub fn choose_combat(&mut self) -> Result<usize, ActionRefusal> {
        let Some(npc_id) = self
            .ui
            .dialog
            .as_ref()
            .filter(|d| d.encounter_available)
            .map(|d| d.npc.clone())
        else {
            return self.refuse(Err(ActionRefusal::NoNpc));
        };
        let map = self.state.maps.current_mut();
        let encounter = map.npc_def(&npc_id).and_then(|d| d.encounter.clone());
        let center = map
            .npc_entity(&npc_id)
            .and_then(|e| map.world.get::<&Position>(e).ok().map(|p| p.0));
        let (Some(encounter), Some(center)) = (encounter, center) else {
            return self.refuse(Err(ActionRefusal::NoNpc));
        };

        let catalogs = Arc::clone(&self.catalogs);
        let spawned = match start_encounter(
            map,
            center,
            &encounter,
            &catalogs.monsters,
            &mut self.state.rewards,
            &mut self.rng,
        ) {
            Ok(spawned) => spawned,
            Err(err) => {
                log::error!("Encounter for '{npc_id}' failed: {err}");
                return self.refuse(Err(ActionRefusal::NoNpc));
            }
        };
        map.set_visited(&npc_id, true);
        for monster in &spawned {
            let habitat = catalogs
                .monsters
                .find(&monster.species)
                .map(|def| def.habitat)
                .unwrap_or_default();
            self.state
                .register_monster(&monster.id, monster.position, monster.half_size, habitat);
        }

        self.ui.dialog = None;
        self.log.push("Steel is drawn!");
        self.events.push(GameEvent::EncounterStarted {
            npc: npc_id,
            monsters: spawned.len(),
        });
        Ok(spawned.len())
    }

    /// Buy a spell from a trader into `member`'s spellbook
    pub fn purchase_spell(&mut self, npc_id: &str, spell_id: &str, member: usize) -> Result<(), ActionRefusal> {
        let result = self.try_purchase_spell(npc_id, spell_id, member);
        self.refuse(result)?;
        let name = &self.state.party.members[member].name;
        self.log.push(format!("{name} learns {spell_id}"));
        Ok(())
    }

    fn try_purchase_spell(&mut self, npc_id: &str, spell_id: &str, member: usize) -> Result<(), ActionRefusal> {
        let def = self
            .state
            .current_map()
            .npc_def(npc_id)
            .filter(|d| d.kind == NpcKind::SpellTrader)
            .ok_or(ActionRefusal::NoNpc)?;
        if !def.spells.iter().any(|s| s == spell_id) {
            return Err(ActionRefusal::UnknownSpell(spell_id.to_string()));
        }
        let spell = self
            .catalogs
            .spells
            .find(spell_id)
            .ok_or_else(|| ActionRefusal::UnknownSpell(spell_id.to_string()))?;
        let character = self.state.party.member(member)?;
        if character.knows_spell(spell_id) {
            return Err(ActionRefusal::SpellAlreadyKnown {
                name: character.name.clone(),
                spell: spell.name.clone(),
            });
        }
        let can_learn = self
            .catalogs
            .classes
            .find(&character.class)
            .is_some_and(|class| class.has_school(spell.school));
        if !can_learn {
            return Err(ActionRefusal::NotUsable(format!("{} for {}", spell.name, character.name)));
        }
        let (school, price) = (spell.school, spell.price);
        self.state.party.spend_gold(price)?;
        self.state.party.members[member].learn_spell(school, spell_id)
    }

    /// Sell an inventory item for half its value
    pub fn sell_item(&mut self, inventory_index: usize) -> Result<u32, ActionRefusal> {
        let result = self.state.party.sell(inventory_index);
        let price = self.refuse(result)?;
        self.log.push(format!("Sold for {price} gold"));
        Ok(price)
    }

    /// Buy an item a merchant stocks
    pub fn buy_item(&mut self, npc_id: &str, item_key: &str) -> Result<(), ActionRefusal> {
        let result = self.try_buy_item(npc_id, item_key);
        let name = self.refuse(result)?;
        self.log.push(format!("Bought {name}"));
        Ok(())
    }

    fn try_buy_item(&mut self, npc_id: &str, item_key: &str) -> Result<String, ActionRefusal> {
        let stocked = self
            .state
            .current_map()
            .npc_def(npc_id)
            .filter(|d| d.kind == NpcKind::Merchant)
            .ok_or(ActionRefusal::NoNpc)?
            .items
            .iter()
            .any(|i| i == item_key);
        if !stocked {
            return Err(ActionRefusal::NotUsable(item_key.to_string()));
        }
        let item = self
            .catalogs
            .items
            .instantiate(item_key)
            .map_err(|_| ActionRefusal::NotUsable(item_key.to_string()))?;
        self.state.party.spend_gold(item.value().max(0) as u32)?;
        let name = item.name.clone();
        self.state.party.add_item(item);
        Ok(name)
    }

    /// Take the quest an NPC offers
    pub fn accept_quest(&mut self, npc_id: &str) -> Result<(), ActionRefusal> {
        let quest_id = self
            .state
            .current_map()
            .npc_def(npc_id)
            .and_then(|d| d.quest.clone())
            .ok_or(ActionRefusal::NoNpc);
        let quest_id = self.refuse(quest_id)?;
        let catalogs = Arc::clone(&self.catalogs);
        let Some(def) = catalogs.quests.find(&quest_id) else {
            log::error!("Quest '{quest_id}' is missing from the catalog");
            return self.refuse(Err(ActionRefusal::UnknownQuest(quest_id)));
        };
        if self.state.quests.accept(def) {
            self.log.push(format!("New quest: {}", def.name));
        }
        Ok(())
    }

    /// Hand out a completed quest's gold, experience and items
    pub fn claim_quest_reward(&mut self, quest_id: &str) -> Result<(), ActionRefusal> {
        let result = self.state.quests.claim_rewards(quest_id);
        let rewards = self.refuse(result)?;
        self.grant(rewards.gold, rewards.experience);
        let catalogs = Arc::clone(&self.catalogs);
        for key in &rewards.items {
            match catalogs.items.instantiate(key) {
                Ok(item) => {
                    self.log.push(format!("Received {}", item.name));
                    self.state.party.add_item(item);
                }
                Err(err) => log::error!("Quest '{quest_id}' reward: {err}"),
            }
        }
        Ok(())
    }
}
