//! Quest tracking: kill counts, encounter completion and reward claims.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{QuestDef, QuestKind, QuestRewards};
use crate::error::ActionRefusal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
}

#[derive(Debug, Clone)]
pub struct Quest {
    pub def: QuestDef,
    pub current_count: u32,
    pub status: QuestStatus,
    pub rewards_claimed: bool,
}

impl Quest {
    fn new(def: QuestDef) -> Self {
        Self {
            def,
            current_count: 0,
            status: QuestStatus::Active,
            rewards_claimed: false,
        }
    }

    fn complete(&mut self) {
        self.status = QuestStatus::Completed;
        if self.def.kind == QuestKind::Kill {
            self.current_count = self.def.target_count;
        }
    }
}

/// Saved progress of one quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub id: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub claimed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuestManager {
    quests: BTreeMap<String, Quest>,
}

impl QuestManager {
    /// Start tracking a quest. Returns false if it is already tracked.
    pub fn accept(&mut self, def: &QuestDef) -> bool {
        if self.quests.contains_key(&def.id) {
            return false;
        }
        log::info!("Quest accepted: {}", def.name);
        self.quests.insert(def.id.clone(), Quest::new(def.clone()));
        true
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.quests.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.quests.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    /// Count a kill toward every active kill quest for the species. Returns
    /// the ids of quests completed by this kill.
    pub fn on_monster_killed(&mut self, species: &str) -> Vec<String> {
        let mut completed = Vec::new();
        for quest in self.quests.values_mut() {
            if quest.status != QuestStatus::Active
                || quest.def.kind != QuestKind::Kill
                || quest.def.target_species.as_deref() != Some(species)
            {
                continue;
            }
            quest.current_count = (quest.current_count + 1).min(quest.def.target_count);
            if quest.current_count >= quest.def.target_count {
                quest.complete();
                completed.push(quest.def.id.clone());
            }
        }
        completed
    }

    /// Mark an encounter quest done. Returns the rewards now awaiting a
    /// claim, or None if the quest is unknown or already completed.
    pub fn complete_encounter_quest(&mut self, id: &str) -> Option<QuestRewards> {
        let quest = self.quests.get_mut(id)?;
        if quest.status == QuestStatus::Completed {
            return None;
        }
        quest.complete();
        quest.current_count = quest.def.target_count;
        log::info!("Quest completed: {}", quest.def.name);
        Some(quest.def.rewards.clone())
    }

    /// Hand out a completed quest's rewards, exactly once
    pub fn claim_rewards(&mut self, id: &str) -> Result<QuestRewards, ActionRefusal> {
        let quest = self
            .quests
            .get_mut(id)
            .ok_or_else(|| ActionRefusal::UnknownQuest(id.to_string()))?;
        if quest.status != QuestStatus::Completed {
            return Err(ActionRefusal::QuestNotCompleted(quest.def.name.clone()));
        }
        if quest.rewards_claimed {
            return Err(ActionRefusal::RewardAlreadyClaimed(quest.def.name.clone()));
        }
        quest.rewards_claimed = true;
        Ok(quest.def.rewards.clone())
    }

    /// Reapply saved progress, tracking the quest if needed
    pub fn restore_quest_progress(&mut self, def: &QuestDef, status: QuestStatus, count: u32, claimed: bool) {
        let quest = self
            .quests
            .entry(def.id.clone())
            .or_insert_with(|| Quest::new(def.clone()));
        quest.status = status;
        quest.current_count = count.min(def.target_count);
        quest.rewards_claimed = claimed && status == QuestStatus::Completed;
    }

    pub fn progress(&self) -> Vec<QuestProgress> {
        self.quests
            .values()
            .map(|q| QuestProgress {
                id: q.def.id.clone(),
                status: q.status,
                count: q.current_count,
                claimed: q.rewards_claimed,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kill_quest() -> QuestDef {
        QuestDef {
            id: "rats".to_string(),
            name: "Rat Problem".to_string(),
            description: String::new(),
            kind: QuestKind::Kill,
            target_species: Some("rat".to_string()),
            target_count: 2,
            rewards: QuestRewards {
                gold: 50,
                experience: 100,
                items: Vec::new(),
            },
            map_marker: None,
        }
    }

    fn encounter_quest() -> QuestDef {
        QuestDef {
            id: "encounter_a".to_string(),
            name: "Ambush".to_string(),
            description: String::new(),
            kind: QuestKind::Encounter,
            target_species: None,
            target_count: 1,
            rewards: QuestRewards {
                gold: 10,
                experience: 5,
                items: Vec::new(),
            },
            map_marker: None,
        }
    }

    #[test]
    fn test_kill_quest_counts_only_its_species() {
        let mut quests = QuestManager::default();
        quests.accept(&kill_quest());
        assert!(quests.on_monster_killed("goblin").is_empty());
        assert!(quests.on_monster_killed("rat").is_empty());
        assert_eq!(quests.on_monster_killed("rat"), vec!["rats".to_string()]);
        assert!(quests.on_monster_killed("rat").is_empty());
        assert_eq!(quests.get("rats").unwrap().current_count, 2);
    }

    #[test]
    fn test_claim_exactly_once() {
        let mut quests = QuestManager::default();
        quests.accept(&encounter_quest());
        assert!(matches!(
            quests.claim_rewards("encounter_a"),
            Err(ActionRefusal::QuestNotCompleted(_))
        ));
        assert_eq!(quests.complete_encounter_quest("encounter_a").unwrap().gold, 10);
        assert!(quests.complete_encounter_quest("encounter_a").is_none());
        assert_eq!(quests.claim_rewards("encounter_a").unwrap().gold, 10);
        assert!(matches!(
            quests.claim_rewards("encounter_a"),
            Err(ActionRefusal::RewardAlreadyClaimed(_))
        ));
    }

    #[test]
    fn test_unknown_quest() {
        let mut quests = QuestManager::default();
        assert!(quests.complete_encounter_quest("nope").is_none());
        assert_eq!(
            quests.claim_rewards("nope"),
            Err(ActionRefusal::UnknownQuest("nope".to_string()))
        );
    }

    #[test]
    fn test_restore_progress_round_trip() {
        let mut quests = QuestManager::default();
        quests.accept(&kill_quest());
        quests.on_monster_killed("rat");
        let saved = quests.progress();

        let mut restored = QuestManager::default();
        for p in &saved {
            restored.restore_quest_progress(&kill_quest(), p.status, p.count, p.claimed);
        }
        assert_eq!(restored.progress(), saved);
    }
}
