//! Game event system for decoupled communication between systems.
//!
//! Systems emit events during the frame; the renderer, audio and UI drain
//! them afterwards. Player-facing text goes to the combat log.

use std::collections::VecDeque;

use crate::constants::COMBAT_LOG_CAPACITY;

/// Game events that systems can emit and subscribe to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A party member or projectile hit a monster
    MonsterHit {
        monster: String,
        damage: i32,
        critical: bool,
    },
    MonsterKilled {
        monster: String,
        species: String,
    },
    /// An attack on a monster missed
    Missed {
        member: usize,
    },
    PartyMemberHit {
        member: usize,
        damage: i32,
    },
    /// A perfect dodge cancelled incoming damage
    Dodged {
        member: usize,
    },
    PartyMemberDown {
        member: usize,
    },
    SpellCast {
        member: usize,
        spell: String,
    },
    LevelUp {
        member: usize,
        level: u32,
    },
    EncounterStarted {
        npc: String,
        monsters: usize,
    },
    RewardsGranted {
        gold: u32,
        experience: u32,
    },
    QuestCompleted {
        quest: String,
    },
    MapSwitched {
        from: String,
        to: String,
    },
    GameOver,
}

/// Simple event queue - events are pushed during update, drained after the frame
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to be processed later
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain all events for processing
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}

/// Bounded list of player-facing messages, newest last
#[derive(Debug, Default, Clone)]
pub struct CombatLog {
    lines: VecDeque<String>,
    /// Messages ever pushed, including ones since dropped
    total: u64,
}

impl CombatLog {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("combat log: {message}");
        if self.lines.len() == COMBAT_LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(message);
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Messages pushed after the first `seen`, as far as they are still kept
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &str> {
        let fresh = usize::try_from(self.total.saturating_sub(seen)).unwrap_or(usize::MAX);
        let skip = self.lines.len().saturating_sub(fresh);
        self.lines.iter().skip(skip).map(|s| s.as_str())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|s| s.as_str())
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}
