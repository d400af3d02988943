//! Dual-mode turn scheduling.
//!
//! Real-time: monsters and projectiles advance every frame and each member's
//! actions are gated by a per-character cooldown derived from Speed.
//! Turn-based: the party spends up to two actions (or one grid step) per
//! Party turn, then a single Monster turn pass resolves before control
//! returns to the party.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ActionRefusal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    #[default]
    RealTime,
    TurnBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    #[default]
    Party,
    Monster,
}

/// Action cooldown in frames for an effective Speed value. Linear through
/// (5, 60) and (50, 30), clamped to [15, 90]; Speed 0 or less waits the maximum.
pub fn action_cooldown_frames(speed: i32) -> u32 {
    if speed <= 0 {
        return MAX_ACTION_COOLDOWN_FRAMES;
    }
    let slope = (COOLDOWN_ANCHOR_HIGH_FRAMES - COOLDOWN_ANCHOR_LOW_FRAMES) as f32
        / (COOLDOWN_ANCHOR_HIGH_SPEED - COOLDOWN_ANCHOR_LOW_SPEED) as f32;
    let frames = COOLDOWN_ANCHOR_LOW_FRAMES as f32 + slope * (speed - COOLDOWN_ANCHOR_LOW_SPEED) as f32;
    (frames.round() as i64).clamp(
        MIN_ACTION_COOLDOWN_FRAMES as i64,
        MAX_ACTION_COOLDOWN_FRAMES as i64,
    ) as u32
}

/// Turn state shared by the whole party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnScheduler {
    pub mode: TurnMode,
    pub turn: Turn,
    /// Attacks and casts spent this Party turn
    pub actions_used: u8,
    pub rotation_cooldown: u32,
    pub movement_cooldown: u32,
    /// Set once the Monster turn pass for the current round has run
    pub monster_turn_resolved: bool,
    /// Frames since the last real-time spell point tick
    pub sp_regen_counter: u32,
}

impl TurnScheduler {
    pub fn is_turn_based(&self) -> bool {
        self.mode == TurnMode::TurnBased
    }

    /// Swap modes at a clean Party-turn boundary
    pub fn toggle_mode(&mut self) -> TurnMode {
        self.mode = match self.mode {
            TurnMode::RealTime => TurnMode::TurnBased,
            TurnMode::TurnBased => TurnMode::RealTime,
        };
        self.turn = Turn::Party;
        self.actions_used = 0;
        self.monster_turn_resolved = false;
        self.sp_regen_counter = 0;
        log::info!("Combat mode: {:?}", self.mode);
        self.mode
    }

    /// Per-frame debounce timers
    pub fn tick(&mut self) {
        self.rotation_cooldown = self.rotation_cooldown.saturating_sub(1);
        self.movement_cooldown = self.movement_cooldown.saturating_sub(1);
    }

    /// Real-time spell point regeneration clock. True when a regen tick is
    /// due this frame. Suspended in turn-based mode.
    pub fn tick_regen(&mut self) -> bool {
        if self.is_turn_based() {
            return false;
        }
        self.sp_regen_counter += 1;
        if self.sp_regen_counter >= SP_REGEN_INTERVAL_FRAMES {
            self.sp_regen_counter = 0;
            return true;
        }
        false
    }

    /// Whether the party may attack or cast right now (turn gating only)
    pub fn check_action(&self) -> Result<(), ActionRefusal> {
        if !self.is_turn_based() {
            return Ok(());
        }
        if self.turn != Turn::Party {
            return Err(ActionRefusal::NotPartyTurn);
        }
        if self.actions_used >= PARTY_ACTIONS_PER_TURN {
            return Err(ActionRefusal::NoActionsLeft);
        }
        Ok(())
    }

    /// Count an attack or cast. Returns true when this ended the Party turn.
    pub fn spend_action(&mut self) -> bool {
        if !self.is_turn_based() {
            return false;
        }
        self.actions_used = (self.actions_used + 1).min(PARTY_ACTIONS_PER_TURN);
        if self.actions_used >= PARTY_ACTIONS_PER_TURN {
            self.end_party_turn();
            return true;
        }
        false
    }

    /// Whether a turn-based grid step is allowed now
    pub fn check_step(&self) -> Result<(), ActionRefusal> {
        if !self.is_turn_based() {
            return Ok(());
        }
        if self.turn != Turn::Party {
            return Err(ActionRefusal::NotPartyTurn);
        }
        if self.movement_cooldown > 0 {
            return Err(ActionRefusal::OnCooldown);
        }
        Ok(())
    }

    /// A grid step ends the Party turn immediately
    pub fn register_step(&mut self) -> bool {
        if !self.is_turn_based() {
            return false;
        }
        self.movement_cooldown = MOVEMENT_COOLDOWN_FRAMES;
        self.end_party_turn();
        true
    }

    pub fn rotation_ready(&self) -> bool {
        self.rotation_cooldown == 0
    }

    pub fn register_rotation(&mut self) {
        self.rotation_cooldown = ROTATION_COOLDOWN_FRAMES;
    }

    fn end_party_turn(&mut self) {
        self.turn = Turn::Monster;
        self.monster_turn_resolved = false;
    }

    /// Whether a Monster turn pass is pending
    pub fn monster_turn_pending(&self) -> bool {
        self.is_turn_based() && self.turn == Turn::Monster && !self.monster_turn_resolved
    }

    /// Close the Monster turn and hand control back to the party
    pub fn finish_monster_turn(&mut self) {
        self.monster_turn_resolved = true;
        self.turn = Turn::Party;
        self.actions_used = 0;
    }
}
