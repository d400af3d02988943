//! Timed utility spell effects owned by the party.
//!
//! Each effect carries an `active` flag and a frame duration. The per-frame
//! tick drives durations to zero and reports which effects expired so the
//! caller can undo their world-level side state (walk-on-water flag,
//! underwater return).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::UtilityEffect;
use crate::constants::*;

/// Active flag plus remaining and maximum duration in frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimedEffect {
    pub active: bool,
    pub duration: u32,
    pub max_duration: u32,
}

impl TimedEffect {
    fn start(&mut self, frames: u32) {
        self.active = frames > 0;
        self.duration = frames;
        self.max_duration = frames;
    }
}

/// Where the party resurfaces when water breathing runs out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwaterReturn {
    pub map: String,
    pub x: f32,
    pub y: f32,
}

/// Status-bar entry for one active effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtilityStatus {
    pub icon: &'static str,
    pub remaining: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityEffects {
    pub torch_light: TimedEffect,
    /// Light radius in tiles while the torch burns
    pub torch_radius: f32,
    pub wizard_eye: TimedEffect,
    pub walk_on_water: TimedEffect,
    pub bless: TimedEffect,
    /// Stat bonus granted to every member while blessed
    pub bless_bonus: i32,
    pub water_breathing: TimedEffect,
    pub underwater_return: Option<UnderwaterReturn>,
    /// Derived from the timers above; rebuilt on restore
    #[serde(skip)]
    status: BTreeMap<UtilityEffect, UtilityStatus>,
}

impl Default for UtilityEffects {
    fn default() -> Self {
        Self {
            torch_light: TimedEffect::default(),
            torch_radius: TORCH_DEFAULT_RADIUS,
            wizard_eye: TimedEffect::default(),
            walk_on_water: TimedEffect::default(),
            bless: TimedEffect::default(),
            bless_bonus: 0,
            water_breathing: TimedEffect::default(),
            underwater_return: None,
            status: BTreeMap::new(),
        }
    }
}

impl UtilityEffects {
    pub fn timer(&self, effect: UtilityEffect) -> &TimedEffect {
        match effect {
            UtilityEffect::TorchLight => &self.torch_light,
            UtilityEffect::WizardEye => &self.wizard_eye,
            UtilityEffect::WalkOnWater => &self.walk_on_water,
            UtilityEffect::Bless => &self.bless,
            UtilityEffect::WaterBreathing => &self.water_breathing,
        }
    }

    fn timer_mut(&mut self, effect: UtilityEffect) -> &mut TimedEffect {
        match effect {
            UtilityEffect::TorchLight => &mut self.torch_light,
            UtilityEffect::WizardEye => &mut self.wizard_eye,
            UtilityEffect::WalkOnWater => &mut self.walk_on_water,
            UtilityEffect::Bless => &mut self.bless,
            UtilityEffect::WaterBreathing => &mut self.water_breathing,
        }
    }

    pub fn is_active(&self, effect: UtilityEffect) -> bool {
        self.timer(effect).active
    }

    /// Start or refresh an effect. `magnitude` is the torch radius in tiles
    /// or the bless stat bonus; zero picks the default.
    pub fn apply(&mut self, effect: UtilityEffect, frames: u32, magnitude: i32) {
        self.timer_mut(effect).start(frames);
        match effect {
            UtilityEffect::TorchLight => {
                self.torch_radius = if magnitude > 0 {
                    magnitude as f32
                } else {
                    TORCH_DEFAULT_RADIUS
                };
            }
            UtilityEffect::Bless => {
                self.bless_bonus = if magnitude > 0 {
                    magnitude
                } else {
                    BLESS_DEFAULT_BONUS
                };
            }
            _ => {}
        }
        self.sync_status(effect);
    }

    /// End an effect on the next tick. The status entry goes at once.
    /// No-op when already inactive.
    pub fn dispel(&mut self, effect: UtilityEffect) {
        let timer = self.timer_mut(effect);
        if timer.active {
            timer.duration = 0;
            self.sync_status(effect);
        }
    }

    /// Stat bonus currently granted by bless
    pub fn stat_bonus(&self) -> i32 {
        if self.bless.active {
            self.bless_bonus
        } else {
            0
        }
    }

    /// Advance every active effect by one frame. Returns the effects that
    /// expired this frame, in declaration order.
    pub fn tick(&mut self) -> Vec<UtilityEffect> {
        let mut expired = Vec::new();
        for effect in UtilityEffect::ALL {
            let timer = self.timer_mut(effect);
            if !timer.active {
                continue;
            }
            timer.duration = timer.duration.saturating_sub(1);
            if timer.duration == 0 {
                timer.active = false;
                timer.max_duration = 0;
                self.clear_side_state(effect);
                expired.push(effect);
            }
            self.sync_status(effect);
        }
        expired
    }

    fn clear_side_state(&mut self, effect: UtilityEffect) {
        match effect {
            UtilityEffect::Bless => self.bless_bonus = 0,
            UtilityEffect::TorchLight => self.torch_radius = TORCH_DEFAULT_RADIUS,
            _ => {}
        }
    }

    fn sync_status(&mut self, effect: UtilityEffect) {
        let timer = *self.timer(effect);
        if timer.active && timer.duration > 0 {
            self.status.insert(
                effect,
                UtilityStatus {
                    icon: effect.icon(),
                    remaining: timer.duration,
                    max: timer.max_duration,
                },
            );
        } else {
            self.status.remove(&effect);
        }
    }

    /// Re-derive status entries from the timers (after restore)
    pub fn rebuild_status(&mut self) {
        self.status.clear();
        for effect in UtilityEffect::ALL {
            self.sync_status(effect);
        }
    }

    pub fn status(&self) -> &BTreeMap<UtilityEffect, UtilityStatus> {
        &self.status
    }

    /// Status entries keyed by spell id, for the status bar
    pub fn status_by_id(&self) -> BTreeMap<&'static str, &UtilityStatus> {
        self.status.iter().map(|(e, s)| (e.id(), s)).collect()
    }
}
