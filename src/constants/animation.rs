//! Visual-only timers (slash swings, damage blink).

/// Frames a melee slash visual stays on screen
pub const SLASH_EFFECT_FRAMES: u32 = 12;
/// Frames a party portrait blinks after taking damage
pub const DAMAGE_BLINK_FRAMES: u32 = 20;
