//! Frame timing and turn scheduling constants.

/// Simulation frames per second
pub const TICKS_PER_SECOND: u32 = 60;

/// Action cooldown anchors: Speed 5 waits 60 frames, Speed 50 waits 30 frames
pub const COOLDOWN_ANCHOR_LOW_SPEED: i32 = 5;
pub const COOLDOWN_ANCHOR_LOW_FRAMES: i32 = 60;
pub const COOLDOWN_ANCHOR_HIGH_SPEED: i32 = 50;
pub const COOLDOWN_ANCHOR_HIGH_FRAMES: i32 = 30;
/// Action cooldown clamp
pub const MIN_ACTION_COOLDOWN_FRAMES: u32 = 15;
pub const MAX_ACTION_COOLDOWN_FRAMES: u32 = 90;

/// Actions the party may take in one turn-based Party turn
pub const PARTY_ACTIONS_PER_TURN: u8 = 2;
/// Debounce between discrete 90-degree turns (frames)
pub const ROTATION_COOLDOWN_FRAMES: u32 = 18;
/// Debounce between turn-based grid steps (0.3 s)
pub const MOVEMENT_COOLDOWN_FRAMES: u32 = 18;

/// Real-time spell point regeneration interval (frames)
pub const SP_REGEN_INTERVAL_FRAMES: u32 = 300;
