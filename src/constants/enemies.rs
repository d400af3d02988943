//! Monster AI and spawning constants.

/// Same-type monsters within this many tiles wake up when a pack member is hit (turn-based)
pub const PACK_ENGAGE_RADIUS_TILES: f32 = 6.0;
/// Frames a pursuing monster keeps searching after losing sight
pub const LOST_SIGHT_TIMEOUT_FRAMES: u32 = 180;
/// Chance per frame (percent) that an idle monster starts wandering
pub const IDLE_WANDER_CHANCE: u32 = 2;
/// Frames a wander leg lasts
pub const WANDER_DURATION_FRAMES: u32 = 90;
/// Wander speed relative to the monster's pursuit speed
pub const WANDER_SPEED_FACTOR: f32 = 0.4;
/// Default attack cooldown when a definition omits it
pub const DEFAULT_ATTACK_COOLDOWN_FRAMES: u32 = 90;

/// Placement attempts per encounter monster before giving up
pub const ENCOUNTER_SPAWN_ATTEMPTS: u32 = 15;
/// Encounter monsters appear this many tiles away from the NPC
pub const ENCOUNTER_SPAWN_MIN_TILES: f32 = 3.0;
pub const ENCOUNTER_SPAWN_MAX_TILES: f32 = 5.0;
