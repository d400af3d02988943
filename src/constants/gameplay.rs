//! Core gameplay constants (world units, party limits, experience).

/// World units per tile edge
pub const TILE_SIZE: f32 = 64.0;
/// Half extent of the party's collision box (world units)
pub const PLAYER_HALF_SIZE: f32 = 16.0;
/// Party walking speed in tiles per second (real-time)
pub const PARTY_MOVE_SPEED_TILES: f32 = 3.0;
/// Party turning speed in radians per second (real-time)
pub const PARTY_TURN_SPEED: f32 = 2.5;
/// Maximum members in a party
pub const MAX_PARTY_SIZE: usize = 4;
/// Maximum value of any base stat
pub const MAX_STAT: i32 = 99;
/// Experience needed for the next level = level * this
pub const XP_PER_LEVEL_MULTIPLIER: u32 = 1000;
/// Distance (tiles) within which the party can talk to an NPC
pub const INTERACT_RANGE_TILES: f32 = 1.6;
