//! Projectile parameters.

/// Arrow speed in tiles per second when a weapon omits it
pub const ARROW_SPEED_TILES: f32 = 12.0;
/// Magic projectile speed in tiles per second when a spell omits it
pub const MAGIC_SPEED_TILES: f32 = 8.0;
/// Frames before a projectile fizzles out
pub const PROJECTILE_LIFETIME_FRAMES: u32 = 180;
/// Half extent of a projectile's collision box (world units)
pub const PROJECTILE_HALF_SIZE: f32 = 6.0;
/// Largest distance a projectile is swept in one sample (world units)
pub const PROJECTILE_SWEEP_STEP: f32 = super::gameplay::TILE_SIZE / 4.0;
