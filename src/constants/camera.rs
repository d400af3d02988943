//! Camera-related constants.

/// Default horizontal field of view (radians)
pub const CAMERA_DEFAULT_FOV: f32 = std::f32::consts::FRAC_PI_3;
/// Default view distance in tiles
pub const CAMERA_VIEW_DISTANCE_TILES: f32 = 16.0;
