//! Utility spell and world effect parameters.

/// Default torch light radius (tiles) when a spell does not override it
pub const TORCH_DEFAULT_RADIUS: f32 = 4.0;
/// Default bless bonus when a spell does not override it
pub const BLESS_DEFAULT_BONUS: i32 = 5;

/// Milliseconds a teleporter stays inert after being used
pub const TELEPORTER_COOLDOWN_MS: u64 = 2_000;

/// Search radius (tiles) the underwater return starts with
pub const RETURN_SEARCH_START_RADIUS: i32 = 1;
