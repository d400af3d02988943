//! UI-facing constants (click buffer, logs, high scores).

/// Clicks older than this are discarded; also the double-click window
pub const CLICK_WINDOW_MS: u64 = 700;
/// Maximum queued clicks per mouse button
pub const CLICK_QUEUE_CAPACITY: usize = 16;
/// Combat log lines kept
pub const COMBAT_LOG_CAPACITY: usize = 50;
/// Entries kept in the high-score table
pub const HIGH_SCORE_LIMIT: usize = 10;
/// Glyphs of a player name shown in the high-score table
pub const HIGH_SCORE_NAME_GLYPHS: usize = 14;
/// Number of save slots
pub const SAVE_SLOT_COUNT: u8 = 5;
