//! Simulation kernel of a grid-based, first-person party RPG.
//!
//! A party of adventurers explores tile maps, fights monsters in real-time
//! or turn-based mode, casts spells, levels up and saves to slots. The
//! `engine::Game` type owns everything; a shell feeds it one `FrameInput`
//! per frame and draws what `Game::snapshot()` returns.

pub mod camera;
pub mod catalog;
pub mod collision;
pub mod components;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod input;
pub mod level_up;
pub mod map;
pub mod map_manager;
pub mod party;
pub mod quests;
pub mod spawning;
pub mod systems;
pub mod tile;
pub mod time_system;

pub use config::GameConfig;
pub use engine::{Game, GameState, LoopControl};
pub use input::{FrameInput, Intent};
