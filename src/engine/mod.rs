//! Game engine - owns all game state and provides a clean API to the application shell.
//!
//! The engine handles:
//! - Game state (party, maps, scheduler, quests, collision)
//! - Input processing, one batch of intents per frame
//! - Simulation advancement
//! - Side effects triggered by the UI layer (trade, quests, encounters)
//! - Save slots and the high-score table
//!
//! The application shell (main.rs) only handles:
//! - Turning device input into intents
//! - Running the frame loop
//! - Drawing what `snapshot()` returns

pub mod game_state;
pub mod highscores;
pub mod initialization;
mod interaction;
pub mod metrics;
mod party_actions;
pub mod save;
#[cfg(test)]
mod scenarios;
mod simulation;
pub mod snapshot;
mod travel;

pub use game_state::GameState;
pub use highscores::{HighScoreEntry, HighScores};
pub use interaction::Dialog;
pub use metrics::FrameMetrics;
pub use snapshot::WorldSnapshot;

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::Camera;
use crate::catalog::Catalogs;
use crate::config::GameConfig;
use crate::error::{ActionRefusal, CatalogError};
use crate::events::{CombatLog, EventQueue, GameEvent};
use crate::input::{Click, DoubleClickTracker, Menu, MouseButton, MouseClickBuffer};

/// What the shell should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    ExitRequested,
}

/// Overlay and menu flags the UI layer reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub menu: Option<Menu>,
    pub main_menu: bool,
    pub map_overlay: bool,
    pub dialog: Option<Dialog>,
}

impl UiState {
    /// Whether a modal layer is up and movement keys should be ignored
    pub fn is_modal(&self) -> bool {
        self.menu.is_some() || self.main_menu || self.dialog.is_some()
    }
}

/// The game: state plus everything needed to advance it
pub struct Game {
    state: GameState,
    catalogs: Arc<Catalogs>,
    config: GameConfig,
    rng: StdRng,
    events: EventQueue,
    log: CombatLog,
    clicks: MouseClickBuffer,
    double_clicks: DoubleClickTracker,
    ui: UiState,
    metrics: FrameMetrics,
    /// Shifted backward on restore so played time stays continuous
    session_start: Instant,
    /// Tile the party stood on last frame, for step-on triggers
    last_tile: (i32, i32),
    now_ms: u64,
}

impl Game {
    /// New game. Seeded from the config when it names a seed.
    pub fn new(config: GameConfig, catalogs: Arc<Catalogs>) -> Result<Self, CatalogError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = GameState::new(&config, &catalogs)?;
        Ok(Self::assemble(config, catalogs, state, rng))
    }

    /// New game with a fixed random seed
    pub fn with_seed(config: GameConfig, catalogs: Arc<Catalogs>, seed: u64) -> Result<Self, CatalogError> {
        let state = GameState::new(&config, &catalogs)?;
        Ok(Self::assemble(config, catalogs, state, StdRng::seed_from_u64(seed)))
    }

    /// Game around a hand-built state
    pub fn from_state(config: GameConfig, catalogs: Arc<Catalogs>, state: GameState, seed: u64) -> Self {
        Self::assemble(config, catalogs, state, StdRng::seed_from_u64(seed))
    }

    fn assemble(config: GameConfig, catalogs: Arc<Catalogs>, state: GameState, rng: StdRng) -> Self {
        let last_tile = state.camera.tile();
        Self {
            state,
            catalogs,
            config,
            rng,
            events: EventQueue::new(),
            log: CombatLog::default(),
            clicks: MouseClickBuffer::default(),
            double_clicks: DoubleClickTracker::default(),
            ui: UiState::default(),
            metrics: FrameMetrics::default(),
            session_start: Instant::now(),
            last_tile,
            now_ms: 0,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for tools and tests
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn combat_log(&self) -> &CombatLog {
        &self.log
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    pub fn pending_events(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Total played time of this game, including time restored from a save
    pub fn played_ns(&self) -> u64 {
        u64::try_from(self.session_start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn set_played_ns(&mut self, played_ns: u64) {
        let now = Instant::now();
        self.session_start = now
            .checked_sub(Duration::from_nanos(played_ns))
            .unwrap_or(now);
    }

    /// Put the party somewhere on the current map
    pub fn set_camera(&mut self, position: Vec2, angle: f32) {
        self.state.place_party(position);
        self.state.camera.set_angle(angle);
        self.last_tile = self.state.camera.tile();
    }

    pub fn camera(&self) -> &Camera {
        &self.state.camera
    }

    // =========================================================================
    // MOUSE
    // =========================================================================

    /// Pop the oldest pending left click inside a rectangle
    pub fn consume_left_click_in(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Click> {
        self.clicks.consume_left_click_in(x1, y1, x2, y2)
    }

    pub fn consume_click_in(&mut self, button: MouseButton, x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Click> {
        self.clicks.consume_click_in(button, x1, y1, x2, y2)
    }

    /// Feed a consumed click to the double-click detector
    pub fn register_click_on(&mut self, target: &str, click: &Click) -> bool {
        self.double_clicks.register(target, click.button, click.time_ms)
    }

    // =========================================================================
    // REFUSALS
    // =========================================================================

    /// Report a refused action in the combat log. Incapacitated actors are
    /// ignored silently.
    fn refuse<T>(&mut self, result: Result<T, ActionRefusal>) -> Result<T, ActionRefusal> {
        if let Err(refusal) = &result {
            if !matches!(refusal, ActionRefusal::Incapacitated { .. }) {
                self.log.push(refusal.to_string());
            }
        }
        result
    }
}
