//! Error types shared across the simulation.

use thiserror::Error;

/// Errors raised while loading definition catalogs and maps.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("Failed to read '{path}': {details}")]
    Io { path: String, details: String },

    /// YAML parsing failed.
    #[error("Parse error in '{path}': {details}")]
    Parse { path: String, details: String },

    /// A definition referenced a key that no catalog provides.
    #[error("Missing {catalog} definition '{key}'")]
    MissingKey { catalog: &'static str, key: String },

    /// Map data is inconsistent (rows, legend characters, endpoints).
    #[error("Invalid map '{map}': {details}")]
    InvalidMap { map: String, details: String },
}

impl CatalogError {
    pub fn missing(catalog: &'static str, key: impl Into<String>) -> Self {
        CatalogError::MissingKey {
            catalog,
            key: key.into(),
        }
    }
}

/// Errors raised while reading the game configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {details}")]
    Io { path: String, details: String },

    #[error("Config parse error in '{path}': {details}")]
    Parse { path: String, details: String },
}

/// Save/restore errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save slot {0} is empty")]
    NotFound(u8),

    #[error("Save slot {0} is out of range")]
    InvalidSlot(u8),

    #[error("Save references unknown {catalog} '{key}'")]
    UnknownDefinition { catalog: &'static str, key: String },

    #[error("Save references unknown map '{0}'")]
    UnknownMap(String),
}

impl From<CatalogError> for SaveError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingKey { catalog, key } => SaveError::UnknownDefinition { catalog, key },
            CatalogError::InvalidMap { map, .. } => SaveError::UnknownMap(map),
            other => SaveError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}

/// Structured refusal for an action that cannot be carried out.
///
/// A refusal never mutates game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionRefusal {
    #[error("{name} cannot act")]
    Incapacitated { name: String },

    #[error("Not enough spell points ({have}/{needed})")]
    NotEnoughSpellPoints { needed: i32, have: i32 },

    #[error("{name} does not know {spell}")]
    SpellNotKnown { name: String, spell: String },

    #[error("{name} already knows {spell}")]
    SpellAlreadyKnown { name: String, spell: String },

    #[error("Unknown spell {0}")]
    UnknownSpell(String),

    #[error("{item} cannot be equipped there")]
    IncompatibleSlot { item: String },

    #[error("Nothing equipped there")]
    EmptySlot,

    #[error("Rewards for {0} were already claimed")]
    RewardAlreadyClaimed(String),

    #[error("Quest {0} is not completed")]
    QuestNotCompleted(String),

    #[error("Unknown quest {0}")]
    UnknownQuest(String),

    #[error("Not enough gold ({have}/{needed})")]
    NotEnoughGold { needed: u32, have: u32 },

    #[error("{0} is a quest item")]
    QuestItem(String),

    #[error("No actions left this turn")]
    NoActionsLeft,

    #[error("It is not the party's turn")]
    NotPartyTurn,

    #[error("Still recovering")]
    OnCooldown,

    #[error("Invalid selection")]
    InvalidIndex,

    #[error("No free stat points")]
    NoStatPoints,

    #[error("Stat is already at its maximum")]
    StatAtMaximum,

    #[error("No food left")]
    NoFood,

    #[error("Cannot rest with enemies nearby")]
    EnemiesNearby,

    #[error("Nobody to talk to")]
    NoNpc,

    #[error("No level-up choice is open")]
    NoLevelUpOpen,

    #[error("{0} cannot be used")]
    NotUsable(String),
}
