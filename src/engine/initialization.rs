//! Game bootstrap: configuration, catalogs and the first game state.

use std::sync::Arc;

use crate::catalog::Catalogs;
use crate::config::GameConfig;
use crate::error::CatalogError;

use super::Game;

/// Load and cross-check every definition catalog under `assets_dir`
pub fn load_catalogs(config: &GameConfig) -> Result<Arc<Catalogs>, CatalogError> {
    puffin::profile_function!();
    let catalogs = Catalogs::load_dir(&config.assets_dir)?;
    for key in [&config.starting_map, &config.underwater_map] {
        if !catalogs.maps.contains(key) {
            log::warn!("Configured map '{key}' is not in {}", config.assets_dir.display());
        }
    }
    Ok(Arc::new(catalogs))
}

/// A new game from a config: catalogs loaded, party built from the roster,
/// every catalog map loaded with the starting map current.
pub fn start_game(config: GameConfig) -> Result<Game, CatalogError> {
    let catalogs = load_catalogs(&config)?;
    let game = Game::new(config, catalogs)?;
    log::info!(
        "Party of {} enters '{}'",
        game.state().party.len(),
        game.state().maps.current_key()
    );
    Ok(game)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            assets_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"),
            seed: Some(3),
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_start_game_from_shipped_assets() {
        let game = start_game(config()).unwrap();
        assert_eq!(game.state().maps.current_key(), "forest");
        assert_eq!(game.state().party.len(), 4);
        assert_eq!(game.state().party.gold, 200);
        assert!(game.state().maps.contains("lake_bottom"));
    }

    #[test]
    fn test_missing_assets_dir_is_an_io_error() {
        let mut config = config();
        config.assets_dir = Path::new("no/such/dir").to_path_buf();
        assert!(matches!(start_game(config), Err(CatalogError::Io { .. })));
    }
}
