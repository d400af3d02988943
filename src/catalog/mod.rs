//! Immutable definition catalogs loaded from YAML at startup.
//!
//! Every catalog is a keyed table of plain data definitions. Catalogs are
//! built once, wrapped in an `Arc` and shared read-only by the simulation.

mod classes;
mod items;
mod maps;
mod monsters;
mod quests;
mod spells;
mod tiles;
mod weapons;

pub use classes::{ClassDef, LevelChoice, LevelChoiceOption, StartingSchool};
pub use items::ItemCatalogExt;
pub use maps::{
    EncounterDef, EncounterMonsterDef, EncounterRewardsDef, MapDef, MapMonsterDef, NpcDef, NpcKind,
    StartDef,
};
pub use monsters::MonsterDef;
pub use quests::{MapMarker, QuestDef, QuestKind, QuestRewards};
pub use spells::{SpellDef, SpellEffect, UtilityEffect};
pub use tiles::{TileCatalog, TileDef};
pub use weapons::WeaponDef;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CatalogError;
use crate::party::Item;

/// A definition that is looked up by string key
pub trait Keyed {
    /// Catalog name used in error messages
    const CATALOG: &'static str;
    fn key(&self) -> &str;
}

/// Keyed table of definitions of one kind
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    defs: BTreeMap<String, T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            defs: BTreeMap::new(),
        }
    }
}

impl<T: Keyed + DeserializeOwned> Catalog<T> {
    /// Parse a YAML list of definitions
    pub fn from_yaml(source: &str, path: &str) -> Result<Self, CatalogError> {
        let list: Vec<T> = serde_yaml::from_str(source).map_err(|err| CatalogError::Parse {
            path: path.to_string(),
            details: err.to_string(),
        })?;
        Ok(Self::from_defs(list))
    }
}

impl<T: Keyed> Catalog<T> {
    pub fn from_defs(defs: impl IntoIterator<Item = T>) -> Self {
        Self {
            defs: defs
                .into_iter()
                .map(|def| (def.key().to_string(), def))
                .collect(),
        }
    }

    /// Look up a definition, failing with a message naming the missing key
    pub fn get(&self, key: &str) -> Result<&T, CatalogError> {
        self.defs
            .get(key)
            .ok_or_else(|| CatalogError::missing(T::CATALOG, key))
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.defs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.defs.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

pub type WeaponCatalog = Catalog<WeaponDef>;
pub type SpellCatalog = Catalog<SpellDef>;
pub type MonsterCatalog = Catalog<MonsterDef>;
pub type ItemCatalog = Catalog<Item>;
pub type ClassCatalog = Catalog<ClassDef>;
pub type QuestCatalog = Catalog<QuestDef>;
pub type MapCatalog = Catalog<MapDef>;

/// Every definition table the simulation reads
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub tiles: TileCatalog,
    pub weapons: WeaponCatalog,
    pub spells: SpellCatalog,
    pub monsters: MonsterCatalog,
    pub items: ItemCatalog,
    pub classes: ClassCatalog,
    pub quests: QuestCatalog,
    pub maps: MapCatalog,
}

impl Catalogs {
    /// Load `tiles.yaml`, `weapons.yaml`, `spells.yaml`, `monsters.yaml`,
    /// `items.yaml`, `classes.yaml`, `quests.yaml` and every `maps/*.yaml`.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let tiles = TileCatalog::from_yaml(&read(dir, "tiles.yaml")?, "tiles.yaml")?;
        let weapons = Catalog::from_yaml(&read(dir, "weapons.yaml")?, "weapons.yaml")?;
        let spells = Catalog::from_yaml(&read(dir, "spells.yaml")?, "spells.yaml")?;
        let monsters = Catalog::from_yaml(&read(dir, "monsters.yaml")?, "monsters.yaml")?;
        let items = Catalog::from_yaml(&read(dir, "items.yaml")?, "items.yaml")?;
        let classes = Catalog::from_yaml(&read(dir, "classes.yaml")?, "classes.yaml")?;
        let quests = Catalog::from_yaml(&read(dir, "quests.yaml")?, "quests.yaml")?;

        let maps_dir = dir.join("maps");
        let mut map_defs = Vec::new();
        let entries = fs::read_dir(&maps_dir).map_err(|err| CatalogError::Io {
            path: maps_dir.display().to_string(),
            details: err.to_string(),
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
            .collect();
        paths.sort();
        for path in paths {
            let display = path.display().to_string();
            let source = fs::read_to_string(&path).map_err(|err| CatalogError::Io {
                path: display.clone(),
                details: err.to_string(),
            })?;
            let def: MapDef = serde_yaml::from_str(&source).map_err(|err| CatalogError::Parse {
                path: display,
                details: err.to_string(),
            })?;
            map_defs.push(def);
        }

        let catalogs = Self {
            tiles,
            weapons,
            spells,
            monsters,
            items,
            classes,
            quests,
            maps: Catalog::from_defs(map_defs),
        };
        catalogs.validate()?;
        log::info!(
            "Loaded catalogs: {} weapons, {} spells, {} monsters, {} items, {} classes, {} quests, {} maps",
            catalogs.weapons.len(),
            catalogs.spells.len(),
            catalogs.monsters.len(),
            catalogs.items.len(),
            catalogs.classes.len(),
            catalogs.quests.len(),
            catalogs.maps.len()
        );
        Ok(catalogs)
    }

    /// Check cross-references so that runtime lookups cannot miss.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for monster in self.monsters.iter() {
            if let Some(weapon) = &monster.projectile_weapon {
                self.weapons.get(weapon)?;
            }
            if let Some(spell) = &monster.projectile_spell {
                self.spells.get(spell)?;
            }
        }
        for item in self.items.iter() {
            if let Some(weapon) = &item.weapon {
                self.weapons.get(weapon)?;
            }
            if let Some(spell) = &item.spell {
                self.spells.get(spell)?;
            }
        }
        for class in self.classes.iter() {
            for key in &class.starting_equipment {
                self.items.get(key)?;
            }
            for school in &class.schools {
                for spell in &school.known_spells {
                    self.spells.get(spell)?;
                }
            }
            for choice in &class.level_choices {
                for option in &choice.options {
                    if let LevelChoiceOption::LearnSpell { spell, .. } = option {
                        self.spells.get(spell)?;
                    }
                }
            }
        }
        for map in self.maps.iter() {
            for monster in &map.monsters {
                self.monsters.get(&monster.species)?;
            }
            for npc in &map.npcs {
                if let Some(encounter) = &npc.encounter {
                    for spec in &encounter.monsters {
                        self.monsters.get(&spec.species)?;
                    }
                }
                for spell in &npc.spells {
                    self.spells.get(spell)?;
                }
                for item in &npc.items {
                    self.items.get(item)?;
                }
            }
        }
        Ok(())
    }
}

fn read(dir: &Path, name: &str) -> Result<String, CatalogError> {
    let path = dir.join(name);
    fs::read_to_string(&path).map_err(|err| CatalogError::Io {
        path: path.display().to_string(),
        details: err.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn shipped() -> Catalogs {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    Catalogs::load_dir(&dir).expect("shipped assets should load")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_catalogs_load_and_validate() {
        let catalogs = shipped();
        assert!(catalogs.weapons.contains("longsword"));
        assert!(catalogs.spells.contains("firebolt"));
        assert!(catalogs.monsters.contains("goblin"));
        assert!(catalogs.maps.contains("forest"));
    }

    #[test]
    fn test_missing_key_names_the_key() {
        let catalogs = shipped();
        let err = catalogs.weapons.get("vorpal_blade").unwrap_err();
        assert_eq!(err.to_string(), "Missing weapon definition 'vorpal_blade'");
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = WeaponCatalog::from_yaml("- key: [", "weapons.yaml").unwrap_err();
        assert!(err.to_string().contains("weapons.yaml"));
    }

    #[test]
    fn test_validate_catches_dangling_monster_spell() {
        let mut catalogs = shipped();
        let mut goblin = catalogs.monsters.get("goblin").unwrap().clone();
        goblin.key = "goblin_mage".to_string();
        goblin.projectile_spell = Some("meteor_swarm".to_string());
        let mut defs: Vec<MonsterDef> = catalogs.monsters.iter().cloned().collect();
        defs.push(goblin);
        catalogs.monsters = Catalog::from_defs(defs);
        assert!(matches!(
            catalogs.validate(),
            Err(CatalogError::MissingKey { catalog: "spell", .. })
        ));
    }
}
