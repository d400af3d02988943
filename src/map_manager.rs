//! Loaded maps, the current map key and the global teleporter registry.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalogs;
use crate::constants::TELEPORTER_COOLDOWN_MS;
use crate::error::CatalogError;
use crate::map::GameMap;
use crate::tile::TeleporterKind;

/// One teleporter tile somewhere in the loaded world
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Endpoint {
    pub map: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TeleporterRegistry {
    endpoints: BTreeMap<TeleporterKind, Vec<Endpoint>>,
    last_teleport_ms: Option<u64>,
}

impl TeleporterRegistry {
    pub fn register(&mut self, kind: TeleporterKind, map: &str, x: i32, y: i32) {
        let endpoint = Endpoint {
            map: map.to_string(),
            x,
            y,
        };
        let list = self.endpoints.entry(kind).or_default();
        if !list.contains(&endpoint) {
            list.push(endpoint);
        }
    }

    pub fn endpoints(&self, kind: TeleporterKind) -> &[Endpoint] {
        self.endpoints.get(&kind).map_or(&[], |v| v.as_slice())
    }

    /// Whether the global cooldown has elapsed
    pub fn ready(&self, now_ms: u64) -> bool {
        self.last_teleport_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= TELEPORTER_COOLDOWN_MS)
    }

    /// Pick a random other endpoint of the same colour and start the
    /// cooldown. None while cooling down or with fewer than two endpoints.
    pub fn choose_destination(
        &mut self,
        kind: TeleporterKind,
        from: &Endpoint,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> Option<Endpoint> {
        if !self.ready(now_ms) {
            return None;
        }
        let candidates: Vec<&Endpoint> = self.endpoints(kind).iter().filter(|e| *e != from).collect();
        if self.endpoints(kind).len() < 2 || candidates.is_empty() {
            log::warn!("Teleporter {:?} has no partner endpoint", kind);
            return None;
        }
        let destination = candidates.choose(rng).map(|e| (*e).clone())?;
        self.last_teleport_ms = Some(now_ms);
        Some(destination)
    }
}

pub struct MapManager {
    maps: BTreeMap<String, GameMap>,
    current: String,
    pub teleporters: TeleporterRegistry,
}

impl MapManager {
    /// Manager holding a single map, which becomes current
    pub fn new(initial: GameMap) -> Self {
        let current = initial.key.clone();
        let mut manager = Self {
            maps: BTreeMap::new(),
            current,
            teleporters: TeleporterRegistry::default(),
        };
        manager.insert(initial);
        manager
    }

    /// Load every catalog map and start on `starting_map`
    pub fn load_all(catalogs: &Catalogs, starting_map: &str) -> Result<Self, CatalogError> {
        let first = catalogs.maps.get(starting_map)?;
        let mut manager = Self::new(GameMap::from_def(first, catalogs)?);
        for def in catalogs.maps.iter().filter(|d| d.key != starting_map) {
            manager.insert(GameMap::from_def(def, catalogs)?);
        }
        Ok(manager)
    }

    /// Add a map and register its teleporters
    pub fn insert(&mut self, map: GameMap) {
        for (kind, x, y) in map.teleporter_tiles() {
            self.teleporters.register(kind, &map.key, x, y);
        }
        self.maps.insert(map.key.clone(), map);
    }

    pub fn current_key(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &GameMap {
        &self.maps[&self.current]
    }

    pub fn current_mut(&mut self) -> &mut GameMap {
        self.maps
            .get_mut(&self.current)
            .unwrap_or_else(|| unreachable!("current map is always loaded"))
    }

    pub fn get(&self, key: &str) -> Option<&GameMap> {
        self.maps.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut GameMap> {
        self.maps.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.maps.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(|k| k.as_str())
    }

    pub fn maps(&self) -> impl Iterator<Item = &GameMap> {
        self.maps.values()
    }

    pub fn maps_mut(&mut self) -> impl Iterator<Item = &mut GameMap> {
        self.maps.values_mut()
    }

    /// Make `key` current. Unknown keys are logged and ignored.
    pub fn switch_to(&mut self, key: &str) -> bool {
        if !self.maps.contains_key(key) {
            log::warn!("Ignoring switch to unknown map '{key}'");
            return false;
        }
        if self.current != key {
            log::info!("Switching map {} -> {}", self.current, key);
            self.current = key.to_string();
        }
        true
    }
}
