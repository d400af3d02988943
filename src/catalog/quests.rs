use serde::Deserialize;

use super::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Kill,
    Encounter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestRewards {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapMarker {
    pub map: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: QuestKind,
    /// Species counted by kill quests
    #[serde(default)]
    pub target_species: Option<String>,
    #[serde(default = "default_target_count")]
    pub target_count: u32,
    #[serde(default)]
    pub rewards: QuestRewards,
    #[serde(default)]
    pub map_marker: Option<MapMarker>,
}

fn default_target_count() -> u32 {
    1
}

impl Keyed for QuestDef {
    const CATALOG: &'static str = "quest";

    fn key(&self) -> &str {
        &self.id
    }
}
