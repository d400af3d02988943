//! High score table, kept in `save_dir/highscores.json`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{HIGH_SCORE_LIMIT, HIGH_SCORE_NAME_GLYPHS};
use crate::error::SaveError;
use crate::party::Party;

use super::Game;

pub const HIGH_SCORE_FILE: &str = "highscores.json";

/// Total party experience plus gold plus 100 per average level
pub fn score(party: &Party) -> u64 {
    u64::from(party.total_experience()) + u64::from(party.gold) + 100 * u64::from(party.average_level())
}

/// `HH:MM:SS`, hours may exceed 24
pub fn format_played(played_ns: u64) -> String {
    let secs = played_ns / 1_000_000_000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Cut a name to what the table can show
pub fn display_name(name: &str) -> String {
    name.chars().take(HIGH_SCORE_NAME_GLYPHS).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    pub average_level: u32,
    /// Played time as `HH:MM:SS`
    pub played: String,
    /// Local date the run was recorded, `YYYY-MM-DD`
    pub date: String,
}

impl HighScoreEntry {
    pub fn new(name: &str, party: &Party, played_ns: u64) -> Self {
        Self {
            name: display_name(name),
            score: score(party),
            average_level: party.average_level(),
            played: format_played(played_ns),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn path(save_dir: &Path) -> PathBuf {
        save_dir.join(HIGH_SCORE_FILE)
    }

    /// Read the table. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, SaveError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut table: Self = serde_json::from_reader(reader)?;
        table.entries.sort_by(|a, b| b.score.cmp(&a.score));
        table.entries.truncate(HIGH_SCORE_LIMIT);
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Insert in descending score order, ties after earlier entries.
    /// Returns the 0-based rank, or None if the entry did not make the table.
    pub fn record(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|e| e.score < entry.score)
            .unwrap_or(self.entries.len());
        if rank >= HIGH_SCORE_LIMIT {
            return None;
        }
        self.entries.insert(rank, entry);
        self.entries.truncate(HIGH_SCORE_LIMIT);
        Some(rank)
    }

    pub fn qualifies(&self, score: u64) -> bool {
        self.entries.len() < HIGH_SCORE_LIMIT || self.entries.last().is_some_and(|e| e.score < score)
    }
}

impl Game {
    pub fn score(&self) -> u64 {
        score(&self.state.party)
    }

    /// Record the current run under `name` in the table on disk
    pub fn record_high_score(&self, name: &str) -> Result<Option<usize>, SaveError> {
        let path = HighScores::path(&self.config.save_dir);
        let mut table = HighScores::load(&path)?;
        let rank = table.record(HighScoreEntry::new(name, &self.state.party, self.played_ns()));
        if rank.is_some() {
            table.save(&path)?;
            log::info!("High score recorded at rank {:?}", rank.map(|r| r + 1));
        }
        Ok(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_string(),
            score,
            average_level: 1,
            played: "00:00:00".to_string(),
            date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_record_keeps_descending_order() {
        let mut table = HighScores::default();
        table.record(entry("a", 100));
        table.record(entry("b", 300));
        assert_eq!(table.record(entry("c", 200)), Some(1));
        let scores: Vec<u64> = table.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
    }

    #[test]
    fn test_table_truncates_to_limit() {
        let mut table = HighScores::default();
        for i in 0..HIGH_SCORE_LIMIT as u64 {
            table.record(entry("x", 100 + i));
        }
        assert!(!table.qualifies(50));
        assert_eq!(table.record(entry("low", 50)), None);
        assert_eq!(table.record(entry("top", 1000)), Some(0));
        assert_eq!(table.entries.len(), HIGH_SCORE_LIMIT);
        assert_eq!(table.entries.last().unwrap().score, 101);
    }

    #[test]
    fn test_played_time_format() {
        assert_eq!(format_played(0), "00:00:00");
        assert_eq!(format_played(3_723 * 1_000_000_000), "01:02:03");
        assert_eq!(format_played(90_000 * 1_000_000_000), "25:00:00");
    }

    #[test]
    fn test_long_names_are_cut() {
        assert_eq!(display_name("Bartholomew the Bold"), "Bartholomew th");
        assert_eq!(display_name("Åsa"), "Åsa");
    }

    #[test]
    fn test_score_formula() {
        let mut party = Party::new(vec![crate::party::test_character("Ayla")]);
        party.gold = 50;
        let expected = u64::from(party.total_experience()) + 50 + 100 * u64::from(party.average_level());
        assert_eq!(score(&party), expected);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("party-crawler-scores-{}", std::process::id()));
        let path = HighScores::path(&dir);
        let mut table = HighScores::default();
        table.record(entry("Ayla", 420));
        table.save(&path).unwrap();
        assert_eq!(HighScores::load(&path).unwrap(), table);
        let _ = fs::remove_dir_all(&dir);
    }
}
