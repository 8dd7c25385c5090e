//! Leaderboard of finished runs
//!
//! Keeps the top 10 runs, sorted by score. Stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Maximum number of runs to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Wave reached
    pub wave: u32,
    /// Seed the run was played with
    pub seed: u64,
    /// Simulated seconds survived
    pub time: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a score would make it onto the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        self.entries.len() < MAX_HIGH_SCORES || self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would get (1-indexed), None if it doesn't qualify
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        self.qualifies(score).then(|| self.insertion_index(score) + 1)
    }

    /// Record a run. Returns the rank achieved (1-indexed).
    ///
    /// Ties rank below the existing entry.
    pub fn add_score(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let index = self.insertion_index(entry.score);
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    fn insertion_index(&self, score: u64) -> usize {
        self.entries.partition_point(|e| e.score >= score)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from a JSON file; a missing file is an empty board
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let scores: HighScores = serde_json::from_str(&json)?;
                log::info!("Loaded {} high scores", scores.entries.len());
                Ok(scores)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                Ok(Self::new())
            }
            Err(e) => Err(SimError::io(path, e)),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SimError::io(path, e))?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Format survived time as `m:ss`
pub fn format_duration(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(score: u64) -> HighScoreEntry {
        HighScoreEntry {
            score,
            wave: 1,
            seed: 0,
            time: 0.0,
        }
    }

    #[test]
    fn test_sorted_insert_and_rank() {
        let mut board = HighScores::new();
        assert_eq!(board.add_score(run(100)), Some(1));
        assert_eq!(board.add_score(run(300)), Some(1));
        assert_eq!(board.add_score(run(200)), Some(2));
        assert_eq!(board.add_score(run(200)), Some(3));
        let scores: Vec<_> = board.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200, 200, 100]);
        assert_eq!(board.top_score(), Some(300));
    }

    #[test]
    fn test_zero_never_qualifies() {
        let mut board = HighScores::new();
        assert_eq!(board.add_score(run(0)), None);
        assert!(board.is_empty());
    }

    #[test]
    fn test_full_board_trims() {
        let mut board = HighScores::new();
        for score in 1..=MAX_HIGH_SCORES as u64 {
            board.add_score(run(score * 10));
        }
        assert!(!board.qualifies(10));
        assert_eq!(board.potential_rank(15), Some(10));
        assert_eq!(board.add_score(run(1000)), Some(1));
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(board.entries.last().unwrap().score, 20);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("starshard-board-{}.json", std::process::id()));
        let mut board = HighScores::new();
        board.add_score(run(42));
        board.save(&path).unwrap();
        let loaded = HighScores::load(&path).unwrap();
        assert_eq!(loaded.entries, board.entries);
        let _ = std::fs::remove_file(&path);

        assert!(HighScores::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_loaded_board_keeps_earlier_runs() {
        let path = std::env::temp_dir().join(format!("starshard-runs-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut first = HighScores::load(&path).unwrap();
        first.add_score(run(50));
        first.save(&path).unwrap();

        let mut second = HighScores::load(&path).unwrap();
        assert_eq!(second.add_score(run(80)), Some(1));
        second.save(&path).unwrap();

        let scores: Vec<_> = HighScores::load(&path).unwrap().entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![80, 50]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(125.7), "2:05");
        assert_eq!(format_duration(-3.0), "0:00");
    }
}
