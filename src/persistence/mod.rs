//! High-score persistence hook
//!
//! The scoring system reads the best score once at startup and writes it back
//! whenever it is beaten. Where it lives is up to the [`HighScoreStore`]:
//! - [`MemoryStore`]: process lifetime only (default)
//! - [`JsonFileStore`]: small JSON document on disk

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

pub trait HighScoreStore {
    fn load_high_score(&mut self) -> SimResult<u64>;

    fn save_high_score(&mut self, score: u64) -> SimResult<()>;
}

/// Keeps the high score in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    high_score: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(high_score: u64) -> Self {
        Self { high_score }
    }
}

impl HighScoreStore for MemoryStore {
    fn load_high_score(&mut self) -> SimResult<u64> {
        Ok(self.high_score)
    }

    fn save_high_score(&mut self, score: u64) -> SimResult<()> {
        self.high_score = score;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u64,
}

/// Stores the high score as `{"high_score": N}` at a fixed path.
///
/// A missing file reads as zero.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn load_high_score(&mut self) -> SimResult<u64> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SimError::io(&self.path, e)),
        };
        let file: HighScoreFile = serde_json::from_str(&json)?;
        Ok(file.high_score)
    }

    fn save_high_score(&mut self, score: u64) -> SimResult<()> {
        let json = serde_json::to_string(&HighScoreFile { high_score: score })?;
        std::fs::write(&self.path, json).map_err(|e| SimError::io(&self.path, e))?;
        log::debug!("High score {} saved to {}", score, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("starshard-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::with_score(40);
        assert_eq!(store.load_high_score().unwrap(), 40);
        store.save_high_score(90).unwrap();
        assert_eq!(store.load_high_score().unwrap(), 90);
    }

    #[test]
    fn test_json_store_round_trip() {
        let path = temp_path("round-trip");
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.load_high_score().unwrap(), 0);

        store.save_high_score(1234).unwrap();
        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_high_score().unwrap(), 1234);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load_high_score(), Err(SimError::Json(_))));
        let _ = std::fs::remove_file(&path);
    }
}
