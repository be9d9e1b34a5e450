//! Local leaderboard of finished hunts
//!
//! Fastest completion first, top 10, persisted beside the progress record.

use serde::{Deserialize, Serialize};

use crate::platform::Storage;

/// Maximum number of entries to keep
pub const MAX_ENTRIES: usize = 10;

/// A finished hunt. Also the row shape of the remote leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardEntry {
    pub team_id: String,
    /// Start to finish (ms)
    pub completion_ms: u64,
    pub checkpoints: u8,
    pub keys: u8,
    /// Unix timestamp (ms) when finished
    pub finished_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "lostLootLeaderboard";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a completion time makes the board
    pub fn qualifies(&self, completion_ms: u64) -> bool {
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries
            .last()
            .is_none_or(|e| completion_ms < e.completion_ms)
    }

    /// Rank a time would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, completion_ms: u64) -> Option<usize> {
        if !self.qualifies(completion_ms) {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| completion_ms < e.completion_ms);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a finished hunt; returns the rank achieved (1-indexed).
    /// Ties keep the earlier finisher ahead.
    pub fn record(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.completion_ms)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fastest(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn load<S: Storage>(storage: &S) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Leaderboard>(&json) {
                Ok(board) => {
                    log::info!("Loaded {} leaderboard entries", board.entries.len());
                    return board;
                }
                Err(e) => log::warn!("Saved leaderboard corrupt ({}), starting fresh", e),
            },
            Ok(None) => log::info!("No leaderboard found, starting fresh"),
            Err(e) => log::warn!("Failed to read leaderboard: {}", e),
        }
        Self::new()
    }

    pub fn save<S: Storage>(&self, storage: &mut S) {
        match serde_json::to_string(self) {
            Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Leaderboard saved ({} entries)", self.entries.len()),
                Err(e) => log::error!("Failed to save leaderboard: {}", e),
            },
            Err(e) => log::error!("Failed to encode leaderboard: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    fn entry(team: &str, ms: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            team_id: team.to_string(),
            completion_ms: ms,
            checkpoints: 8,
            keys: 3,
            finished_at: 0,
        }
    }

    #[test]
    fn test_sorted_fastest_first() {
        let mut board = Leaderboard::new();
        assert_eq!(board.record(entry("SLOW", 900_000)), Some(1));
        assert_eq!(board.record(entry("FAST", 300_000)), Some(1));
        assert_eq!(board.record(entry("MID", 600_000)), Some(2));
        let teams: Vec<&str> = board.entries.iter().map(|e| e.team_id.as_str()).collect();
        assert_eq!(teams, vec!["FAST", "MID", "SLOW"]);
        assert_eq!(board.fastest().unwrap().team_id, "FAST");
    }

    #[test]
    fn test_ties_keep_earlier_finisher_ahead() {
        let mut board = Leaderboard::new();
        board.record(entry("FIRST", 500_000));
        assert_eq!(board.record(entry("SECOND", 500_000)), Some(2));
    }

    #[test]
    fn test_capped_at_max_entries() {
        let mut board = Leaderboard::new();
        for i in 0..MAX_ENTRIES as u64 {
            board.record(entry("CREW", 100_000 + i * 1_000));
        }
        assert!(!board.qualifies(200_000));
        assert_eq!(board.record(entry("LATE", 200_000)), None);
        assert_eq!(board.potential_rank(50_000), Some(1));
        board.record(entry("QUICK", 50_000));
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.entries.last().unwrap().completion_ms, 108_000);
    }

    #[test]
    fn test_persists_through_storage() {
        let mut storage = MemoryStorage::new();
        let mut board = Leaderboard::load(&storage);
        assert!(board.is_empty());
        board.record(entry("ABC123", 1_234_000));
        board.save(&mut storage);
        assert_eq!(Leaderboard::load(&storage), board);

        storage
            .set_item(Leaderboard::STORAGE_KEY, "[broken")
            .unwrap();
        assert!(Leaderboard::load(&storage).is_empty());
    }
}
