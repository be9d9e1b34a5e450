//! Load/save of the progression record

use crate::error::StorageCorruption;
use crate::platform::Storage;
use crate::progression::ProgressionRecord;

/// Storage key for the progression record
pub const STORAGE_KEY: &str = "lostLootGameState";

/// Persistence adapter for the progression record
#[derive(Debug, Clone)]
pub struct ProgressStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> ProgressStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Parse and validate a stored record
    pub fn decode(json: &str) -> Result<ProgressionRecord, StorageCorruption> {
        let record: ProgressionRecord =
            serde_json::from_str(json).map_err(|e| StorageCorruption::Parse(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Load the stored record.
    ///
    /// Missing or unreadable storage yields a fresh record. A corrupt record
    /// is logged, replaced by a fresh record, and the fresh record persisted.
    pub fn load(&mut self) -> ProgressionRecord {
        let json = match self.storage.get_item(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No saved progress, starting fresh");
                return ProgressionRecord::default();
            }
            Err(e) => {
                log::warn!("Failed to read saved progress: {}", e);
                return ProgressionRecord::default();
            }
        };

        match Self::decode(&json) {
            Ok(record) => {
                log::info!(
                    "Loaded progress: {} checkpoints, {} keys",
                    record.completed_checkpoints().len(),
                    record.collected_keys().len()
                );
                record
            }
            Err(e) => {
                log::warn!("Saved progress corrupt ({}), resetting", e);
                let fresh = ProgressionRecord::default();
                self.save(&fresh);
                fresh
            }
        }
    }

    /// Persist the record. Failures are logged, not surfaced.
    pub fn save(&mut self, record: &ProgressionRecord) {
        match serde_json::to_string(record) {
            Ok(json) => {
                if let Err(e) = self.storage.set_item(&self.key, &json) {
                    log::error!("Failed to save progress: {}", e);
                }
            }
            Err(e) => log::error!("Failed to encode progress: {}", e),
        }
    }

    /// Remove the stored record entirely
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.remove_item(&self.key) {
            log::error!("Failed to clear progress: {}", e);
        }
    }
}
