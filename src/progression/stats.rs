//! Read-only projection of a progression record

use serde::{Deserialize, Serialize};

use super::record::ProgressionRecord;
use crate::consts::{CHECKPOINT_COUNT, KEY_COUNT};

/// Summary sent with `POST /game/end` and shown on the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub team_id: Option<String>,
    /// Milliseconds since session start (0 before start)
    pub elapsed_time: u64,
    pub checkpoints_completed: usize,
    pub total_checkpoints: u8,
    pub keys_collected: usize,
    pub total_keys: u8,
    /// 0-100
    pub completion_percentage: f32,
    pub is_complete: bool,
}

impl GameStats {
    pub fn from_record(record: &ProgressionRecord, now: u64) -> Self {
        let completed = record.completed_checkpoints().len();
        Self {
            team_id: record.team_id().map(str::to_string),
            elapsed_time: record
                .start_time()
                .map(|start| now.saturating_sub(start))
                .unwrap_or(0),
            checkpoints_completed: completed,
            total_checkpoints: CHECKPOINT_COUNT,
            keys_collected: record.collected_keys().len(),
            total_keys: KEY_COUNT,
            completion_percentage: completed as f32 / CHECKPOINT_COUNT as f32 * 100.0,
            is_complete: record.is_complete(),
        }
    }
}
