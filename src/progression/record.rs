//! The progression record and its invariants

use serde::{Deserialize, Serialize};

use crate::consts::{CHECKPOINT_COUNT, KEY_CHECKPOINTS, KEY_COUNT};
use crate::error::{HuntError, StorageCorruption};
use crate::{is_valid_checkpoint, key_for_checkpoint};

/// A session's durable progress.
///
/// Fields are read-only from outside; the only mutations are a fresh session,
/// a checkpoint completion and a remote overwrite, each of which keeps the
/// invariants and re-derives `is_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    team_id: Option<String>,
    /// Unix ms
    start_time: Option<u64>,
    /// Completion order
    #[serde(default)]
    completed_checkpoints: Vec<u8>,
    #[serde(default)]
    collected_keys: Vec<u8>,
    #[serde(default)]
    is_complete: bool,
    /// Unix ms of the last live reconciliation
    #[serde(default)]
    last_sync: Option<u64>,
}

impl ProgressionRecord {
    /// Fresh record for a new session
    pub fn new_session(team_id: &str, start_time: u64) -> Self {
        Self {
            team_id: Some(team_id.to_string()),
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn completed_checkpoints(&self) -> &[u8] {
        &self.completed_checkpoints
    }

    pub fn collected_keys(&self) -> &[u8] {
        &self.collected_keys
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn last_sync(&self) -> Option<u64> {
        self.last_sync
    }

    /// A session has been started (team and start time known)
    pub fn is_started(&self) -> bool {
        self.team_id.is_some() && self.start_time.is_some()
    }

    pub fn is_completed(&self, checkpoint: u8) -> bool {
        self.completed_checkpoints.contains(&checkpoint)
    }

    /// Checkpoint 1 is always open; n needs n-1
    pub fn is_unlocked(&self, checkpoint: u8) -> bool {
        checkpoint == 1 || self.is_completed(checkpoint.wrapping_sub(1))
    }

    /// Lowest checkpoint not yet completed
    pub fn next_unlocked(&self) -> Option<u8> {
        (1..=CHECKPOINT_COUNT).find(|n| !self.is_completed(*n))
    }

    /// Reject a completion that would break an invariant
    pub fn check_completion(&self, checkpoint: u8) -> Result<(), HuntError> {
        if !is_valid_checkpoint(checkpoint) {
            return Err(HuntError::InvalidCheckpoint(checkpoint));
        }
        if self.is_completed(checkpoint) {
            return Err(HuntError::DuplicateCompletion(checkpoint));
        }
        if !self.is_unlocked(checkpoint) {
            return Err(HuntError::SequenceViolation {
                checkpoint,
                required: checkpoint - 1,
            });
        }
        Ok(())
    }

    /// Record a completion that already passed `check_completion`.
    /// Returns the key awarded, if any.
    pub(crate) fn apply_completion(&mut self, checkpoint: u8, earns_key: bool) -> Option<u8> {
        self.completed_checkpoints.push(checkpoint);
        let awarded = if earns_key {
            key_for_checkpoint(checkpoint).filter(|key| !self.collected_keys.contains(key))
        } else {
            None
        };
        if let Some(key) = awarded {
            self.collected_keys.push(key);
        }
        self.refresh_complete();
        awarded
    }

    /// Copy of this record with the backend's view of progress.
    /// Duplicates are dropped; ranges and gating are checked by `validate`.
    pub(crate) fn with_remote_view(&self, checkpoints: &[u8], keys: &[u8], synced_at: u64) -> Self {
        let mut next = self.clone();
        next.completed_checkpoints = dedup_in_order(checkpoints);
        next.collected_keys = dedup_in_order(keys);
        next.last_sync = Some(synced_at);
        next.refresh_complete();
        next
    }

    pub(crate) fn set_last_sync(&mut self, at: u64) {
        self.last_sync = Some(at);
    }

    fn refresh_complete(&mut self) {
        self.is_complete = self.completed_checkpoints.len() == CHECKPOINT_COUNT as usize;
    }

    /// Check every record invariant (used on load, import and sync)
    pub fn validate(&self) -> Result<(), StorageCorruption> {
        let invariant = |msg: String| Err(StorageCorruption::Invariant(msg));

        for (i, &cp) in self.completed_checkpoints.iter().enumerate() {
            if !is_valid_checkpoint(cp) {
                return invariant(format!("checkpoint {} out of range", cp));
            }
            if self.completed_checkpoints[..i].contains(&cp) {
                return invariant(format!("checkpoint {} listed twice", cp));
            }
        }
        for &cp in &self.completed_checkpoints {
            if cp > 1 && !self.is_completed(cp - 1) {
                return invariant(format!("checkpoint {} completed without {}", cp, cp - 1));
            }
        }
        for (i, &key) in self.collected_keys.iter().enumerate() {
            if key == 0 || key > KEY_COUNT {
                return invariant(format!("key {} out of range", key));
            }
            if self.collected_keys[..i].contains(&key) {
                return invariant(format!("key {} listed twice", key));
            }
            let source = KEY_CHECKPOINTS[key as usize - 1];
            if !self.is_completed(source) {
                return invariant(format!("key {} held without checkpoint {}", key, source));
            }
        }
        let complete = self.completed_checkpoints.len() == CHECKPOINT_COUNT as usize;
        if self.is_complete != complete {
            return invariant(format!(
                "isComplete={} with {} checkpoints",
                self.is_complete,
                self.completed_checkpoints.len()
            ));
        }
        if self.team_id.is_none() && !self.completed_checkpoints.is_empty() {
            return invariant("progress without a team".to_string());
        }
        Ok(())
    }
}

fn dedup_in_order(values: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
