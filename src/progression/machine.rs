//! Progression state machine
//!
//! `Uninitialized -> Active -> Complete`. The record changes only through
//! `start_session`, `complete_checkpoint`, `sync_with_remote`, `import_json`
//! and `reset`; each builds the next record in full, then swaps and persists
//! it, so no caller ever observes a half-applied update. Reset removes the
//! stored record instead of writing an empty one.

use super::record::ProgressionRecord;
use super::stats::GameStats;
use crate::error::HuntError;
use crate::persistence::ProgressStore;
use crate::platform::{SharedClock, Storage};
use crate::remote::{EndGameResponse, FeedbackResponse, Remote, RemoteClient, Transport};

/// Lifecycle phase derived from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionPhase {
    /// No session started
    Uninitialized,
    /// Session running
    Active,
    /// All eight checkpoints completed
    Complete,
}

/// Owner of the canonical progression record
pub struct Progression<S: Storage, T: Transport> {
    record: ProgressionRecord,
    store: ProgressStore<S>,
    remote: RemoteClient<T>,
    clock: SharedClock,
}

impl<S: Storage, T: Transport> Progression<S, T> {
    /// Restore from storage (corrupt or missing storage gives a fresh record)
    pub fn load(mut store: ProgressStore<S>, remote: RemoteClient<T>, clock: SharedClock) -> Self {
        let record = store.load();
        Self {
            record,
            store,
            remote,
            clock,
        }
    }

    pub fn record(&self) -> &ProgressionRecord {
        &self.record
    }

    pub fn phase(&self) -> ProgressionPhase {
        if !self.record.is_started() {
            ProgressionPhase::Uninitialized
        } else if self.record.is_complete() {
            ProgressionPhase::Complete
        } else {
            ProgressionPhase::Active
        }
    }

    pub fn remote(&self) -> &RemoteClient<T> {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut RemoteClient<T> {
        &mut self.remote
    }

    fn commit(&mut self, next: ProgressionRecord) {
        self.record = next;
        self.store.save(&self.record);
    }

    /// Begin a new session for `team_id`, discarding any previous progress.
    ///
    /// The team id format is the caller's concern; only emptiness is checked
    /// here. A backend that answers but refuses the start is an error; an
    /// unreachable backend is not.
    pub fn start_session(&mut self, team_id: &str) -> Result<&ProgressionRecord, HuntError> {
        if team_id.is_empty() {
            return Err(HuntError::Validation("team id is required".to_string()));
        }

        let now = self.clock.now_ms();
        let response = self.remote.start_game(team_id, now);
        let live = response.is_live();
        let response = response.into_value();
        if live && !response.success {
            log::warn!("Backend refused session start for {}: {}", team_id, response.message);
            return Err(HuntError::SessionStart(response.message));
        }

        let mut next = ProgressionRecord::new_session(team_id, now);
        if live {
            next.set_last_sync(now);
        }
        self.commit(next);
        log::info!("Game initialized for team: {}", team_id);
        Ok(&self.record)
    }

    /// Record a finished checkpoint.
    ///
    /// Rejections leave the record untouched. The backend is told afterwards;
    /// its answer never rolls local progress back.
    pub fn complete_checkpoint(
        &mut self,
        checkpoint: u8,
        earns_key: bool,
    ) -> Result<&ProgressionRecord, HuntError> {
        let Some(team_id) = self.record.team_id().map(str::to_string) else {
            return Err(HuntError::SessionNotStarted);
        };
        self.record.check_completion(checkpoint)?;

        let mut next = self.record.clone();
        let awarded = next.apply_completion(checkpoint, earns_key);
        self.commit(next);

        log::info!(
            "Checkpoint {} completed{}. Keys: {}/{}",
            checkpoint,
            awarded.map(|k| format!(" (key {})", k)).unwrap_or_default(),
            self.record.collected_keys().len(),
            crate::consts::KEY_COUNT
        );

        match self.remote.complete_checkpoint(&team_id, checkpoint, earns_key) {
            Remote::Live(ack) if !ack.success => {
                log::warn!("Backend did not accept checkpoint {}: {}", checkpoint, ack.message);
            }
            Remote::Live(_) => {}
            Remote::Fallback { reason, .. } => {
                log::warn!("Checkpoint {} not mirrored to backend: {}", checkpoint, reason);
            }
        }

        Ok(&self.record)
    }

    /// Adopt the backend's view of this team's progress.
    ///
    /// Live answers overwrite local progress. Fallbacks, and live answers
    /// that break record invariants, leave local state as it was.
    pub fn sync_with_remote(&mut self) -> &ProgressionRecord {
        let Some(team_id) = self.record.team_id().map(str::to_string) else {
            return &self.record;
        };

        let status = match self.remote.team_status(&team_id) {
            Remote::Live(status) => status,
            Remote::Fallback { reason, .. } => {
                log::warn!("Sync skipped, backend unavailable: {}", reason);
                return &self.record;
            }
        };

        let now = self.clock.now_ms();
        let next = self
            .record
            .with_remote_view(&status.checkpoints, &status.keys, now);
        if let Err(e) = next.validate() {
            log::warn!("Ignoring inconsistent backend state for {}: {}", team_id, e);
            return &self.record;
        }
        if next.is_complete() != status.is_game_complete {
            log::warn!(
                "Backend reports isGameComplete={} for {} checkpoints",
                status.is_game_complete,
                next.completed_checkpoints().len()
            );
        }

        self.commit(next);
        log::info!("State synced with server");
        &self.record
    }

    /// Lowest checkpoint not yet completed, `None` once all eight are done
    pub fn next_unlocked_checkpoint(&self) -> Option<u8> {
        self.record.next_unlocked()
    }

    pub fn is_unlocked(&self, checkpoint: u8) -> bool {
        self.record.is_unlocked(checkpoint)
    }

    pub fn is_completed(&self, checkpoint: u8) -> bool {
        self.record.is_completed(checkpoint)
    }

    pub fn stats(&self) -> GameStats {
        GameStats::from_record(&self.record, self.clock.now_ms())
    }

    /// Report the finished hunt to the backend
    pub fn end_game(&mut self) -> Result<Remote<EndGameResponse>, HuntError> {
        let Some(team_id) = self.record.team_id().map(str::to_string) else {
            return Err(HuntError::SessionNotStarted);
        };
        let stats = self.stats();
        Ok(self.remote.end_game(&team_id, stats))
    }

    pub fn submit_feedback(&mut self, feedback: &str) -> Result<Remote<FeedbackResponse>, HuntError> {
        if feedback.trim().is_empty() {
            return Err(HuntError::Validation("feedback is empty".to_string()));
        }
        let team_id = self.record.team_id().map(str::to_string);
        Ok(self.remote.submit_feedback(team_id.as_deref(), feedback))
    }

    /// Operator reset: back to `Uninitialized`
    pub fn reset(&mut self) {
        self.record = ProgressionRecord::default();
        self.store.clear();
        log::info!("Progress reset");
    }

    /// Pretty JSON of the record, for debugging
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.record).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the record with an exported one (validated first)
    pub fn import_json(&mut self, json: &str) -> Result<&ProgressionRecord, HuntError> {
        let record = ProgressStore::<S>::decode(json).map_err(|e| HuntError::Import(e.to_string()))?;
        self.commit(record);
        log::info!("State imported successfully");
        Ok(&self.record)
    }
}
