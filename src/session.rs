//! Hunt session orchestration
//!
//! Owns the progression machine and the active minigame, relays player
//! input, pumps minigame events into progression each tick, and reports
//! the finished hunt.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::error::HuntError;
use crate::feedback::Cue;
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::minigames::{ActiveMinigame, Minigame, MinigameContext, MinigameEvent, Symbol};
use crate::persistence::ProgressStore;
use crate::platform::{Probe, ProbeState, SensorHub, SensorReading, SharedClock, Storage};
use crate::progression::{GameStats, Progression, ProgressionRecord};
use crate::remote::{FeedbackResponse, Remote, RemoteClient, Transport};
use crate::settings::{Playback, Settings};
use crate::consts::FINAL_CHECKPOINT;
use crate::{is_valid_checkpoint, validate_team_id};

pub const FINISHED_MESSAGE: &str = "🎉 Congratulations! You found the Lost Loot! 🎉";
pub const SENSOR_MISSING_MESSAGE: &str =
    "This device does not report the sensor this challenge needs.";
/// Delay between opening the treasure and the end-of-hunt report (ms)
pub const FINISH_DELAY_MS: u64 = 2_000;

/// One team's hunt from start to finish
pub struct HuntSession<S: Storage + Clone, T: Transport> {
    progression: Progression<S, T>,
    storage: S,
    settings: Settings,
    leaderboard: Leaderboard,
    sensors: SensorHub,
    rng: Pcg32,
    clock: SharedClock,
    active: Option<ActiveMinigame>,
    /// Waiting for the active minigame's sensor before initializing it
    probe: Option<Probe>,
    playback: Vec<Playback>,
    messages: Vec<String>,
    /// End-of-hunt report deadline, armed by the final checkpoint.
    /// Survives leaving the checkpoint.
    finish_at: Option<u64>,
    finished: bool,
}

impl<S: Storage + Clone, T: Transport> HuntSession<S, T> {
    /// Restore a session from storage. `seed` drives every minigame's RNG.
    pub fn new(storage: S, transport: T, clock: SharedClock, settings: Settings, seed: u64) -> Self {
        let mut remote = RemoteClient::new(transport, &settings.api_base_url, clock.clone());
        remote.set_timeout(settings.request_timeout_ms);
        let progression = Progression::load(ProgressStore::new(storage.clone()), remote, clock.clone());
        let leaderboard = Leaderboard::load(&storage);

        Self {
            progression,
            storage,
            settings,
            leaderboard,
            sensors: SensorHub::default(),
            rng: Pcg32::seed_from_u64(seed),
            clock,
            active: None,
            probe: None,
            playback: Vec::new(),
            messages: Vec::new(),
            finish_at: None,
            finished: false,
        }
    }

    pub fn progression(&self) -> &Progression<S, T> {
        &self.progression
    }

    pub fn progression_mut(&mut self) -> &mut Progression<S, T> {
        &mut self.progression
    }

    pub fn record(&self) -> &ProgressionRecord {
        self.progression.record()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist settings; the remote client picks up URL and timeout
    pub fn update_settings(&mut self, settings: Settings) {
        let remote = self.progression.remote_mut();
        remote.set_base_url(&settings.api_base_url);
        remote.set_timeout(settings.request_timeout_ms);
        settings.save(&mut self.storage);
        self.settings = settings;
    }

    pub fn sensors(&self) -> &SensorHub {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut SensorHub {
        &mut self.sensors
    }

    /// Feed a device reading to whoever listens for it
    pub fn dispatch_reading(&mut self, reading: SensorReading) -> usize {
        self.sensors.dispatch(reading)
    }

    pub fn active(&self) -> Option<&ActiveMinigame> {
        self.active.as_ref()
    }

    pub fn active_checkpoint(&self) -> Option<u8> {
        self.active.as_ref().map(|g| g.checkpoint())
    }

    /// The final checkpoint has been reported
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Start a new hunt for `team_id` (3-20 letters or digits)
    pub fn start(&mut self, team_id: &str) -> Result<&ProgressionRecord, HuntError> {
        if !validate_team_id(team_id) {
            return Err(HuntError::Validation(
                "Team ID must be 3-20 letters or numbers".to_string(),
            ));
        }
        self.leave_checkpoint();
        self.finish_at = None;
        self.finished = false;
        self.progression.start_session(team_id)
    }

    /// Open the minigame guarding `checkpoint`.
    ///
    /// Locked, completed and unknown checkpoints are refused. A minigame
    /// whose sensor is missing waits on a probe before initializing.
    pub fn enter_checkpoint(&mut self, checkpoint: u8) -> Result<(), HuntError> {
        if !is_valid_checkpoint(checkpoint) {
            return Err(HuntError::InvalidCheckpoint(checkpoint));
        }
        let record = self.progression.record();
        if !record.is_started() {
            return Err(HuntError::SessionNotStarted);
        }
        record.check_completion(checkpoint)?;

        self.leave_checkpoint();
        let game =
            ActiveMinigame::for_checkpoint(checkpoint).ok_or(HuntError::InvalidCheckpoint(checkpoint))?;
        let waiting_on = game
            .required_sensor()
            .filter(|&kind| !self.sensors.is_available(kind));
        self.active = Some(game);
        log::info!("Entered checkpoint {}", checkpoint);

        match waiting_on {
            Some(kind) => {
                log::info!("Waiting for {:?} sensor", kind);
                self.probe = Some(Probe::new(self.clock.now_ms()));
            }
            None => {
                self.with_game(|game, ctx| game.initialize(ctx));
                self.pump_events();
            }
        }
        Ok(())
    }

    /// Clean up the active minigame, releasing its sensor listeners
    pub fn leave_checkpoint(&mut self) {
        self.probe = None;
        self.with_game(|game, ctx| game.cleanup(ctx));
        if let Some(game) = self.active.take() {
            log::info!("Left checkpoint {}", game.checkpoint());
        }
    }

    /// Advance timers, sensor probes and the active minigame
    pub fn tick(&mut self) {
        if self.finish_at.is_some_and(|at| self.clock.now_ms() >= at) {
            self.finish_at = None;
            self.finish_hunt();
        }
        if !self.poll_probe() {
            return;
        }
        self.with_game(|game, ctx| game.update(ctx));
        self.pump_events();
    }

    /// The generic tap/click trigger
    pub fn handle_action(&mut self) {
        if self.probe.is_some() {
            return;
        }
        self.with_game(|game, ctx| game.handle_action(ctx));
        self.pump_events();
    }

    pub fn select_answer(&mut self, index: usize) -> bool {
        let accepted = self
            .active
            .as_mut()
            .is_some_and(|game| game.select_answer(index));
        self.pump_events();
        accepted
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> bool {
        if self.probe.is_some() {
            return false;
        }
        let accepted = self
            .with_game(|game, ctx| game.add_symbol(symbol, ctx))
            .unwrap_or(false);
        self.pump_events();
        accepted
    }

    pub fn place_piece(&mut self, id: u8) -> bool {
        let accepted = self
            .active
            .as_mut()
            .is_some_and(|game| game.place_piece(id));
        self.pump_events();
        accepted
    }

    /// 0-100 for the active minigame
    pub fn progress(&self) -> Option<f32> {
        self.active.as_ref().map(|g| g.progress())
    }

    pub fn status_text(&self) -> Option<String> {
        if self.probe.is_some() {
            return Some("Waiting for sensors...".to_string());
        }
        self.active.as_ref().map(|g| g.status_text())
    }

    pub fn sync(&mut self) -> &ProgressionRecord {
        self.progression.sync_with_remote()
    }

    pub fn stats(&self) -> GameStats {
        self.progression.stats()
    }

    pub fn submit_feedback(&mut self, feedback: &str) -> Result<Remote<FeedbackResponse>, HuntError> {
        self.progression.submit_feedback(feedback)
    }

    /// Remote leaderboard when reachable, the local one otherwise
    pub fn leaderboard(&mut self) -> Vec<LeaderboardEntry> {
        match self.progression.remote_mut().leaderboard() {
            Remote::Live(board) => board.entries,
            Remote::Fallback { reason, .. } => {
                log::debug!("Using local leaderboard: {}", reason);
                self.leaderboard.entries.clone()
            }
        }
    }

    pub fn local_leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Operator reset: drop the active minigame and all progress
    pub fn reset(&mut self) {
        self.leave_checkpoint();
        self.finish_at = None;
        self.finished = false;
        self.progression.reset();
    }

    /// Cues that survived the player's sound/vibration preferences
    pub fn drain_playback(&mut self) -> Vec<Playback> {
        std::mem::take(&mut self.playback)
    }

    /// Messages for the player (failures, notices, the finale)
    pub fn drain_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    fn with_game<R>(
        &mut self,
        f: impl FnOnce(&mut ActiveMinigame, &mut MinigameContext<'_>) -> R,
    ) -> Option<R> {
        let now = self.clock.now_ms();
        let keys_collected = self.progression.record().collected_keys().len();
        let game = self.active.as_mut()?;
        let mut ctx = MinigameContext {
            now,
            rng: &mut self.rng,
            sensors: &mut self.sensors,
            keys_collected,
        };
        Some(f(game, &mut ctx))
    }

    /// Returns true once the active minigame is initialized and may update
    fn poll_probe(&mut self) -> bool {
        let Some(probe) = self.probe.as_mut() else {
            return true;
        };
        let kind = self.active.as_ref().and_then(|g| g.required_sensor());
        let sensors = &self.sensors;
        let state = probe.poll(self.clock.now_ms(), || {
            kind.is_none_or(|kind| sensors.is_available(kind))
        });

        match state {
            ProbeState::Pending => return false,
            ProbeState::Ready => log::info!("Sensor ready"),
            ProbeState::TimedOut => {
                log::warn!("Sensor probe timed out, starting without it");
                self.messages.push(SENSOR_MISSING_MESSAGE.to_string());
            }
        }
        self.probe = None;
        self.with_game(|game, ctx| game.initialize(ctx));
        self.pump_events();
        false
    }

    fn pump_events(&mut self) {
        let events = self
            .active
            .as_mut()
            .map(|game| game.drain_events())
            .unwrap_or_default();

        for event in events {
            match event {
                MinigameEvent::Completed(done) => {
                    match self
                        .progression
                        .complete_checkpoint(done.checkpoint, done.earns_key)
                    {
                        Ok(_) if done.checkpoint == FINAL_CHECKPOINT => {
                            self.finish_at = Some(self.clock.now_ms() + FINISH_DELAY_MS);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            log::warn!(
                                "Completion of checkpoint {} rejected: {}",
                                done.checkpoint,
                                e
                            );
                            self.messages.push(e.to_string());
                        }
                    }
                }
                MinigameEvent::Failed(message) | MinigameEvent::Notice(message) => {
                    self.messages.push(message);
                }
                MinigameEvent::Cue(cue) => self.queue_cue(cue),
            }
        }
    }

    fn queue_cue(&mut self, cue: Cue) {
        if let Some(playback) = self.settings.playback(cue) {
            self.playback.push(playback);
        }
    }

    fn finish_hunt(&mut self) {
        if self.finished {
            return;
        }
        match self.progression.end_game() {
            Ok(Remote::Live(ack)) => log::info!("Game end reported: {}", ack.message),
            Ok(Remote::Fallback { reason, .. }) => {
                log::warn!("Game end not reported to backend: {}", reason);
            }
            Err(e) => {
                log::warn!("Cannot end game: {}", e);
                return;
            }
        }
        self.finished = true;

        let stats = self.progression.stats();
        if stats.is_complete {
            let entry = LeaderboardEntry {
                team_id: stats.team_id.unwrap_or_default(),
                completion_ms: stats.elapsed_time,
                checkpoints: stats.checkpoints_completed as u8,
                keys: stats.keys_collected as u8,
                finished_at: self.clock.now_ms(),
            };
            if let Some(rank) = self.leaderboard.record(entry) {
                log::info!("Leaderboard rank {}", rank);
                self.leaderboard.save(&mut self.storage);
            }
        }
        self.messages.push(FINISHED_MESSAGE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minigames::treasure::LOCKED_MESSAGE;
    use crate::platform::{ManualClock, MemoryStorage, OrientationReading, SensorKind};
    use crate::remote::{Method, Scripted, ScriptedTransport};
    use serde_json::json;
    use std::rc::Rc;

    struct Fixture {
        session: HuntSession<MemoryStorage, ScriptedTransport>,
        storage: MemoryStorage,
        transport: ScriptedTransport,
        clock: Rc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let storage = MemoryStorage::new();
        let transport = ScriptedTransport::new();
        let clock = Rc::new(ManualClock::new(1_000_000));
        let session = HuntSession::new(
            storage.clone(),
            transport.clone(),
            clock.clone(),
            Settings::for_host("localhost"),
            42,
        );
        Fixture {
            session,
            storage,
            transport,
            clock,
        }
    }

    fn started() -> Fixture {
        let mut f = fixture();
        f.session.start("ABC123").unwrap();
        f
    }

    fn complete_through(f: &mut Fixture, last: u8, earns_key: impl Fn(u8) -> bool) {
        for n in 1..=last {
            f.session
                .progression_mut()
                .complete_checkpoint(n, earns_key(n))
                .unwrap();
        }
    }

    fn facing(heading: f32, at: u64) -> SensorReading {
        SensorReading::Orientation(OrientationReading {
            alpha: Some(crate::normalize_degrees(360.0 - heading)),
            at,
            ..Default::default()
        })
    }

    fn checkpoint_posts(transport: &ScriptedTransport) -> Vec<serde_json::Value> {
        transport
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post && r.url.ends_with("/checkpoint/complete"))
            .filter_map(|r| r.body)
            .collect()
    }

    #[test]
    fn test_start_validates_team_id() {
        let mut f = fixture();
        assert!(matches!(f.session.start("ab"), Err(HuntError::Validation(_))));
        assert!(matches!(f.session.start("team one"), Err(HuntError::Validation(_))));
        assert!(f.transport.requests().is_empty());
        assert!(f.session.start("ABC123").is_ok());
    }

    #[test]
    fn test_enter_checkpoint_gating() {
        let mut f = fixture();
        assert_eq!(f.session.enter_checkpoint(1), Err(HuntError::SessionNotStarted));

        f.session.start("ABC123").unwrap();
        assert_eq!(f.session.enter_checkpoint(0), Err(HuntError::InvalidCheckpoint(0)));
        assert_eq!(f.session.enter_checkpoint(9), Err(HuntError::InvalidCheckpoint(9)));
        assert_eq!(
            f.session.enter_checkpoint(3),
            Err(HuntError::SequenceViolation { checkpoint: 3, required: 2 })
        );
        assert!(f.session.active().is_none());

        complete_through(&mut f, 1, |_| true);
        assert_eq!(f.session.enter_checkpoint(1), Err(HuntError::DuplicateCompletion(1)));
        assert!(f.session.enter_checkpoint(2).is_ok());
        assert_eq!(f.session.active_checkpoint(), Some(2));
    }

    #[test]
    fn test_compass_run_awards_first_key() {
        let mut f = started();
        f.session.enter_checkpoint(1).unwrap();
        assert_eq!(f.session.sensors().listener_count(), 1);

        let target = match f.session.active() {
            Some(ActiveMinigame::Compass(c)) => c.target_heading(),
            other => panic!("expected compass, got {:?}", other),
        };
        f.session.dispatch_reading(facing(target + 5.0, 1_000_000));
        f.session.tick();
        f.clock.advance(3_000);
        f.session.tick();

        let record = f.session.record();
        assert_eq!(record.completed_checkpoints(), &[1]);
        assert_eq!(record.collected_keys(), &[1]);
        assert!(!record.is_complete());

        // Sequence violation after the win leaves the record as it was
        let before = f.session.record().clone();
        assert_eq!(
            f.session.enter_checkpoint(3),
            Err(HuntError::SequenceViolation { checkpoint: 3, required: 2 })
        );
        assert_eq!(f.session.record(), &before);

        f.session.leave_checkpoint();
        assert_eq!(f.session.sensors().listener_count(), 0);
    }

    #[test]
    fn test_quiz_two_of_three_reports_checkpoint_two() {
        let mut f = started();
        complete_through(&mut f, 1, |_| true);
        f.session.enter_checkpoint(2).unwrap();

        for correctly in [true, false, true] {
            let question = match f.session.active() {
                Some(ActiveMinigame::Quiz(q)) => q.current_question().unwrap(),
                other => panic!("expected quiz, got {:?}", other),
            };
            let choice = if correctly {
                question.correct
            } else {
                (question.correct + 1) % 4
            };
            assert!(f.session.select_answer(choice));
            f.session.handle_action();
        }

        assert_eq!(f.session.record().completed_checkpoints(), &[1, 2]);
        assert_eq!(f.session.record().collected_keys(), &[1]);
        let posts = checkpoint_posts(&f.transport);
        let last = posts.last().unwrap();
        assert_eq!(last["checkpoint"], json!(2));
        assert_eq!(last["earnedKey"], json!(false));
    }

    #[test]
    fn test_treasure_with_two_keys_is_inert() {
        let mut f = started();
        complete_through(&mut f, 7, |n| n != 7);
        assert_eq!(f.session.record().collected_keys(), &[1, 2]);

        f.session.enter_checkpoint(8).unwrap();
        assert!(f.session.drain_messages().contains(&LOCKED_MESSAGE.to_string()));
        for _ in 0..5 {
            f.session.handle_action();
        }
        assert_eq!(f.session.progress(), Some(0.0));
        assert!(!f.session.record().is_completed(8));
        assert!(f.session.status_text().unwrap().contains("need 3 keys"));
    }

    #[test]
    fn test_full_hunt_reports_end_and_ranks() {
        let mut f = started();
        complete_through(&mut f, 7, |_| true);

        f.session.enter_checkpoint(8).unwrap();
        for _ in 0..4 {
            f.session.handle_action();
        }
        assert!(f.session.record().is_complete());
        assert!(!f.session.is_finished());

        f.clock.advance(FINISH_DELAY_MS);
        f.session.tick();
        assert!(f.session.is_finished());
        assert!(f.session.drain_messages().contains(&FINISHED_MESSAGE.to_string()));

        let ends: Vec<_> = f
            .transport
            .requests()
            .into_iter()
            .filter(|r| r.url.ends_with("/game/end"))
            .collect();
        assert_eq!(ends.len(), 1);
        let stats = &ends[0].body.as_ref().unwrap()["stats"];
        assert_eq!(stats["checkpointsCompleted"], json!(8));
        assert_eq!(stats["isComplete"], json!(true));

        // Offline: the local board answers
        let board = f.session.leaderboard();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].team_id, "ABC123");
        assert_eq!(board[0].completion_ms, 2_000);
        assert_eq!(Leaderboard::load(&f.storage).entries, board);

        // Late ticks do not report twice
        f.clock.advance(5_000);
        f.session.tick();
        let ends = f
            .transport
            .requests()
            .iter()
            .filter(|r| r.url.ends_with("/game/end"))
            .count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_leaving_treasure_still_reports_the_hunt() {
        let mut f = started();
        complete_through(&mut f, 7, |_| true);

        f.session.enter_checkpoint(8).unwrap();
        for _ in 0..4 {
            f.session.handle_action();
        }
        assert!(f.session.record().is_complete());
        f.session.leave_checkpoint();
        assert!(f.session.active().is_none());

        f.clock.advance(FINISH_DELAY_MS - 1);
        f.session.tick();
        assert!(!f.session.is_finished());

        f.clock.advance(1);
        f.session.tick();
        assert!(f.session.is_finished());
        let ends = f
            .transport
            .requests()
            .iter()
            .filter(|r| r.url.ends_with("/game/end"))
            .count();
        assert_eq!(ends, 1);
        assert_eq!(f.session.local_leaderboard().entries.len(), 1);
    }

    #[test]
    fn test_reset_cancels_pending_report() {
        let mut f = started();
        complete_through(&mut f, 7, |_| true);
        f.session.enter_checkpoint(8).unwrap();
        for _ in 0..4 {
            f.session.handle_action();
        }
        f.session.reset();

        f.clock.advance(FINISH_DELAY_MS);
        f.session.tick();
        assert!(!f.session.is_finished());
        assert!(!f.transport.requests().iter().any(|r| r.url.ends_with("/game/end")));
    }

    #[test]
    fn test_live_leaderboard_preferred() {
        let mut f = started();
        f.transport.push(Scripted::ok(json!({
            "entries": [{"teamId": "KRAKEN", "completionMs": 900000, "checkpoints": 8, "keys": 3}]
        })));
        let board = f.session.leaderboard();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].team_id, "KRAKEN");
    }

    #[test]
    fn test_missing_sensor_waits_on_probe() {
        let mut f = started();
        f.session.sensors_mut().set_available(SensorKind::Orientation, false);
        f.session.enter_checkpoint(1).unwrap();
        assert_eq!(f.session.status_text().as_deref(), Some("Waiting for sensors..."));
        assert!(!f.session.active().unwrap().is_active());

        f.session.tick();
        f.clock.advance(300);
        f.session.sensors_mut().set_available(SensorKind::Orientation, true);
        f.session.tick();
        assert!(f.session.active().unwrap().is_active());
        assert_eq!(f.session.sensors().listener_count(), 1);
    }

    #[test]
    fn test_sensor_probe_gives_up_after_ceiling() {
        let mut f = started();
        complete_through(&mut f, 4, |_| true);
        f.session.sensors_mut().set_available(SensorKind::Motion, false);
        f.session.enter_checkpoint(5).unwrap();

        f.session.tick();
        f.clock.advance(5_000);
        f.session.tick();
        assert!(f.session.active().unwrap().is_active());
        assert!(f.session.drain_messages().contains(&SENSOR_MISSING_MESSAGE.to_string()));
        assert_eq!(f.session.sensors().listener_count(), 0);
    }

    #[test]
    fn test_muted_session_still_vibrates() {
        let mut f = started();
        let mut settings = f.session.settings().clone();
        settings.sound_enabled = false;
        f.session.update_settings(settings);
        assert!(!Settings::load(&f.storage, "x").sound_enabled);

        complete_through(&mut f, 6, |_| true);
        f.session.enter_checkpoint(7).unwrap();
        f.session.drain_playback();
        assert!(f.session.place_piece(2));
        let playback = f.session.drain_playback();
        assert_eq!(playback.len(), 1);
        assert_eq!(playback[0].sound, None);
        assert!(playback[0].vibration.is_some());
    }

    #[test]
    fn test_feedback_requires_text() {
        let mut f = started();
        assert!(matches!(
            f.session.submit_feedback("  "),
            Err(HuntError::Validation(_))
        ));
        let response = f.session.submit_feedback("Loved the duel").unwrap();
        assert!(!response.is_live());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut f = started();
        complete_through(&mut f, 2, |_| true);
        f.session.enter_checkpoint(3).unwrap();
        f.session.reset();
        assert!(f.session.active().is_none());
        assert!(!f.session.record().is_started());
        assert_eq!(f.session.enter_checkpoint(1), Err(HuntError::SessionNotStarted));
    }
}
