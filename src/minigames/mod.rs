//! Checkpoint minigames
//!
//! Every checkpoint is gated by one minigame. All eight share one lifecycle
//! (`initialize`, `handle_action`, `update`, `progress`, `cleanup`, `reset`)
//! and report success only by emitting `MinigameEvent::Completed`, which the
//! session forwards to the progression state machine.
//!
//! Minigames hold no timers of their own: scheduled delays are deadlines
//! checked in `update` against `MinigameContext::now`.

pub mod balance;
pub mod cannon;
pub mod chest;
pub mod compass;
pub mod duel;
pub mod map;
pub mod quiz;
pub mod treasure;

pub use balance::BalanceGame;
pub use cannon::CannonGame;
pub use chest::{ChestLockGame, Symbol};
pub use compass::CompassGame;
pub use duel::DuelGame;
pub use map::MapGame;
pub use quiz::QuizGame;
pub use treasure::TreasureGame;

use rand_pcg::Pcg32;

use crate::feedback::Cue;
use crate::key_for_checkpoint;
use crate::platform::{SensorHub, SensorKind};

/// What a successful minigame reports to progression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub checkpoint: u8,
    pub earns_key: bool,
}

/// Output of a minigame, drained by the session each tick
#[derive(Debug, Clone, PartialEq)]
pub enum MinigameEvent {
    /// Won; the only path into shared progression state
    Completed(Completion),
    /// Lost this attempt; a retry is scheduled
    Failed(String),
    /// Informational message for the player
    Notice(String),
    /// Sound/vibration for the presentation layer
    Cue(Cue),
}

/// Per-call environment handed to a minigame
pub struct MinigameContext<'a> {
    /// Current time (ms)
    pub now: u64,
    pub rng: &'a mut Pcg32,
    pub sensors: &'a mut SensorHub,
    /// Keys in the progression record
    pub keys_collected: usize,
}

/// State every minigame carries (checkpoint identity, activity, progress,
/// completion, pending retry and the outgoing event queue)
#[derive(Debug, Clone)]
pub struct Lifecycle {
    checkpoint: u8,
    earns_key: bool,
    is_active: bool,
    is_completed: bool,
    progress: f32,
    retry_at: Option<u64>,
    events: Vec<MinigameEvent>,
}

impl Lifecycle {
    pub fn new(checkpoint: u8) -> Self {
        Self {
            checkpoint,
            earns_key: key_for_checkpoint(checkpoint).is_some(),
            is_active: false,
            is_completed: false,
            progress: 0.0,
            retry_at: None,
            events: Vec::new(),
        }
    }

    pub fn checkpoint(&self) -> u8 {
        self.checkpoint
    }

    pub fn earns_key(&self) -> bool {
        self.earns_key
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// A failed attempt is waiting for its retry
    pub fn awaiting_retry(&self) -> bool {
        self.retry_at.is_some()
    }

    /// Accepting player input: active, not won, not between attempts
    pub fn accepts_input(&self) -> bool {
        self.is_active && !self.is_completed && self.retry_at.is_none()
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.is_completed = false;
        self.progress = 0.0;
        self.retry_at = None;
        log::info!("Minigame {} initialized", self.checkpoint);
    }

    pub fn deactivate(&mut self) {
        if self.is_active {
            log::info!("Minigame {} cleaned up", self.checkpoint);
        }
        self.is_active = false;
        self.retry_at = None;
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.is_completed = false;
        self.retry_at = None;
        log::info!("Minigame {} reset", self.checkpoint);
    }

    pub fn set_progress(&mut self, percent: f32) {
        self.progress = percent.clamp(0.0, 100.0);
    }

    pub fn emit(&mut self, event: MinigameEvent) {
        self.events.push(event);
    }

    pub fn cue(&mut self, cue: Cue) {
        self.events.push(MinigameEvent::Cue(cue));
    }

    /// Win: progress to 100 and report completion
    pub fn succeed(&mut self, cue: Cue) {
        self.is_completed = true;
        self.progress = 100.0;
        self.cue(cue);
        self.emit(MinigameEvent::Completed(Completion {
            checkpoint: self.checkpoint,
            earns_key: self.earns_key,
        }));
        log::info!("Minigame {} completed", self.checkpoint);
    }

    /// Lose this attempt; `retry_due` fires after `delay_ms`
    pub fn fail(&mut self, message: &str, now: u64, delay_ms: u64) {
        self.retry_at = Some(now + delay_ms);
        self.cue(Cue::FAILURE);
        self.emit(MinigameEvent::Failed(message.to_string()));
        log::info!("Minigame {} attempt failed: {}", self.checkpoint, message);
    }

    /// True once, when a scheduled retry comes due
    pub fn retry_due(&mut self, now: u64) -> bool {
        match self.retry_at {
            Some(at) if now >= at => {
                self.retry_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<MinigameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// The lifecycle contract shared by every checkpoint minigame
pub trait Minigame {
    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Start an attempt: activate, reset transient progress, variant setup
    fn initialize(&mut self, ctx: &mut MinigameContext<'_>);

    /// The generic tap/click trigger
    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>);

    /// Advance timers and consume sensor readings
    fn update(&mut self, _ctx: &mut MinigameContext<'_>) {}

    /// Release listeners. Safe before `initialize` and when repeated.
    fn cleanup(&mut self, ctx: &mut MinigameContext<'_>) {
        let _ = ctx;
        self.lifecycle_mut().deactivate();
    }

    /// Fresh internal state for a retry; listeners stay registered
    fn reset(&mut self, ctx: &mut MinigameContext<'_>);

    /// One-line status for the HUD
    fn status_text(&self) -> String;

    /// Sensor this minigame listens to, if any
    fn required_sensor(&self) -> Option<SensorKind> {
        None
    }

    fn checkpoint(&self) -> u8 {
        self.lifecycle().checkpoint()
    }

    /// 0-100
    fn progress(&self) -> f32 {
        self.lifecycle().progress()
    }

    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }

    fn is_completed(&self) -> bool {
        self.lifecycle().is_completed()
    }

    fn drain_events(&mut self) -> Vec<MinigameEvent> {
        self.lifecycle_mut().drain_events()
    }
}

/// The minigame for one checkpoint, selected by number
#[derive(Debug)]
pub enum ActiveMinigame {
    Compass(CompassGame),
    Quiz(QuizGame),
    Cannon(CannonGame),
    Chest(ChestLockGame),
    Balance(BalanceGame),
    Duel(DuelGame),
    Map(MapGame),
    Treasure(TreasureGame),
}

macro_rules! dispatch {
    ($self:expr, $game:ident => $body:expr) => {
        match $self {
            ActiveMinigame::Compass($game) => $body,
            ActiveMinigame::Quiz($game) => $body,
            ActiveMinigame::Cannon($game) => $body,
            ActiveMinigame::Chest($game) => $body,
            ActiveMinigame::Balance($game) => $body,
            ActiveMinigame::Duel($game) => $body,
            ActiveMinigame::Map($game) => $body,
            ActiveMinigame::Treasure($game) => $body,
        }
    };
}

impl ActiveMinigame {
    /// Dispatch table: checkpoint number to minigame
    pub fn for_checkpoint(checkpoint: u8) -> Option<Self> {
        let game = match checkpoint {
            1 => ActiveMinigame::Compass(CompassGame::new()),
            2 => ActiveMinigame::Quiz(QuizGame::new()),
            3 => ActiveMinigame::Cannon(CannonGame::new()),
            4 => ActiveMinigame::Chest(ChestLockGame::new()),
            5 => ActiveMinigame::Balance(BalanceGame::new()),
            6 => ActiveMinigame::Duel(DuelGame::new()),
            7 => ActiveMinigame::Map(MapGame::new()),
            8 => ActiveMinigame::Treasure(TreasureGame::new()),
            _ => return None,
        };
        Some(game)
    }

    /// Quiz: choose an answer (submitted by `handle_action`)
    pub fn select_answer(&mut self, index: usize) -> bool {
        match self {
            ActiveMinigame::Quiz(quiz) => quiz.select_answer(index),
            _ => false,
        }
    }

    /// Chest lock: enter the next symbol
    pub fn add_symbol(&mut self, symbol: Symbol, ctx: &mut MinigameContext<'_>) -> bool {
        match self {
            ActiveMinigame::Chest(chest) => chest.add_symbol(symbol, ctx),
            _ => false,
        }
    }

    /// Map: place a specific piece
    pub fn place_piece(&mut self, id: u8) -> bool {
        match self {
            ActiveMinigame::Map(map) => map.place_piece(id),
            _ => false,
        }
    }
}

impl Minigame for ActiveMinigame {
    fn lifecycle(&self) -> &Lifecycle {
        dispatch!(self, game => game.lifecycle())
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        dispatch!(self, game => game.lifecycle_mut())
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        dispatch!(self, game => game.initialize(ctx))
    }

    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>) {
        dispatch!(self, game => game.handle_action(ctx))
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        dispatch!(self, game => game.update(ctx))
    }

    fn cleanup(&mut self, ctx: &mut MinigameContext<'_>) {
        dispatch!(self, game => game.cleanup(ctx))
    }

    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        dispatch!(self, game => game.reset(ctx))
    }

    fn status_text(&self) -> String {
        dispatch!(self, game => game.status_text())
    }

    fn required_sensor(&self) -> Option<SensorKind> {
        dispatch!(self, game => game.required_sensor())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;

    #[test]
    fn test_dispatch_table_covers_every_checkpoint() {
        for n in 1..=8u8 {
            let game = ActiveMinigame::for_checkpoint(n).unwrap();
            assert_eq!(game.checkpoint(), n);
            assert_eq!(game.lifecycle().earns_key(), matches!(n, 1 | 4 | 7));
            assert!(!game.is_active());
        }
        assert!(ActiveMinigame::for_checkpoint(0).is_none());
        assert!(ActiveMinigame::for_checkpoint(9).is_none());
    }

    #[test]
    fn test_cleanup_without_initialize_is_safe() {
        let mut h = Harness::new(1);
        for n in 1..=8u8 {
            let mut game = ActiveMinigame::for_checkpoint(n).unwrap();
            game.cleanup(&mut h.ctx());
            game.cleanup(&mut h.ctx());
            assert!(!game.is_active());
        }
        assert_eq!(h.sensors.listener_count(), 0);
    }

    #[test]
    fn test_initialize_then_cleanup_releases_sensors() {
        let mut h = Harness::new(2);
        for n in 1..=8u8 {
            let mut game = ActiveMinigame::for_checkpoint(n).unwrap();
            game.initialize(&mut h.ctx());
            assert!(game.is_active());
            assert_eq!(game.progress(), 0.0);
            let expected = usize::from(game.required_sensor().is_some());
            assert_eq!(h.sensors.listener_count(), expected);
            game.cleanup(&mut h.ctx());
            assert_eq!(h.sensors.listener_count(), 0);
        }
    }

    #[test]
    fn test_variant_inputs_ignore_wrong_game() {
        let mut h = Harness::new(3);
        let mut map = ActiveMinigame::for_checkpoint(7).unwrap();
        map.initialize(&mut h.ctx());
        assert!(!map.select_answer(0));
        assert!(!map.add_symbol(Symbol::Anchor, &mut h.ctx()));
        assert!(map.place_piece(2));
    }

    #[test]
    fn test_lifecycle_retry_fires_once() {
        let mut lc = Lifecycle::new(3);
        lc.activate();
        lc.fail("missed", 1_000, 3_000);
        assert!(lc.awaiting_retry());
        assert!(!lc.accepts_input());
        assert!(!lc.retry_due(3_999));
        assert!(lc.retry_due(4_000));
        assert!(!lc.retry_due(5_000));
        let events = lc.drain_events();
        assert_eq!(events.len(), 2);
        assert!(lc.drain_events().is_empty());
    }
}
