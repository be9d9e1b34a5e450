//! Checkpoint 6: Skeleton Duel
//!
//! Five reaction rounds. After a random 2-5 s wait the skeleton attacks;
//! tapping within 800 ms wins the round, and the prompt lapses after 1 s.
//! Three wins pass.

use rand_pcg::Pcg32;

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound, vibration};
use crate::random_between;

pub const TOTAL_ROUNDS: u32 = 5;
pub const REQUIRED_WINS: u32 = 3;
/// Attack delay range (ms)
pub const MIN_ATTACK_DELAY_MS: f32 = 2_000.0;
pub const MAX_ATTACK_DELAY_MS: f32 = 5_000.0;
/// Reactions strictly below this win the round
pub const WIN_REACTION_MS: u64 = 800;
/// The prompt lapses as a loss after this long
pub const PROMPT_TIMEOUT_MS: u64 = 1_000;
pub const BETWEEN_ROUNDS_MS: u64 = 1_500;
pub const RETRY_DELAY_MS: u64 = 3_000;

/// Round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelPhase {
    Idle,
    /// Skeleton attacks at `attack_at`
    Waiting { attack_at: u64 },
    /// Attack on screen since `shown_at`
    Prompted { shown_at: u64 },
    /// Next round starts at `next_at`
    Between { next_at: u64 },
    Finished,
}

#[derive(Debug)]
pub struct DuelGame {
    lc: Lifecycle,
    phase: DuelPhase,
    round: u32,
    wins: u32,
    last_reaction: Option<u64>,
}

impl Default for DuelGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DuelGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(6),
            phase: DuelPhase::Idle,
            round: 0,
            wins: 0,
            last_reaction: None,
        }
    }

    pub fn phase(&self) -> DuelPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn last_reaction(&self) -> Option<u64> {
        self.last_reaction
    }

    /// When the pending attack will be shown
    pub fn attack_at(&self) -> Option<u64> {
        match self.phase {
            DuelPhase::Waiting { attack_at } => Some(attack_at),
            _ => None,
        }
    }

    pub fn is_prompted(&self) -> bool {
        matches!(self.phase, DuelPhase::Prompted { .. })
    }

    fn start_next_round(&mut self, from: u64, rng: &mut Pcg32) {
        self.round += 1;
        let delay = random_between(rng, MIN_ATTACK_DELAY_MS, MAX_ATTACK_DELAY_MS) as u64;
        self.phase = DuelPhase::Waiting {
            attack_at: from + delay,
        };
        log::debug!("Duel round {} attack in {} ms", self.round, delay);
    }

    fn restart_rounds(&mut self, now: u64, rng: &mut Pcg32) {
        self.round = 0;
        self.wins = 0;
        self.last_reaction = None;
        self.start_next_round(now, rng);
    }

    /// Fire every transition due by `now`, each at its scheduled time
    fn advance(&mut self, now: u64, rng: &mut Pcg32) {
        loop {
            match self.phase {
                DuelPhase::Waiting { attack_at } if now >= attack_at => {
                    self.phase = DuelPhase::Prompted {
                        shown_at: attack_at,
                    };
                    self.lc
                        .cue(Cue::with_vibration(Sound::SwordClash, vibration::TAP));
                }
                DuelPhase::Prompted { shown_at } if now >= shown_at + PROMPT_TIMEOUT_MS => {
                    self.resolve(None, shown_at + PROMPT_TIMEOUT_MS);
                }
                DuelPhase::Between { next_at } if now >= next_at => {
                    self.start_next_round(next_at, rng);
                }
                _ => break,
            }
        }
    }

    /// Settle the current round; `reaction` is `None` when the prompt lapsed
    fn resolve(&mut self, reaction: Option<u64>, at: u64) {
        self.last_reaction = reaction;
        if reaction.is_some_and(|ms| ms < WIN_REACTION_MS) {
            self.wins += 1;
            self.lc
                .cue(Cue::with_vibration(Sound::Victory, vibration::GOOD));
        } else {
            self.lc.cue(Cue::sound(Sound::Defeat));
        }

        self.lc
            .set_progress(self.round as f32 / TOTAL_ROUNDS as f32 * 100.0);

        if self.round < TOTAL_ROUNDS {
            self.phase = DuelPhase::Between {
                next_at: at + BETWEEN_ROUNDS_MS,
            };
            return;
        }

        self.phase = DuelPhase::Finished;
        if self.wins >= REQUIRED_WINS {
            self.lc.succeed(Cue::SUCCESS);
        } else {
            self.lc.fail(
                "Not enough wins! You need 3 victories.",
                at,
                RETRY_DELAY_MS,
            );
        }
    }
}

impl Minigame for DuelGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.restart_rounds(ctx.now, ctx.rng);
        self.lc.cue(Cue::sound(Sound::DuelStart));
    }

    /// Parry
    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>) {
        if !self.lc.accepts_input() {
            return;
        }
        // A lapsed prompt counts as missed even if update has not run yet
        self.advance(ctx.now, ctx.rng);
        if let DuelPhase::Prompted { shown_at } = self.phase {
            self.resolve(Some(ctx.now.saturating_sub(shown_at)), ctx.now);
        }
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.retry_due(ctx.now) {
            self.reset(ctx);
        }
        if self.lc.accepts_input() {
            self.advance(ctx.now, ctx.rng);
        }
    }

    fn cleanup(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.phase = DuelPhase::Idle;
        self.lc.deactivate();
    }

    /// Back to round one with the first attack rescheduled
    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.restart_rounds(ctx.now, ctx.rng);
    }

    fn status_text(&self) -> String {
        let prompt = if self.is_prompted() {
            "TAP NOW!"
        } else {
            "Get ready..."
        };
        format!(
            "Round: {}/{}  Wins: {}/{}  {}",
            self.round, TOTAL_ROUNDS, self.wins, REQUIRED_WINS, prompt
        )
    }
}
