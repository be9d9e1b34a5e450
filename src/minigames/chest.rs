//! Checkpoint 4: Treasure Chest Lock
//!
//! A random 4-symbol combination is shown for 3 seconds, then must be
//! entered in exact order. A wrong combination shows a new one after 2 s.

use rand::Rng;

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound, vibration};

pub const SEQUENCE_LENGTH: usize = 4;
/// How long the combination is shown before input opens (ms)
pub const MEMORIZE_MS: u64 = 3_000;
pub const RETRY_DELAY_MS: u64 = 2_000;

/// Lock symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Anchor,
    Sword,
    Gem,
    Flag,
    Parrot,
    Wave,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Anchor,
        Symbol::Sword,
        Symbol::Gem,
        Symbol::Flag,
        Symbol::Parrot,
        Symbol::Wave,
    ];

    pub fn glyph(&self) -> &'static str {
        match self {
            Symbol::Anchor => "⚓",
            Symbol::Sword => "🗡️",
            Symbol::Gem => "💎",
            Symbol::Flag => "🏴‍☠️",
            Symbol::Parrot => "🦜",
            Symbol::Wave => "🌊",
        }
    }
}

#[derive(Debug)]
pub struct ChestLockGame {
    lc: Lifecycle,
    sequence: Vec<Symbol>,
    entered: Vec<Symbol>,
    /// Input opens at this time; `None` once open
    input_opens_at: Option<u64>,
}

impl Default for ChestLockGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ChestLockGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(4),
            sequence: Vec::new(),
            entered: Vec::new(),
            input_opens_at: None,
        }
    }

    /// The combination to reproduce
    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    pub fn entered(&self) -> &[Symbol] {
        &self.entered
    }

    /// Still in the memorize window
    pub fn is_memorizing(&self) -> bool {
        self.input_opens_at.is_some()
    }

    fn generate_sequence<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.sequence = (0..SEQUENCE_LENGTH)
            .map(|_| Symbol::ALL[rng.random_range(0..Symbol::ALL.len())])
            .collect();
    }

    fn show_sequence(&mut self, now: u64) {
        self.entered.clear();
        self.input_opens_at = Some(now + MEMORIZE_MS);
        log::debug!("Sequence to remember: {:?}", self.sequence);
    }

    fn start_input(&mut self) {
        self.input_opens_at = None;
        self.entered.clear();
        self.lc.set_progress(0.0);
    }

    /// Enter the next symbol; returns whether it was accepted
    pub fn add_symbol(&mut self, symbol: Symbol, ctx: &mut MinigameContext<'_>) -> bool {
        if !self.lc.accepts_input()
            || self.is_memorizing()
            || self.entered.len() >= SEQUENCE_LENGTH
        {
            return false;
        }

        self.entered.push(symbol);
        self.lc
            .set_progress(self.entered.len() as f32 / SEQUENCE_LENGTH as f32 * 100.0);
        self.lc.cue(Cue::sound(Sound::Click));

        if self.entered.len() == SEQUENCE_LENGTH {
            self.check_sequence(ctx.now);
        }
        true
    }

    fn check_sequence(&mut self, now: u64) {
        if self.entered == self.sequence {
            self.lc.succeed(Cue::SUCCESS);
        } else {
            self.lc
                .cue(Cue::with_vibration(Sound::Incorrect, vibration::TRIPLE));
            self.lc.fail("Wrong sequence! Try again.", now, RETRY_DELAY_MS);
        }
    }
}

impl Minigame for ChestLockGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.generate_sequence(ctx.rng);
        self.show_sequence(ctx.now);
        self.lc.cue(Cue::sound(Sound::ChestOpen));
    }

    /// Skip the rest of the memorize window
    fn handle_action(&mut self, _ctx: &mut MinigameContext<'_>) {
        if self.lc.accepts_input() && self.is_memorizing() {
            self.start_input();
        }
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.retry_due(ctx.now) {
            self.reset(ctx);
            return;
        }
        if let Some(at) = self.input_opens_at
            && ctx.now >= at
        {
            self.start_input();
        }
    }

    /// New combination, shown again from the start
    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.generate_sequence(ctx.rng);
        self.show_sequence(ctx.now);
    }

    fn status_text(&self) -> String {
        if self.is_memorizing() {
            let glyphs: Vec<&str> = self.sequence.iter().map(Symbol::glyph).collect();
            format!("Remember: {}", glyphs.join(" "))
        } else {
            format!("Entered {}/{}", self.entered.len(), SEQUENCE_LENGTH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minigames::test_support::{Harness, completions, failures};
    use crate::minigames::Completion;

    fn open_for_input(seed: u64) -> (ChestLockGame, Harness) {
        let mut h = Harness::new(seed);
        let mut game = ChestLockGame::new();
        game.initialize(&mut h.ctx());
        assert!(game.is_memorizing());
        h.now = MEMORIZE_MS;
        game.update(&mut h.ctx());
        assert!(!game.is_memorizing());
        game.drain_events();
        (game, h)
    }

    fn wrong_symbol(s: Symbol) -> Symbol {
        if s == Symbol::Anchor { Symbol::Wave } else { Symbol::Anchor }
    }

    #[test]
    fn test_sequence_uses_alphabet() {
        let (game, _) = open_for_input(41);
        assert_eq!(game.sequence().len(), SEQUENCE_LENGTH);
        assert!(game.sequence().iter().all(|s| Symbol::ALL.contains(s)));
    }

    #[test]
    fn test_input_blocked_while_memorizing() {
        let mut h = Harness::new(42);
        let mut game = ChestLockGame::new();
        game.initialize(&mut h.ctx());
        assert!(!game.add_symbol(Symbol::Gem, &mut h.ctx()));
        // The trigger skips ahead
        game.handle_action(&mut h.ctx());
        assert!(game.add_symbol(Symbol::Gem, &mut h.ctx()));
    }

    #[test]
    fn test_exact_order_unlocks_with_key() {
        let (mut game, mut h) = open_for_input(43);
        let sequence = game.sequence().to_vec();
        for (i, s) in sequence.iter().enumerate() {
            assert!(game.add_symbol(*s, &mut h.ctx()));
            assert_eq!(game.progress(), (i + 1) as f32 * 25.0);
        }
        assert!(game.is_completed());
        assert_eq!(
            completions(&game.drain_events()),
            vec![Completion { checkpoint: 4, earns_key: true }]
        );
        assert!(!game.add_symbol(Symbol::Gem, &mut h.ctx()));
    }

    #[test]
    fn test_wrong_sequence_regenerates_and_reshows() {
        let (mut game, mut h) = open_for_input(44);
        let mut attempt = game.sequence().to_vec();
        attempt[3] = wrong_symbol(attempt[3]);
        for s in &attempt {
            game.add_symbol(*s, &mut h.ctx());
        }
        let events = game.drain_events();
        assert_eq!(failures(&events), 1);
        assert!(completions(&events).is_empty());

        h.now += RETRY_DELAY_MS;
        game.update(&mut h.ctx());
        assert!(game.is_memorizing());
        assert!(game.entered().is_empty());
        assert_eq!(game.progress(), 0.0);
        assert!(game.status_text().starts_with("Remember:"));
    }
}
