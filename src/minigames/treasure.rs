//! Checkpoint 8: The Lost Loot
//!
//! Needs all three golden keys. Each tap turns one key and the fourth opens
//! the chest. Reporting the finished hunt is the session's job.

use super::{Lifecycle, Minigame, MinigameContext, MinigameEvent};
use crate::consts::KEY_COUNT;
use crate::feedback::{Cue, Sound, vibration};

/// Delay between the last key turn and the unlock cue (ms)
pub const UNLOCK_DELAY_MS: u64 = 1_000;

pub const LOCKED_MESSAGE: &str = "You need all 3 golden keys to open the treasure!";

#[derive(Debug)]
pub struct TreasureGame {
    lc: Lifecycle,
    keys_held: usize,
    keys_used: u8,
    opened: bool,
    unlock_at: Option<u64>,
}

impl Default for TreasureGame {
    fn default() -> Self {
        Self::new()
    }
}

impl TreasureGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(8),
            keys_held: 0,
            keys_used: 0,
            opened: false,
            unlock_at: None,
        }
    }

    /// All keys were present when the attempt started
    pub fn is_unlocked(&self) -> bool {
        self.keys_held >= KEY_COUNT as usize
    }

    pub fn keys_used(&self) -> u8 {
        self.keys_used
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    fn use_key(&mut self, now: u64) {
        self.keys_used += 1;
        self.lc
            .set_progress(f32::from(self.keys_used) / f32::from(KEY_COUNT) * 100.0);
        self.lc
            .cue(Cue::with_vibration(Sound::KeyTurn, vibration::GOOD));
        if self.keys_used == KEY_COUNT {
            self.unlock_at = Some(now + UNLOCK_DELAY_MS);
        }
    }

    fn open(&mut self) {
        self.opened = true;
        self.lc.succeed(Cue::with_vibration(
            Sound::TreasureFound,
            vibration::TREASURE,
        ));
    }
}

impl Minigame for TreasureGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.keys_held = ctx.keys_collected;
        self.keys_used = 0;
        self.opened = false;
        self.unlock_at = None;

        if !self.is_unlocked() {
            log::info!(
                "Treasure locked: {}/{} keys collected",
                self.keys_held,
                KEY_COUNT
            );
            self.lc.emit(MinigameEvent::Notice(LOCKED_MESSAGE.to_string()));
            return;
        }
        self.lc.cue(Cue::sound(Sound::TreasureReveal));
    }

    /// Turn the next key, then open the chest
    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>) {
        if !self.is_unlocked() || !self.lc.accepts_input() || self.opened {
            return;
        }
        if self.keys_used < KEY_COUNT {
            self.use_key(ctx.now);
        } else {
            self.open();
        }
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.unlock_at.is_some_and(|at| ctx.now >= at) {
            self.unlock_at = None;
            self.lc
                .cue(Cue::with_vibration(Sound::Unlock, vibration::TRIPLE));
        }
    }

    fn cleanup(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.unlock_at = None;
        self.lc.deactivate();
    }

    /// Nothing to retry; keys go back in their slots
    fn reset(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.keys_used = 0;
        self.opened = false;
        self.unlock_at = None;
    }

    fn status_text(&self) -> String {
        if !self.is_unlocked() {
            return format!(
                "You need 3 keys to open the treasure ({}/{} collected)",
                self.keys_held, KEY_COUNT
            );
        }
        if self.opened {
            "The Lost Loot is yours!".to_string()
        } else if self.keys_used < KEY_COUNT {
            format!("Keys used: {}/{}", self.keys_used, KEY_COUNT)
        } else {
            "Open the treasure!".to_string()
        }
    }
}
