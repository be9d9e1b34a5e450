//! Checkpoint 5: Pirate's Balance
//!
//! Five coins sit on a virtual table steered by device tilt. Keep at least
//! one on the table for 10 seconds; losing all of them fails the attempt.

use glam::Vec2;
use rand::Rng;

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound};
use crate::platform::{ListenerId, SensorKind, SensorReading};
use crate::random_between;

pub const COIN_COUNT: usize = 5;
/// Survival window (ms)
pub const BALANCE_MS: u64 = 10_000;
pub const RETRY_DELAY_MS: u64 = 3_000;

/// Velocity gained per unit of tilt per reading
pub const TILT_GAIN: f32 = 0.01;
/// Velocity retained per reading
pub const FRICTION: f32 = 0.95;
/// A coin past this distance on either axis has fallen off
pub const TABLE_EDGE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coin {
    pub id: usize,
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_table: bool,
}

impl Coin {
    /// Advance one physics step; returns true if the coin just fell off
    fn step(&mut self, tilt: Vec2) -> bool {
        if !self.on_table {
            return false;
        }
        self.vel += tilt * TILT_GAIN;
        self.vel *= FRICTION;
        self.pos += self.vel;
        if self.pos.x.abs() > TABLE_EDGE || self.pos.y.abs() > TABLE_EDGE {
            self.on_table = false;
            return true;
        }
        false
    }
}

#[derive(Debug)]
pub struct BalanceGame {
    lc: Lifecycle,
    coins: Vec<Coin>,
    tilt: Vec2,
    started_at: u64,
    listener: Option<ListenerId>,
}

impl Default for BalanceGame {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(5),
            coins: Vec::new(),
            tilt: Vec2::ZERO,
            started_at: 0,
            listener: None,
        }
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn coins_on_table(&self) -> usize {
        self.coins.iter().filter(|c| c.on_table).count()
    }

    pub fn tilt(&self) -> Vec2 {
        self.tilt
    }

    /// Time left in the window (ms)
    pub fn time_left(&self, now: u64) -> u64 {
        BALANCE_MS.saturating_sub(now.saturating_sub(self.started_at))
    }

    fn create_coins<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.coins = (0..COIN_COUNT)
            .map(|id| Coin {
                id,
                pos: Vec2::new(random_between(rng, -0.5, 0.5), 0.5),
                vel: Vec2::ZERO,
                on_table: true,
            })
            .collect();
    }

    fn step_coins(&mut self) {
        let tilt = self.tilt;
        let dropped = self
            .coins
            .iter_mut()
            .map(|c| c.step(tilt))
            .filter(|&fell| fell)
            .count();
        for _ in 0..dropped {
            self.lc.cue(Cue::sound(Sound::CoinDrop));
        }
    }

    fn check_state(&mut self, now: u64) {
        if !self.lc.accepts_input() {
            return;
        }
        let elapsed = now.saturating_sub(self.started_at);
        self.lc
            .set_progress(elapsed as f32 / BALANCE_MS as f32 * 100.0);

        if self.coins_on_table() == 0 {
            self.lc.fail(
                "All coins fell! Try to keep them balanced.",
                now,
                RETRY_DELAY_MS,
            );
        } else if elapsed >= BALANCE_MS {
            self.lc.succeed(Cue::SUCCESS);
        }
    }
}

impl Minigame for BalanceGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.tilt = Vec2::ZERO;
        self.create_coins(ctx.rng);
        if self.listener.is_none() {
            self.listener = ctx.sensors.subscribe(SensorKind::Motion);
        }
        self.started_at = ctx.now;
        self.lc.cue(Cue::sound(Sound::Coins));
    }

    /// Balancing is tilt-only
    fn handle_action(&mut self, _ctx: &mut MinigameContext<'_>) {}

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.retry_due(ctx.now) {
            self.reset(ctx);
        }

        if let Some(id) = self.listener {
            for reading in ctx.sensors.drain(id) {
                if let SensorReading::Motion(m) = reading {
                    self.tilt = Vec2::new(m.x.unwrap_or(0.0), m.y.unwrap_or(0.0));
                    if self.lc.accepts_input() {
                        self.step_coins();
                        self.check_state(m.at);
                    }
                }
            }
        }
        self.check_state(ctx.now);
    }

    fn cleanup(&mut self, ctx: &mut MinigameContext<'_>) {
        if let Some(id) = self.listener.take() {
            ctx.sensors.unsubscribe(id);
        }
        self.lc.deactivate();
    }

    /// Respawn the coins and restart the window
    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.create_coins(ctx.rng);
        self.started_at = ctx.now;
    }

    fn status_text(&self) -> String {
        format!(
            "Coins: {}/{}  Tilt: X={:.1} Y={:.1}",
            self.coins_on_table(),
            COIN_COUNT,
            self.tilt.x,
            self.tilt.y
        )
    }

    fn required_sensor(&self) -> Option<SensorKind> {
        Some(SensorKind::Motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minigames::test_support::{Harness, completions, failures};
    use crate::platform::MotionReading;

    fn tilted(x: f32, y: f32, at: u64) -> SensorReading {
        SensorReading::Motion(MotionReading {
            x: Some(x),
            y: Some(y),
            at,
        })
    }

    fn started(seed: u64) -> (BalanceGame, Harness) {
        let mut h = Harness::new(seed);
        let mut game = BalanceGame::new();
        game.initialize(&mut h.ctx());
        game.drain_events();
        (game, h)
    }

    #[test]
    fn test_coins_spawn_on_table() {
        let (game, _) = started(51);
        assert_eq!(game.coins().len(), COIN_COUNT);
        for c in game.coins() {
            assert!((-0.5..0.5).contains(&c.pos.x));
            assert_eq!(c.pos.y, 0.5);
            assert!(c.on_table);
        }
    }

    #[test]
    fn test_coin_step_applies_tilt_and_friction() {
        let mut coin = Coin {
            id: 0,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            on_table: true,
        };
        assert!(!coin.step(Vec2::new(10.0, 0.0)));
        assert!((coin.vel.x - 0.095).abs() < 1e-6);
        assert!((coin.pos.x - 0.095).abs() < 1e-6);
        assert_eq!(coin.pos.y, 0.0);
    }

    #[test]
    fn test_level_table_survives_window() {
        let (mut game, mut h) = started(52);
        for t in (500..BALANCE_MS).step_by(500) {
            h.sensors.dispatch(tilted(0.0, 0.0, t));
            h.now = t;
            game.update(&mut h.ctx());
        }
        assert!(!game.is_completed());
        assert!((game.progress() - 95.0).abs() < 1e-3);

        h.now = BALANCE_MS;
        game.update(&mut h.ctx());
        assert!(game.is_completed());
        assert_eq!(game.coins_on_table(), COIN_COUNT);
        let done = completions(&game.drain_events());
        assert_eq!(done.len(), 1);
        assert!(!done[0].earns_key);
    }

    #[test]
    fn test_all_coins_falling_fails_then_respawns() {
        let (mut game, mut h) = started(53);
        // Hard tilt towards the top edge
        for i in 1..=20 {
            h.sensors.dispatch(tilted(0.0, 9.8, i * 50));
        }
        h.now = 1_000;
        game.update(&mut h.ctx());
        assert_eq!(game.coins_on_table(), 0);
        let events = game.drain_events();
        assert_eq!(failures(&events), 1);
        let drops = events
            .iter()
            .filter(|e| {
                matches!(e, crate::minigames::MinigameEvent::Cue(c) if c.sound == Sound::CoinDrop)
            })
            .count();
        assert_eq!(drops, COIN_COUNT);

        // Readings during the pause do not move anything
        h.sensors.dispatch(tilted(0.0, -9.8, 1_100));
        h.now = 1_100;
        game.update(&mut h.ctx());
        assert!(completions(&game.drain_events()).is_empty());

        h.now = 1_000 + RETRY_DELAY_MS;
        game.update(&mut h.ctx());
        assert_eq!(game.coins_on_table(), COIN_COUNT);
        assert_eq!(game.time_left(h.now), BALANCE_MS);
        assert!(game.progress() < 1.0);
    }

    #[test]
    fn test_one_coin_left_still_passes() {
        let (mut game, mut h) = started(54);
        for (i, coin) in game.coins.iter_mut().enumerate() {
            if i > 0 {
                coin.on_table = false;
            }
        }
        h.now = BALANCE_MS;
        game.update(&mut h.ctx());
        assert!(game.is_completed());
    }
}
