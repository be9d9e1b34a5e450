//! Checkpoint 3: Cannonball Accuracy
//!
//! Five shots at four floating targets; each shot has a flat 60% chance to
//! strike one of the targets still standing. Three hits pass.

use glam::Vec3;
use rand::Rng;

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound, vibration};
use crate::random_between;

pub const TARGET_COUNT: usize = 4;
pub const SHOTS_PER_ATTEMPT: u32 = 5;
pub const REQUIRED_HITS: u32 = 3;
pub const HIT_CHANCE: f64 = 0.6;
pub const RETRY_DELAY_MS: u64 = 3_000;

/// A target in AR space (metres, camera-relative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: usize,
    pub position: Vec3,
    pub hit: bool,
    pub visible: bool,
}

#[derive(Debug)]
pub struct CannonGame {
    lc: Lifecycle,
    targets: Vec<Target>,
    shots_remaining: u32,
    hits: u32,
}

impl Default for CannonGame {
    fn default() -> Self {
        Self::new()
    }
}

impl CannonGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(3),
            targets: Vec::new(),
            shots_remaining: SHOTS_PER_ATTEMPT,
            hits: 0,
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn shots_remaining(&self) -> u32 {
        self.shots_remaining
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    fn create_targets<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.targets = (0..TARGET_COUNT)
            .map(|id| Target {
                id,
                position: Vec3::new(
                    random_between(rng, -1.0, 1.0),
                    random_between(rng, 0.2, 0.8),
                    random_between(rng, -1.5, -0.5),
                ),
                hit: false,
                visible: true,
            })
            .collect();
    }

    fn fire<R: Rng + ?Sized>(&mut self, rng: &mut R, now: u64) {
        self.shots_remaining -= 1;

        let standing: Vec<usize> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.visible && !t.hit)
            .map(|(i, _)| i)
            .collect();

        if !standing.is_empty() && rng.random_bool(HIT_CHANCE) {
            let index = standing[rng.random_range(0..standing.len())];
            self.targets[index].hit = true;
            self.hits += 1;
            self.lc.cue(Cue::with_vibration(Sound::CannonHit, vibration::HIT));
        } else {
            self.lc.cue(Cue::sound(Sound::CannonMiss));
        }

        let over = self.shots_remaining == 0 || self.hits >= REQUIRED_HITS;
        if !over {
            let fired = SHOTS_PER_ATTEMPT - self.shots_remaining;
            self.lc.set_progress(fired as f32 * 20.0);
        } else if self.hits >= REQUIRED_HITS {
            self.lc.succeed(Cue::SUCCESS);
        } else {
            self.lc.set_progress(100.0);
            self.lc
                .fail("Not enough hits! You need 3 hits.", now, RETRY_DELAY_MS);
        }
    }
}

impl Minigame for CannonGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.shots_remaining = SHOTS_PER_ATTEMPT;
        self.hits = 0;
        self.create_targets(ctx.rng);
        self.lc.cue(Cue::sound(Sound::CannonReady));
    }

    /// Fire one shot
    fn handle_action(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.accepts_input() && self.shots_remaining > 0 {
            self.fire(ctx.rng, ctx.now);
        }
    }

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if self.lc.retry_due(ctx.now) {
            self.reset(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.shots_remaining = SHOTS_PER_ATTEMPT;
        self.hits = 0;
        self.create_targets(ctx.rng);
    }

    fn status_text(&self) -> String {
        format!(
            "Hits: {}/{}  Shots left: {}",
            self.hits, REQUIRED_HITS, self.shots_remaining
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minigames::test_support::{Harness, completions, failures};

    /// Fire until the attempt settles; returns shots fired
    fn play_out(game: &mut CannonGame, h: &mut Harness) -> u32 {
        let mut fired = 0;
        while game.lc.accepts_input() && game.shots_remaining() > 0 {
            game.handle_action(&mut h.ctx());
            fired += 1;
        }
        fired
    }

    #[test]
    fn test_targets_spawn_in_range() {
        let mut h = Harness::new(31);
        let mut game = CannonGame::new();
        game.initialize(&mut h.ctx());
        assert_eq!(game.targets().len(), TARGET_COUNT);
        for t in game.targets() {
            assert!((-1.0..1.0).contains(&t.position.x));
            assert!((0.2..0.8).contains(&t.position.y));
            assert!((-1.5..-0.5).contains(&t.position.z));
            assert!(t.visible && !t.hit);
        }
    }

    #[test]
    fn test_outcome_matches_hit_count_across_seeds() {
        let mut wins = 0;
        for seed in 0..200 {
            let mut h = Harness::new(seed);
            let mut game = CannonGame::new();
            game.initialize(&mut h.ctx());
            game.drain_events();

            let fired = play_out(&mut game, &mut h);
            assert!(fired <= SHOTS_PER_ATTEMPT);
            assert!(game.hits() as usize <= TARGET_COUNT);
            let hit_targets = game.targets().iter().filter(|t| t.hit).count();
            assert_eq!(hit_targets, game.hits() as usize);

            let events = game.drain_events();
            if game.hits() >= REQUIRED_HITS {
                wins += 1;
                assert_eq!(completions(&events).len(), 1);
                assert_eq!(completions(&events)[0].checkpoint, 3);
                assert!(!completions(&events)[0].earns_key);
            } else {
                assert_eq!(fired, SHOTS_PER_ATTEMPT);
                assert_eq!(failures(&events), 1);
            }
        }
        // P(>=3 of 5 at 60%) is about 68%
        assert!((100..180).contains(&wins), "wins = {}", wins);
    }

    #[test]
    fn test_failed_volley_regenerates_targets() {
        // Find a seed whose first volley fails
        let (mut game, mut h) = (0..500)
            .find_map(|seed| {
                let mut h = Harness::new(seed);
                let mut game = CannonGame::new();
                game.initialize(&mut h.ctx());
                play_out(&mut game, &mut h);
                (!game.is_completed()).then_some((game, h))
            })
            .unwrap();

        // Shooting is blocked until the retry
        let hits = game.hits();
        game.handle_action(&mut h.ctx());
        assert_eq!(game.hits(), hits);

        h.now += RETRY_DELAY_MS;
        game.update(&mut h.ctx());
        assert_eq!(game.shots_remaining(), SHOTS_PER_ATTEMPT);
        assert_eq!(game.hits(), 0);
        assert!(game.targets().iter().all(|t| !t.hit));
        assert_eq!(game.progress(), 0.0);
    }
}
