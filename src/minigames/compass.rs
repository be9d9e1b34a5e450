//! Checkpoint 1: Captain's Compass
//!
//! Point the device at a random heading (±15°) and hold it for 3 seconds.
//! Drifting off target restarts the hold; there is no failure state.

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound};
use crate::platform::{ListenerId, SensorKind, SensorReading};
use crate::{compass_heading, heading_difference, random_int};

/// Allowed deviation from the target heading (degrees)
pub const TOLERANCE_DEG: f32 = 15.0;
/// Continuous alignment needed (ms)
pub const HOLD_MS: u64 = 3_000;

#[derive(Debug)]
pub struct CompassGame {
    lc: Lifecycle,
    target_heading: f32,
    current_heading: f32,
    hold_started: Option<u64>,
    listener: Option<ListenerId>,
}

impl Default for CompassGame {
    fn default() -> Self {
        Self::new()
    }
}

impl CompassGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(1),
            target_heading: 0.0,
            current_heading: 0.0,
            hold_started: None,
            listener: None,
        }
    }

    pub fn target_heading(&self) -> f32 {
        self.target_heading
    }

    pub fn current_heading(&self) -> f32 {
        self.current_heading
    }

    pub fn is_aligned(&self) -> bool {
        heading_difference(self.current_heading, self.target_heading) <= TOLERANCE_DEG
    }

    fn check_alignment(&mut self, now: u64) {
        if !self.lc.accepts_input() {
            return;
        }
        if !self.is_aligned() {
            self.hold_started = None;
            self.lc.set_progress(0.0);
            return;
        }

        let started = *self.hold_started.get_or_insert(now);
        let held = now.saturating_sub(started);
        self.lc.set_progress(held as f32 / HOLD_MS as f32 * 100.0);
        if held >= HOLD_MS {
            self.lc.succeed(Cue::SUCCESS);
        }
    }
}

impl Minigame for CompassGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.hold_started = None;
        self.target_heading = random_int(ctx.rng, 0, 359) as f32;
        if self.listener.is_none() {
            self.listener = ctx.sensors.subscribe(SensorKind::Orientation);
        }
        self.lc.cue(Cue::sound(Sound::CompassStart));
    }

    /// No tap interaction; the compass is steered by orientation alone
    fn handle_action(&mut self, _ctx: &mut MinigameContext<'_>) {}

    fn update(&mut self, ctx: &mut MinigameContext<'_>) {
        if let Some(id) = self.listener {
            for reading in ctx.sensors.drain(id) {
                if let SensorReading::Orientation(r) = reading {
                    self.current_heading = compass_heading(r.alpha);
                    log::debug!("Compass heading {:.1}", self.current_heading);
                    self.check_alignment(r.at);
                }
            }
        }
        // The hold keeps counting between readings
        if self.hold_started.is_some() {
            self.check_alignment(ctx.now);
        }
    }

    fn cleanup(&mut self, ctx: &mut MinigameContext<'_>) {
        if let Some(id) = self.listener.take() {
            ctx.sensors.unsubscribe(id);
        }
        self.lc.deactivate();
    }

    fn reset(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        self.hold_started = None;
    }

    fn status_text(&self) -> String {
        if self.lc.is_completed() {
            "Heading locked!".to_string()
        } else if self.is_aligned() {
            "ALIGNED - hold steady".to_string()
        } else {
            let off = heading_difference(self.current_heading, self.target_heading);
            format!("{}° off course", off.round())
        }
    }

    fn required_sensor(&self) -> Option<SensorKind> {
        Some(SensorKind::Orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minigames::test_support::{Harness, completions};
    use crate::minigames::Completion;
    use crate::normalize_degrees;
    use crate::platform::OrientationReading;

    /// Orientation reading whose compass heading equals `heading`
    fn facing(heading: f32, at: u64) -> SensorReading {
        SensorReading::Orientation(OrientationReading {
            alpha: Some(normalize_degrees(360.0 - heading)),
            at,
            ..Default::default()
        })
    }

    fn started(seed: u64) -> (CompassGame, Harness) {
        let mut h = Harness::new(seed);
        let mut game = CompassGame::new();
        game.initialize(&mut h.ctx());
        game.drain_events();
        (game, h)
    }

    #[test]
    fn test_hold_three_seconds_completes_with_key() {
        let (mut game, mut h) = started(11);
        let target = game.target_heading();

        h.sensors.dispatch(facing(target + 10.0, 1_000));
        h.now = 1_000;
        game.update(&mut h.ctx());
        assert!(game.is_aligned());
        assert_eq!(game.progress(), 0.0);

        h.now = 2_500;
        game.update(&mut h.ctx());
        assert_eq!(game.progress(), 50.0);
        assert!(completions(&game.drain_events()).is_empty());

        h.now = 4_000;
        game.update(&mut h.ctx());
        assert!(game.is_completed());
        assert_eq!(game.progress(), 100.0);
        assert_eq!(
            completions(&game.drain_events()),
            vec![Completion { checkpoint: 1, earns_key: true }]
        );

        // No second completion
        h.now = 9_000;
        game.update(&mut h.ctx());
        assert!(completions(&game.drain_events()).is_empty());
    }

    #[test]
    fn test_drifting_off_restarts_hold() {
        let (mut game, mut h) = started(12);
        let target = game.target_heading();

        h.sensors.dispatch(facing(target, 0));
        h.sensors.dispatch(facing(target + 40.0, 2_000));
        h.sensors.dispatch(facing(target - 5.0, 2_100));
        h.now = 2_100;
        game.update(&mut h.ctx());
        assert_eq!(game.progress(), 0.0);

        h.now = 5_000;
        game.update(&mut h.ctx());
        assert!(!game.is_completed());

        h.now = 5_100;
        game.update(&mut h.ctx());
        assert!(game.is_completed());
    }

    #[test]
    fn test_tolerance_edge() {
        let (mut game, mut h) = started(13);
        let target = game.target_heading();
        h.sensors.dispatch(facing(target + 16.0, 0));
        game.update(&mut h.ctx());
        assert!(!game.is_aligned());
        assert!(game.status_text().contains("off course"));
    }

    #[test]
    fn test_cleanup_revokes_listener() {
        let (mut game, mut h) = started(14);
        assert_eq!(h.sensors.listener_count(), 1);
        game.cleanup(&mut h.ctx());
        assert_eq!(h.sensors.listener_count(), 0);
        let target = game.target_heading();
        assert_eq!(h.sensors.dispatch(facing(target, 0)), 0);
        game.cleanup(&mut h.ctx());
    }

    #[test]
    fn test_without_orientation_sensor() {
        let mut h = Harness::new(15);
        h.sensors = crate::platform::SensorHub::unavailable();
        let mut game = CompassGame::new();
        game.initialize(&mut h.ctx());
        assert!(game.is_active());
        assert_eq!(h.sensors.listener_count(), 0);
        game.update(&mut h.ctx());
        assert!(!game.is_completed());
    }
}
