//! Lost Loot entry point
//!
//! Web: installs the console logger and panic hook; the page drives
//! `WebHunt`. Native: plays one scripted hunt offline and logs it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Lost Loot starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), lost_loot::HuntError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lost Loot (native) starting...");
    log::info!("Playing a scripted offline hunt");

    demo::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::rc::Rc;

    use lost_loot::minigames::ActiveMinigame;
    use lost_loot::platform::{
        ManualClock, MemoryStorage, MotionReading, OrientationReading, SensorReading,
    };
    use lost_loot::remote::OfflineTransport;
    use lost_loot::{HuntError, HuntSession, Settings, format_elapsed, normalize_degrees};

    type Session = HuntSession<MemoryStorage, OfflineTransport>;

    /// Frame step of the simulated presentation loop (ms)
    const FRAME_MS: u64 = 50;
    /// Give up on a checkpoint after this much simulated time
    const CHECKPOINT_LIMIT_MS: u64 = 120_000;

    struct Demo {
        session: Session,
        clock: Rc<ManualClock>,
    }

    impl Demo {
        fn frame(&mut self) {
            self.clock.advance(FRAME_MS);
            self.session.tick();
            for message in self.session.drain_messages() {
                log::info!("  \"{}\"", message);
            }
            self.session.drain_playback();
        }

        fn now(&self) -> u64 {
            use lost_loot::platform::Clock;
            self.clock.now_ms()
        }

        fn done(&self, checkpoint: u8) -> bool {
            self.session.record().is_completed(checkpoint)
        }

        /// Run frames, calling `play` before each, until the checkpoint is won
        fn play_until_done(&mut self, checkpoint: u8, mut play: impl FnMut(&mut Self)) -> bool {
            let deadline = self.now() + CHECKPOINT_LIMIT_MS;
            while !self.done(checkpoint) && self.now() < deadline {
                play(self);
                self.frame();
            }
            self.done(checkpoint)
        }
    }

    pub fn run() -> Result<(), HuntError> {
        let clock = Rc::new(ManualClock::new(1_700_000_000_000));
        let session = HuntSession::new(
            MemoryStorage::new(),
            OfflineTransport,
            clock.clone(),
            Settings::for_host("localhost"),
            7,
        );
        let mut demo = Demo { session, clock };

        let record = demo.session.start("DEMO42")?;
        log::info!("Team {:?} started", record.team_id());

        for checkpoint in 1..=8u8 {
            demo.session.enter_checkpoint(checkpoint)?;
            demo.session.drain_messages();
            log::info!(
                "Checkpoint {}: {}",
                checkpoint,
                demo.session.status_text().unwrap_or_default()
            );

            let won = match checkpoint {
                1 => demo.play_until_done(1, steer_compass),
                2 => demo.play_until_done(2, answer_quiz),
                3 => demo.play_until_done(3, |d| d.session.handle_action()),
                4 => demo.play_until_done(4, enter_combination),
                5 => demo.play_until_done(5, hold_level),
                6 => demo.play_until_done(6, parry),
                7 => demo.play_until_done(7, |d| d.session.handle_action()),
                _ => demo.play_until_done(8, |d| d.session.handle_action()),
            };
            if !won {
                log::warn!("Checkpoint {} not won, stopping", checkpoint);
                break;
            }

            let stats = demo.session.stats();
            log::info!(
                "Checkpoint {} done at {} ({}/{} keys, {:.0}%)",
                checkpoint,
                format_elapsed(stats.elapsed_time),
                stats.keys_collected,
                stats.total_keys,
                stats.completion_percentage
            );
        }

        // Let the treasure report the finished hunt
        for _ in 0..60 {
            if demo.session.is_finished() {
                break;
            }
            demo.frame();
        }

        for (rank, entry) in demo.session.leaderboard().iter().enumerate() {
            log::info!(
                "#{} {} in {}",
                rank + 1,
                entry.team_id,
                format_elapsed(entry.completion_ms)
            );
        }
        log::info!("Final state:\n{}", demo.session.progression().export_json());
        Ok(())
    }

    fn steer_compass(demo: &mut Demo) {
        let Some(ActiveMinigame::Compass(compass)) = demo.session.active() else {
            return;
        };
        let reading = OrientationReading {
            alpha: Some(normalize_degrees(360.0 - compass.target_heading())),
            at: demo.now(),
            ..Default::default()
        };
        demo.session
            .dispatch_reading(SensorReading::Orientation(reading));
    }

    fn answer_quiz(demo: &mut Demo) {
        let Some(ActiveMinigame::Quiz(quiz)) = demo.session.active() else {
            return;
        };
        if let Some(question) = quiz.current_question() {
            demo.session.select_answer(question.correct);
            demo.session.handle_action();
        }
    }

    fn enter_combination(demo: &mut Demo) {
        let Some(ActiveMinigame::Chest(chest)) = demo.session.active() else {
            return;
        };
        if chest.is_memorizing() {
            return;
        }
        let next = chest.entered().len();
        if let Some(&symbol) = chest.sequence().get(next) {
            demo.session.add_symbol(symbol);
        }
    }

    fn hold_level(demo: &mut Demo) {
        let reading = MotionReading {
            x: Some(0.0),
            y: Some(0.0),
            at: demo.now(),
        };
        demo.session.dispatch_reading(SensorReading::Motion(reading));
    }

    fn parry(demo: &mut Demo) {
        let Some(ActiveMinigame::Duel(duel)) = demo.session.active() else {
            return;
        };
        // Parry one frame after the attack shows
        if duel.is_prompted() {
            demo.session.handle_action();
        }
    }
}
