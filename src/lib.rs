//! Lost Loot - an AR pirate scavenger hunt
//!
//! Core modules:
//! - `progression`: Checkpoint progression state machine (gating, keys, completion)
//! - `minigames`: The eight checkpoint minigames behind one lifecycle contract
//! - `session`: Orchestration glue between the active minigame and progression
//! - `persistence`: Durable progression record with corruption recovery
//! - `remote`: Best-effort backend client with fallback results
//! - `platform`: Clock, storage and sensor abstractions (browser/native)

pub mod error;
pub mod feedback;
pub mod leaderboard;
pub mod minigames;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod remote;
pub mod session;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{HuntError, RemoteUnavailable, StorageError};
pub use leaderboard::Leaderboard;
pub use progression::{GameStats, Progression, ProgressionPhase, ProgressionRecord};
pub use session::HuntSession;
pub use settings::Settings;

use rand::Rng;
use rand::seq::SliceRandom;

/// Game configuration constants
pub mod consts {
    /// Number of sequential checkpoints in a hunt
    pub const CHECKPOINT_COUNT: u8 = 8;
    /// Number of golden keys needed for the treasure
    pub const KEY_COUNT: u8 = 3;
    /// Checkpoints that award a key, in key order
    pub const KEY_CHECKPOINTS: [u8; 3] = [1, 4, 7];
    /// The treasure checkpoint
    pub const FINAL_CHECKPOINT: u8 = 8;

    /// Generic remote request ceiling (ms)
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
    /// Capability probe ceiling (ms)
    pub const PROBE_TIMEOUT_MS: u64 = 5_000;
    /// Capability probe poll interval (ms)
    pub const PROBE_INTERVAL_MS: u64 = 100;

    /// Team ids are 3-20 ASCII alphanumerics
    pub const TEAM_ID_MIN_LEN: usize = 3;
    pub const TEAM_ID_MAX_LEN: usize = 20;
}

/// Whether `n` names a real checkpoint (1..=8)
#[inline]
pub fn is_valid_checkpoint(n: u8) -> bool {
    (1..=consts::CHECKPOINT_COUNT).contains(&n)
}

/// Key awarded by a checkpoint, if any (1 -> 1, 4 -> 2, 7 -> 3)
#[inline]
pub fn key_for_checkpoint(n: u8) -> Option<u8> {
    consts::KEY_CHECKPOINTS
        .iter()
        .position(|&cp| cp == n)
        .map(|i| i as u8 + 1)
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest angular distance between two headings, in degrees [0, 180]
#[inline]
pub fn heading_difference(a: f32, b: f32) -> f32 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    diff.min(360.0 - diff)
}

/// Compass heading from a device orientation `alpha` reading.
///
/// Simplified: ignores beta/gamma tilt compensation. A missing or zero alpha
/// reads as north.
#[inline]
pub fn compass_heading(alpha: Option<f32>) -> f32 {
    match alpha {
        Some(alpha) if alpha != 0.0 => normalize_degrees(360.0 - alpha),
        _ => 0.0,
    }
}

/// Team id format check: 3-20 ASCII letters or digits
pub fn validate_team_id(team_id: &str) -> bool {
    let len = team_id.len();
    (consts::TEAM_ID_MIN_LEN..=consts::TEAM_ID_MAX_LEN).contains(&len)
        && team_id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Format a duration in milliseconds as `HH:MM:SS`
pub fn format_elapsed(millis: u64) -> String {
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!("{:02}:{:02}:{:02}", hours, minutes % 60, seconds % 60)
}

/// Uniform float in [min, max)
#[inline]
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

/// Uniform integer in [min, max] (inclusive)
#[inline]
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

/// Shuffle a slice in place (Fisher-Yates)
#[inline]
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_heading_difference_wraps() {
        assert_eq!(heading_difference(350.0, 10.0), 20.0);
        assert_eq!(heading_difference(10.0, 350.0), 20.0);
        assert_eq!(heading_difference(90.0, 270.0), 180.0);
        assert_eq!(heading_difference(45.0, 45.0), 0.0);
    }

    #[test]
    fn test_compass_heading() {
        assert_eq!(compass_heading(None), 0.0);
        assert_eq!(compass_heading(Some(0.0)), 0.0);
        assert_eq!(compass_heading(Some(90.0)), 270.0);
        assert_eq!(compass_heading(Some(360.0)), 0.0);
    }

    #[test]
    fn test_validate_team_id() {
        assert!(validate_team_id("ABC123"));
        assert!(validate_team_id("abc"));
        assert!(validate_team_id("A1234567890123456789"));
        assert!(!validate_team_id("ab"));
        assert!(!validate_team_id(""));
        assert!(!validate_team_id("A12345678901234567890"));
        assert!(!validate_team_id("team 1"));
        assert!(!validate_team_id("crew-7"));
        assert!(!validate_team_id("piraté"));
    }

    #[test]
    fn test_key_for_checkpoint() {
        assert_eq!(key_for_checkpoint(1), Some(1));
        assert_eq!(key_for_checkpoint(4), Some(2));
        assert_eq!(key_for_checkpoint(7), Some(3));
        for n in [2, 3, 5, 6, 8] {
            assert_eq!(key_for_checkpoint(n), None);
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(61_000), "00:01:01");
        assert_eq!(format_elapsed(3_723_999), "01:02:03");
    }

    #[test]
    fn test_random_ranges_stay_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let f = random_between(&mut rng, 2000.0, 5000.0);
            assert!((2000.0..5000.0).contains(&f));
            let i = random_int(&mut rng, 0, 359);
            assert!((0..=359).contains(&i));
        }
        assert_eq!(random_int(&mut rng, 4, 4), 4);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut items = vec![1, 2, 3, 4, 5];
        shuffle(&mut items, &mut rng);
        items.sort();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }
}
