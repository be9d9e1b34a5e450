//! Sound and haptic cues
//!
//! Minigames only name the cue; the presentation layer decides how (and
//! whether) to play it.

/// Sound effect names (map to `assets/audio/<name>.mp3`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    CompassStart,
    QuizStart,
    Correct,
    Incorrect,
    CannonReady,
    CannonHit,
    CannonMiss,
    ChestOpen,
    Click,
    Coins,
    CoinDrop,
    DuelStart,
    SwordClash,
    Victory,
    Defeat,
    MapUnfold,
    PiecePlace,
    TreasureReveal,
    KeyTurn,
    Unlock,
    TreasureFound,
    Success,
    Failure,
}

impl Sound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sound::CompassStart => "compass-start",
            Sound::QuizStart => "quiz-start",
            Sound::Correct => "correct",
            Sound::Incorrect => "incorrect",
            Sound::CannonReady => "cannon-ready",
            Sound::CannonHit => "cannon-hit",
            Sound::CannonMiss => "cannon-miss",
            Sound::ChestOpen => "chest-open",
            Sound::Click => "click",
            Sound::Coins => "coins",
            Sound::CoinDrop => "coin-drop",
            Sound::DuelStart => "duel-start",
            Sound::SwordClash => "sword-clash",
            Sound::Victory => "victory",
            Sound::Defeat => "defeat",
            Sound::MapUnfold => "map-unfold",
            Sound::PiecePlace => "piece-place",
            Sound::TreasureReveal => "treasure-reveal",
            Sound::KeyTurn => "key-turn",
            Sound::Unlock => "unlock",
            Sound::TreasureFound => "treasure-found",
            Sound::Success => "success",
            Sound::Failure => "failure",
        }
    }
}

/// Vibration patterns (on/off ms, `navigator.vibrate` format)
pub mod vibration {
    pub const TAP: &[u32] = &[100];
    pub const PLACE: &[u32] = &[150];
    pub const GOOD: &[u32] = &[200];
    pub const HIT: &[u32] = &[300];
    pub const TRIPLE: &[u32] = &[100, 100, 100];
    pub const SUCCESS: &[u32] = &[200, 100, 200];
    pub const TREASURE: &[u32] = &[300, 100, 300, 100, 300];
}

/// A sound with an optional vibration pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub sound: Sound,
    pub vibration: Option<&'static [u32]>,
}

impl Cue {
    pub const fn sound(sound: Sound) -> Self {
        Self {
            sound,
            vibration: None,
        }
    }

    pub const fn with_vibration(sound: Sound, pattern: &'static [u32]) -> Self {
        Self {
            sound,
            vibration: Some(pattern),
        }
    }

    /// Standard checkpoint success fanfare
    pub const SUCCESS: Cue = Cue::with_vibration(Sound::Success, vibration::SUCCESS);
    pub const FAILURE: Cue = Cue::sound(Sound::Failure);
}
