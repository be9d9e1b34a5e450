//! Player settings and API configuration
//!
//! Persisted separately from progress, under its own storage key.

use serde::{Deserialize, Serialize};

use crate::consts::REQUEST_TIMEOUT_MS;
use crate::feedback::{Cue, Sound};
use crate::platform::Storage;

/// Backend used when the page is served locally
pub const LOCAL_API_URL: &str = "http://localhost:3000/api";
/// Production backend
pub const PRODUCTION_API_URL: &str = "https://api.lost-loot.example.com/api";

/// API base URL for the page host
pub fn default_base_url(host: &str) -> &'static str {
    match host {
        "localhost" | "127.0.0.1" => LOCAL_API_URL,
        _ => PRODUCTION_API_URL,
    }
}

/// A cue after applying the player's preferences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub sound: Option<Sound>,
    /// 0.0 - 1.0
    pub volume: f32,
    pub vibration: Option<&'static [u32]>,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base_url: String,
    /// Generic remote call ceiling (ms)
    pub request_timeout_ms: u64,

    // === Feedback ===
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: PRODUCTION_API_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            sound_enabled: true,
            vibration_enabled: true,
            volume: 0.8,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "lostLootSettings";

    /// Defaults for a page served from `host`
    pub fn for_host(host: &str) -> Self {
        Self {
            api_base_url: default_base_url(host).to_string(),
            ..Self::default()
        }
    }

    /// Load settings; missing or corrupt settings fall back to `for_host`
    pub fn load<S: Storage>(storage: &S, host: &str) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.set_volume(settings.volume);
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Saved settings corrupt ({}), using defaults", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::for_host(host)
    }

    pub fn save<S: Storage>(&self, storage: &mut S) {
        match serde_json::to_string(self) {
            Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::error!("Failed to save settings: {}", e),
            },
            Err(e) => log::error!("Failed to encode settings: {}", e),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    /// Whether sounds are audible at all
    pub fn effective_sound(&self) -> bool {
        self.sound_enabled && self.volume > 0.0
    }

    /// Apply preferences to a cue; `None` when nothing would play
    pub fn playback(&self, cue: Cue) -> Option<Playback> {
        let sound = self.effective_sound().then_some(cue.sound);
        let vibration = cue.vibration.filter(|_| self.vibration_enabled);
        if sound.is_none() && vibration.is_none() {
            return None;
        }
        Some(Playback {
            sound,
            volume: self.volume,
            vibration,
        })
    }
}
