//! Browser facade
//!
//! `WebHunt` is what the page's JavaScript drives: it forwards DOM input and
//! device sensor events into a `HuntSession` and hands back text, progress
//! and cues to render. Network calls are mocked, so the transport is offline.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::error::{HuntError, StorageError};
use crate::minigames::Symbol;
use crate::platform::{
    LocalStorage, MemoryStorage, MotionReading, OrientationReading, SensorKind, SensorReading,
    Storage, SystemClock,
};
use crate::remote::OfflineTransport;
use crate::session::HuntSession;
use crate::settings::Settings;

/// LocalStorage when the page may use it, memory otherwise (private mode)
#[derive(Debug, Clone)]
enum BrowserStorage {
    Local(LocalStorage),
    Memory(MemoryStorage),
}

impl BrowserStorage {
    fn open() -> Self {
        match LocalStorage::open() {
            Some(local) => BrowserStorage::Local(local),
            None => {
                log::warn!("LocalStorage unavailable, progress will not survive a reload");
                BrowserStorage::Memory(MemoryStorage::new())
            }
        }
    }
}

impl Storage for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            BrowserStorage::Local(s) => s.get_item(key),
            BrowserStorage::Memory(s) => s.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            BrowserStorage::Local(s) => s.set_item(key, value),
            BrowserStorage::Memory(s) => s.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match self {
            BrowserStorage::Local(s) => s.remove_item(key),
            BrowserStorage::Memory(s) => s.remove_item(key),
        }
    }
}

fn to_js(e: HuntError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn page_host() -> String {
    web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}

#[wasm_bindgen]
pub struct WebHunt {
    session: HuntSession<BrowserStorage, OfflineTransport>,
}

#[wasm_bindgen]
impl WebHunt {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebHunt {
        let storage = BrowserStorage::open();
        let settings = Settings::load(&storage, &page_host());
        let seed = js_sys::Date::now() as u64;
        log::info!("Hunt session created with seed: {}", seed);
        WebHunt {
            session: HuntSession::new(storage, OfflineTransport, Rc::new(SystemClock), settings, seed),
        }
    }

    pub fn start(&mut self, team_id: &str) -> Result<(), JsValue> {
        self.session.start(team_id).map(|_| ()).map_err(to_js)
    }

    pub fn enter_checkpoint(&mut self, checkpoint: u8) -> Result<(), JsValue> {
        self.session.enter_checkpoint(checkpoint).map_err(to_js)
    }

    pub fn leave_checkpoint(&mut self) {
        self.session.leave_checkpoint();
    }

    /// Call once per animation frame
    pub fn tick(&mut self) {
        self.session.tick();
    }

    pub fn handle_action(&mut self) {
        self.session.handle_action();
    }

    pub fn select_answer(&mut self, index: usize) -> bool {
        self.session.select_answer(index)
    }

    /// Symbol by its position in the lock's symbol palette
    pub fn add_symbol(&mut self, index: usize) -> bool {
        match Symbol::ALL.get(index) {
            Some(&symbol) => self.session.add_symbol(symbol),
            None => false,
        }
    }

    pub fn place_piece(&mut self, id: u8) -> bool {
        self.session.place_piece(id)
    }

    /// Which device sensors the page could attach to
    pub fn set_sensors_available(&mut self, orientation: bool, motion: bool) {
        let sensors = self.session.sensors_mut();
        sensors.set_available(SensorKind::Orientation, orientation);
        sensors.set_available(SensorKind::Motion, motion);
    }

    /// `deviceorientation` event
    pub fn on_orientation(&mut self, alpha: Option<f32>, beta: Option<f32>, gamma: Option<f32>) {
        let reading = OrientationReading {
            alpha,
            beta,
            gamma,
            at: js_sys::Date::now() as u64,
        };
        self.session
            .dispatch_reading(SensorReading::Orientation(reading));
    }

    /// `devicemotion` event (`accelerationIncludingGravity`)
    pub fn on_motion(&mut self, x: Option<f32>, y: Option<f32>) {
        let reading = MotionReading {
            x,
            y,
            at: js_sys::Date::now() as u64,
        };
        self.session.dispatch_reading(SensorReading::Motion(reading));
    }

    pub fn progress(&self) -> Option<f32> {
        self.session.progress()
    }

    pub fn status_text(&self) -> Option<String> {
        self.session.status_text()
    }

    pub fn next_checkpoint(&self) -> Option<u8> {
        self.session.progression().next_unlocked_checkpoint()
    }

    pub fn is_unlocked(&self, checkpoint: u8) -> bool {
        self.session.progression().is_unlocked(checkpoint)
    }

    pub fn completed_checkpoints(&self) -> Vec<u8> {
        self.session.record().completed_checkpoints().to_vec()
    }

    pub fn collected_keys(&self) -> Vec<u8> {
        self.session.record().collected_keys().to_vec()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Elapsed hunt time as `HH:MM:SS`
    pub fn elapsed_text(&self) -> String {
        crate::format_elapsed(self.session.stats().elapsed_time)
    }

    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.session.stats()).unwrap_or_default()
    }

    pub fn leaderboard_json(&mut self) -> String {
        serde_json::to_string(&self.session.leaderboard()).unwrap_or_default()
    }

    pub fn sync(&mut self) {
        self.session.sync();
    }

    pub fn submit_feedback(&mut self, feedback: &str) -> Result<(), JsValue> {
        self.session.submit_feedback(feedback).map(|_| ()).map_err(to_js)
    }

    pub fn set_sound(&mut self, enabled: bool) {
        let mut settings = self.session.settings().clone();
        settings.sound_enabled = enabled;
        self.session.update_settings(settings);
    }

    pub fn set_vibration(&mut self, enabled: bool) {
        let mut settings = self.session.settings().clone();
        settings.vibration_enabled = enabled;
        self.session.update_settings(settings);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let mut settings = self.session.settings().clone();
        settings.set_volume(volume);
        self.session.update_settings(settings);
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        self.session.drain_messages()
    }

    /// Pending cues as JSON: `[{"sound": "click", "volume": 0.8, "vibration": [100]}]`
    pub fn drain_cues_json(&mut self) -> String {
        let cues: Vec<serde_json::Value> = self
            .session
            .drain_playback()
            .into_iter()
            .map(|p| {
                serde_json::json!({
                    "sound": p.sound.map(|s| s.as_str()),
                    "volume": p.volume,
                    "vibration": p.vibration,
                })
            })
            .collect();
        serde_json::Value::Array(cues).to_string()
    }

    pub fn export_state(&self) -> String {
        self.session.progression().export_json()
    }

    pub fn import_state(&mut self, json: &str) -> Result<(), JsValue> {
        self.session
            .progression_mut()
            .import_json(json)
            .map(|_| ())
            .map_err(to_js)
    }

    /// Operator reset
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

impl Default for WebHunt {
    fn default() -> Self {
        Self::new()
    }
}
