//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (JS `Date.now()` on web, `SystemTime` natively, manual in tests)
//! - Storage (LocalStorage on web, in-memory elsewhere)
//! - Device sensors (orientation/motion listeners as a revocable capability)
//! - Capability probing (poll-until-ready with a ceiling)

pub mod clock;
pub mod probe;
pub mod sensors;
pub mod storage;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use probe::{Probe, ProbeState};
pub use sensors::{ListenerId, MotionReading, OrientationReading, SensorHub, SensorKind, SensorReading};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, Storage};
