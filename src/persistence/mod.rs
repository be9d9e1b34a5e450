//! Progression record persistence
//!
//! Features:
//! - One JSON record under a fixed storage key
//! - Invariant validation on load
//! - Corruption recovery (reset to a fresh record, logged, never surfaced)

pub mod store;

pub use store::{ProgressStore, STORAGE_KEY};
