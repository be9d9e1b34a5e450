//! Checkpoint progression
//!
//! The canonical record of a team's hunt and the state machine that guards
//! every change to it:
//! - Strict sequential unlocking (n needs n-1)
//! - At most one completion per checkpoint
//! - Keys from checkpoints 1, 4 and 7
//! - Persist after every mutation, mirror to the backend best-effort

pub mod machine;
pub mod record;
pub mod stats;

pub use machine::{Progression, ProgressionPhase};
pub use record::ProgressionRecord;
pub use stats::GameStats;
