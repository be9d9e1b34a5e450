//! Error taxonomy
//!
//! Rejections surface to the caller as `HuntError`. Remote and storage
//! failures are absorbed at their boundaries and only ever logged.

use thiserror::Error;

/// Errors surfaced to callers of the progression and session APIs.
///
/// Every variant is a rejected operation: no state was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HuntError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("checkpoint {checkpoint} is locked until checkpoint {required} is completed")]
    SequenceViolation { checkpoint: u8, required: u8 },
    #[error("checkpoint {0} already completed")]
    DuplicateCompletion(u8),
    #[error("no such checkpoint: {0}")]
    InvalidCheckpoint(u8),
    #[error("no active session; start a session first")]
    SessionNotStarted,
    #[error("failed to start game: {0}")]
    SessionStart(String),
    #[error("invalid state format: {0}")]
    Import(String),
}

/// Failure of a key-value storage backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage write rejected: {0}")]
    Write(String),
}

/// A persisted record that could not be trusted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageCorruption {
    #[error("unparseable record: {0}")]
    Parse(String),
    #[error("record violates invariants: {0}")]
    Invariant(String),
}

/// Why a remote call degraded to its fallback value.
///
/// Never returned as an `Err`; carried inside `Remote::Fallback`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteUnavailable {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("response arrived after {elapsed_ms} ms (ceiling {timeout_ms} ms)")]
    Late { elapsed_ms: u64, timeout_ms: u64 },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("undecodable response: {0}")]
    Decode(String),
}
