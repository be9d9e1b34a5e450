//! Poll-until-ready probe
//!
//! Checks a condition at a fixed interval until it holds or a ceiling
//! passes. Driven from the tick loop, never blocks.

use crate::consts::{PROBE_INTERVAL_MS, PROBE_TIMEOUT_MS};

/// Outcome of a probe poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Ready,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Probe {
    started_at: u64,
    timeout_ms: u64,
    interval_ms: u64,
    last_check: Option<u64>,
    state: ProbeState,
}

impl Probe {
    /// Probe with the default 5 s ceiling and 100 ms interval
    pub fn new(now: u64) -> Self {
        Self::with_limits(now, PROBE_TIMEOUT_MS, PROBE_INTERVAL_MS)
    }

    pub fn with_limits(now: u64, timeout_ms: u64, interval_ms: u64) -> Self {
        Self {
            started_at: now,
            timeout_ms,
            interval_ms: interval_ms.max(1),
            last_check: None,
            state: ProbeState::Pending,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Run `check` if an interval has passed since the last check.
    ///
    /// Once settled the state never changes and `check` is not called again.
    pub fn poll(&mut self, now: u64, check: impl FnOnce() -> bool) -> ProbeState {
        if self.state != ProbeState::Pending {
            return self.state;
        }
        let due = self
            .last_check
            .is_none_or(|last| now.saturating_sub(last) >= self.interval_ms);
        if due {
            self.last_check = Some(now);
            if check() {
                self.state = ProbeState::Ready;
                return self.state;
            }
        }
        if now.saturating_sub(self.started_at) >= self.timeout_ms {
            self.state = ProbeState::TimedOut;
        }
        self.state
    }
}
