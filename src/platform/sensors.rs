//! Device sensor capability
//!
//! Minigames never touch device APIs. They subscribe through the hub at
//! `initialize()` and unsubscribe at `cleanup()`; the presentation layer (or a
//! test) feeds readings in with `dispatch`. Readings for revoked listeners are
//! dropped, so nothing leaks into a later attempt.

use std::collections::VecDeque;

/// Maximum queued readings per listener (oldest dropped first)
pub const MAX_QUEUED_READINGS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// `deviceorientation` / `deviceorientationabsolute`
    Orientation,
    /// `devicemotion`
    Motion,
}

/// Device orientation angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationReading {
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
    /// Timestamp (ms)
    pub at: u64,
}

/// Acceleration including gravity, m/s²
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReading {
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Timestamp (ms)
    pub at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Orientation(OrientationReading),
    Motion(MotionReading),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Orientation(_) => SensorKind::Orientation,
            SensorReading::Motion(_) => SensorKind::Motion,
        }
    }
}

/// Handle returned by `SensorHub::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

#[derive(Debug)]
struct Listener {
    id: ListenerId,
    kind: SensorKind,
    queue: VecDeque<SensorReading>,
}

/// Registry of sensor listeners for the active minigame attempt
#[derive(Debug)]
pub struct SensorHub {
    orientation_available: bool,
    motion_available: bool,
    listeners: Vec<Listener>,
    next_id: u32,
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl SensorHub {
    pub fn new(orientation_available: bool, motion_available: bool) -> Self {
        Self {
            orientation_available,
            motion_available,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Hub for a device with no sensors (desktop browser)
    pub fn unavailable() -> Self {
        Self::new(false, false)
    }

    pub fn is_available(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Orientation => self.orientation_available,
            SensorKind::Motion => self.motion_available,
        }
    }

    /// Mark a sensor as (un)available, e.g. after a permission prompt resolves
    pub fn set_available(&mut self, kind: SensorKind, available: bool) {
        match kind {
            SensorKind::Orientation => self.orientation_available = available,
            SensorKind::Motion => self.motion_available = available,
        }
    }

    /// Register a listener. `None` when the device lacks the sensor.
    pub fn subscribe(&mut self, kind: SensorKind) -> Option<ListenerId> {
        if !self.is_available(kind) {
            log::warn!("{:?} sensor unavailable, listener not registered", kind);
            return None;
        }
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            queue: VecDeque::new(),
        });
        log::debug!("Registered {:?} listener {:?}", kind, id);
        Some(id)
    }

    /// Revoke a listener and discard its queued readings.
    /// Returns false if the listener was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        let removed = self.listeners.len() != before;
        if removed {
            log::debug!("Removed listener {:?}", id);
        }
        removed
    }

    /// Deliver a reading to every listener of its kind.
    /// Returns the number of listeners that received it.
    pub fn dispatch(&mut self, reading: SensorReading) -> usize {
        let kind = reading.kind();
        let mut delivered = 0;
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            if listener.queue.len() >= MAX_QUEUED_READINGS {
                listener.queue.pop_front();
            }
            listener.queue.push_back(reading);
            delivered += 1;
        }
        delivered
    }

    /// Take all queued readings for a listener, oldest first
    pub fn drain(&mut self, id: ListenerId) -> Vec<SensorReading> {
        self.listeners
            .iter_mut()
            .find(|l| l.id == id)
            .map(|l| l.queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orientation(alpha: f32, at: u64) -> SensorReading {
        SensorReading::Orientation(OrientationReading {
            alpha: Some(alpha),
            at,
            ..Default::default()
        })
    }

    #[test]
    fn test_dispatch_only_reaches_matching_kind() {
        let mut hub = SensorHub::default();
        let compass = hub.subscribe(SensorKind::Orientation).unwrap();
        let table = hub.subscribe(SensorKind::Motion).unwrap();

        assert_eq!(hub.dispatch(orientation(10.0, 1)), 1);
        assert_eq!(hub.drain(compass).len(), 1);
        assert!(hub.drain(table).is_empty());
        // Drained queue is empty
        assert!(hub.drain(compass).is_empty());
    }

    #[test]
    fn test_unsubscribe_drops_future_readings() {
        let mut hub = SensorHub::default();
        let id = hub.subscribe(SensorKind::Orientation).unwrap();
        hub.dispatch(orientation(5.0, 1));
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.dispatch(orientation(6.0, 2)), 0);
        assert!(hub.drain(id).is_empty());
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_unavailable_sensor_refuses_subscription() {
        let mut hub = SensorHub::unavailable();
        assert!(hub.subscribe(SensorKind::Motion).is_none());
        hub.set_available(SensorKind::Motion, true);
        assert!(hub.subscribe(SensorKind::Motion).is_some());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut hub = SensorHub::default();
        let id = hub.subscribe(SensorKind::Orientation).unwrap();
        for i in 0..(MAX_QUEUED_READINGS as u64 + 10) {
            hub.dispatch(orientation(1.0, i));
        }
        let readings = hub.drain(id);
        assert_eq!(readings.len(), MAX_QUEUED_READINGS);
        assert_eq!(readings[0], orientation(1.0, 10));
    }
}
