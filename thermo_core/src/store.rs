//! Bounded, thread-safe telemetry history plus most-recent scalar state.
//!
//! One store instance is created at startup and shared between the polling
//! loop (writer) and any consumer (snapshot reader). All synchronization is
//! internal; callers never observe a buffer mid-resize.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::protocol::ReadingKind;

/// Kind alias re-exported at the sample level.
pub type SampleKind = ReadingKind;

/// One decoded measurement, stamped with seconds since the poll epoch.
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub kind: SampleKind,
    pub value: f32,
    pub timestamp_s: f64,
}

/// Point-in-time copy of the store, safe to hand to any consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub temperature: Vec<f32>,
    pub current: Vec<f32>,
    pub time_s: Vec<f64>,
    pub last_temperature: f32,
    pub last_current: f32,
    pub setpoint: f32,
}

#[derive(Debug)]
struct Inner {
    temperature: VecDeque<f32>,
    current: VecDeque<f32>,
    time_s: VecDeque<f64>,
    last_temperature: f32,
    last_current: f32,
    setpoint: f32,
}

#[derive(Debug)]
pub struct SampleStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl SampleStore {
    /// Create a store whose three ring buffers share `capacity`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                temperature: VecDeque::with_capacity(capacity.min(1024)),
                current: VecDeque::with_capacity(capacity.min(1024)),
                time_s: VecDeque::with_capacity(capacity.min(1024)),
                last_temperature: 0.0,
                last_current: 0.0,
                // The device powers up commanding 20 C.
                setpoint: 20.0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a temperature reading and its timestamp together, evicting
    /// the oldest pair once at capacity. Keeps `time_s` and `temperature`
    /// the same length at every instant.
    pub fn push_temperature(&self, value: f32, timestamp_s: f64) {
        let mut g = self.lock();
        if g.temperature.len() == self.capacity {
            g.temperature.pop_front();
            g.time_s.pop_front();
        }
        g.temperature.push_back(value);
        g.time_s.push_back(timestamp_s);
        g.last_temperature = value;
    }

    /// Append a current reading. The current buffer arrives on a different
    /// poll phase and may lag the temperature buffer, but is never allowed
    /// to run ahead of it; an early reading only updates the scalar.
    pub fn push_current(&self, value: f32) {
        let mut g = self.lock();
        g.last_current = value;
        if g.current.len() >= g.temperature.len() {
            tracing::trace!(value, "current reading ahead of temperature; buffer unchanged");
            return;
        }
        if g.current.len() == self.capacity {
            g.current.pop_front();
        }
        g.current.push_back(value);
    }

    /// Last commanded setpoint as echoed by the device; last write wins.
    pub fn set_setpoint(&self, value: f32) {
        self.lock().setpoint = value;
    }

    /// Route one decoded sample to the matching buffer/scalar.
    pub fn record(&self, sample: &Sample) {
        match sample.kind {
            SampleKind::Temperature => self.push_temperature(sample.value, sample.timestamp_s),
            SampleKind::Current => self.push_current(sample.value),
            SampleKind::SetpointEcho => self.set_setpoint(sample.value),
        }
    }

    /// Internally consistent point-in-time copy of buffers and scalars.
    pub fn snapshot(&self) -> Snapshot {
        let g = self.lock();
        Snapshot {
            temperature: g.temperature.iter().copied().collect(),
            current: g.current.iter().copied().collect(),
            time_s: g.time_s.iter().copied().collect(),
            last_temperature: g.last_temperature,
            last_current: g.last_current,
            setpoint: g.setpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let store = SampleStore::new(3);
        for i in 0..5 {
            store.push_temperature(i as f32, i as f64);
        }
        let snap = store.snapshot();
        assert_eq!(snap.temperature, vec![2.0, 3.0, 4.0]);
        assert_eq!(snap.time_s, vec![2.0, 3.0, 4.0]);
        assert_eq!(snap.last_temperature, 4.0);
    }

    #[test]
    fn time_and_temperature_stay_paired() {
        let store = SampleStore::new(8);
        store.push_temperature(20.0, 0.1);
        store.push_current(0.5);
        store.push_temperature(20.5, 0.2);
        let snap = store.snapshot();
        assert_eq!(snap.temperature.len(), snap.time_s.len());
        assert!(snap.current.len() <= snap.temperature.len());
    }

    #[test]
    fn current_never_outruns_temperature() {
        let store = SampleStore::new(8);
        store.push_current(1.0);
        store.push_current(1.1);
        let snap = store.snapshot();
        assert!(snap.current.is_empty());
        // The scalar still tracks the latest reading.
        assert_eq!(snap.last_current, 1.1);

        store.push_temperature(21.0, 0.1);
        store.push_current(1.2);
        let snap = store.snapshot();
        assert_eq!(snap.current, vec![1.2]);
    }

    #[test]
    fn setpoint_is_last_write_wins() {
        let store = SampleStore::new(4);
        assert_eq!(store.snapshot().setpoint, 20.0);
        store.set_setpoint(25.0);
        store.set_setpoint(30.0);
        assert_eq!(store.snapshot().setpoint, 30.0);
    }

    #[test]
    fn record_dispatches_by_kind() {
        let store = SampleStore::new(4);
        store.record(&Sample {
            kind: SampleKind::Temperature,
            value: 22.0,
            timestamp_s: 1.0,
        });
        store.record(&Sample {
            kind: SampleKind::Current,
            value: 0.4,
            timestamp_s: 1.1,
        });
        store.record(&Sample {
            kind: SampleKind::SetpointEcho,
            value: 23.0,
            timestamp_s: 1.2,
        });
        let snap = store.snapshot();
        assert_eq!(snap.temperature, vec![22.0]);
        assert_eq!(snap.current, vec![0.4]);
        assert_eq!(snap.setpoint, 23.0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let store = SampleStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.push_temperature(1.0, 0.0);
        store.push_temperature(2.0, 0.1);
        assert_eq!(store.snapshot().temperature, vec![2.0]);
    }
}
