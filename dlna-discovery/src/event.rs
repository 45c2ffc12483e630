//! Registry events and the iterator callers drain them with
//!
//! - Blocking: `recv()`, `for event in events`
//! - Non-blocking: `try_recv()`, `try_iter()`
//! - Timeout: `recv_timeout()`, `timeout_iter()`

use std::sync::mpsc;
use std::time::Duration;

use serde::Serialize;

use crate::device::DeviceSummary;

/// A change to the set of known renderers
///
/// Serializes as `{"event": "deviceDiscovered", "device": {...}}` and
/// `{"event": "deviceRemoved", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RegistryEvent {
    /// First sighting of an id
    DeviceDiscovered { device: DeviceSummary },
    /// An observable field of a known device changed
    DeviceUpdated { device: DeviceSummary },
    /// The device left the registry
    DeviceRemoved { id: String },
}

impl RegistryEvent {
    /// Event name as delivered to the host application
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::DeviceDiscovered { .. } => "deviceDiscovered",
            RegistryEvent::DeviceUpdated { .. } => "deviceUpdated",
            RegistryEvent::DeviceRemoved { .. } => "deviceRemoved",
        }
    }

    /// Id of the device the event is about
    pub fn device_id(&self) -> &str {
        match self {
            RegistryEvent::DeviceDiscovered { device } | RegistryEvent::DeviceUpdated { device } => {
                &device.id
            }
            RegistryEvent::DeviceRemoved { id } => id,
        }
    }
}

/// Receiving end of a registry subscription
///
/// All methods are synchronous. The iterator ends once the registry it was
/// subscribed to has been dropped.
pub struct EventIterator {
    rx: mpsc::Receiver<RegistryEvent>,
}

impl EventIterator {
    pub(crate) fn new(rx: mpsc::Receiver<RegistryEvent>) -> Self {
        Self { rx }
    }

    /// Block until the next event is available
    ///
    /// Returns `None` if the registry is gone.
    pub fn recv(&self) -> Option<RegistryEvent> {
        self.rx.recv().ok()
    }

    /// Block until the next event or timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RegistryEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<RegistryEvent> {
        self.rx.try_recv().ok()
    }

    /// Iterator over the events already queued
    pub fn try_iter(&self) -> TryIter<'_> {
        TryIter { inner: self }
    }

    /// Iterator that waits up to `timeout` for each event and stops on the first gap
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for EventIterator {
    type Item = RegistryEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking iterator over queued events
pub struct TryIter<'a> {
    inner: &'a EventIterator,
}

impl<'a> Iterator for TryIter<'a> {
    type Item = RegistryEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator with timeout
pub struct TimeoutIter<'a> {
    inner: &'a EventIterator,
    timeout: Duration,
}

impl<'a> Iterator for TimeoutIter<'a> {
    type Item = RegistryEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
