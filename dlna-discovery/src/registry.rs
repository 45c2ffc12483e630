//! Device registry
//!
//! The one piece of shared mutable state in the engine. The discovery worker
//! writes to it, control requests read from it. Every operation takes the
//! lock for a single map operation only; events are published after the lock
//! has been released.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::description::DeviceDescription;
use crate::device::{DeviceCandidate, DiscoveredDevice};
use crate::error::{DiscoveryError, Result};
use crate::event::{EventIterator, RegistryEvent};

/// What an [`DeviceRegistry::upsert`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New id, `deviceDiscovered` emitted
    Inserted,
    /// Known id with a changed observable field, `deviceUpdated` emitted
    Updated,
    /// Known id, only `last_seen` moved
    Refreshed,
}

/// Deduplicated set of discovered renderers, keyed by device id
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, DiscoveredDevice>>,
    subscribers: Mutex<Vec<mpsc::Sender<RegistryEvent>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to registry events from now on
    pub fn subscribe(&self) -> EventIterator {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        EventIterator::new(rx)
    }

    /// Record an SSDP sighting
    ///
    /// `last_seen` never moves backwards. A changed LOCATION invalidates any
    /// earlier resolution since the control URLs came from the old document.
    pub fn upsert(&self, candidate: DeviceCandidate, seen_at: Instant) -> UpsertOutcome {
        let (outcome, summary) = {
            let mut devices = self.devices.lock();
            match devices.get_mut(&candidate.id) {
                None => {
                    let device = DiscoveredDevice::from_candidate(candidate, seen_at);
                    let summary = device.summary();
                    devices.insert(device.id.clone(), device);
                    (UpsertOutcome::Inserted, summary)
                }
                Some(device) => {
                    let before = device.summary();

                    if seen_at > device.last_seen {
                        device.last_seen = seen_at;
                    }
                    if device.description_url != candidate.location {
                        device.description_url = candidate.location;
                        device.resolved = false;
                        device.capabilities.clear();
                    }
                    device.host = candidate.host;
                    if let Some(server) = candidate.server.filter(|s| !s.is_empty()) {
                        device.server = Some(server);
                    }

                    let after = device.summary();
                    if after == before {
                        (UpsertOutcome::Refreshed, after)
                    } else {
                        (UpsertOutcome::Updated, after)
                    }
                }
            }
        };

        match outcome {
            UpsertOutcome::Inserted => {
                info!("Discovered renderer {} at {}", summary.id, summary.ip);
                self.publish(RegistryEvent::DeviceDiscovered { device: summary });
            }
            UpsertOutcome::Updated => {
                debug!("Renderer {} changed", summary.id);
                self.publish(RegistryEvent::DeviceUpdated { device: summary });
            }
            UpsertOutcome::Refreshed => {}
        }

        outcome
    }

    /// Record a successfully parsed description and mark the device resolved
    ///
    /// `description_url` is where the document was fetched from. If the
    /// device has since announced a different LOCATION the document is stale
    /// and the entry is left untouched.
    pub fn apply_description(
        &self,
        device_id: &str,
        description_url: &str,
        description: DeviceDescription,
    ) -> Result<DiscoveredDevice> {
        let (snapshot, changed) = {
            let mut devices = self.devices.lock();
            let device = devices
                .get_mut(device_id)
                .ok_or_else(|| DiscoveryError::DeviceNotFound(device_id.to_string()))?;

            if device.description_url != description_url {
                return Err(DiscoveryError::DescriptionFetch {
                    url: description_url.to_string(),
                    reason: format!("device moved to {} during resolution", device.description_url),
                });
            }

            let before = device.summary();
            let previous_capabilities = device.capabilities.clone();

            if !description.friendly_name.is_empty() {
                device.friendly_name = description.friendly_name;
            }
            device.device_type = description.device_type;
            device.manufacturer = description.manufacturer;
            device.model_name = description.model_name;
            device.capabilities = description.capabilities;
            device.resolved = true;

            let changed = device.summary() != before || device.capabilities != previous_capabilities;
            (device.clone(), changed)
        };

        if changed {
            self.publish(RegistryEvent::DeviceUpdated {
                device: snapshot.summary(),
            });
        }

        Ok(snapshot)
    }

    /// Remove one device, emitting `deviceRemoved` if it was present
    pub fn remove(&self, device_id: &str) -> Option<DiscoveredDevice> {
        let removed = self.devices.lock().remove(device_id);
        if removed.is_some() {
            debug!("Removed renderer {}", device_id);
            self.publish(RegistryEvent::DeviceRemoved {
                id: device_id.to_string(),
            });
        }
        removed
    }

    /// Snapshot of one device
    pub fn get(&self, device_id: &str) -> Option<DiscoveredDevice> {
        self.devices.lock().get(device_id).cloned()
    }

    /// Snapshot of every device, ordered by id
    pub fn list(&self) -> Vec<DiscoveredDevice> {
        let mut devices: Vec<DiscoveredDevice> = self.devices.lock().values().cloned().collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.lock().contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.lock().is_empty()
    }

    /// Remove every device, emitting `deviceRemoved` for each
    pub fn clear(&self) -> usize {
        let drained: Vec<String> = {
            let mut devices = self.devices.lock();
            let mut ids: Vec<String> = devices.drain().map(|(id, _)| id).collect();
            ids.sort();
            ids
        };

        let count = drained.len();
        for id in drained {
            self.publish(RegistryEvent::DeviceRemoved { id });
        }
        count
    }

    /// Remove devices not seen within `max_age` of `now`
    ///
    /// Returns the removed ids.
    pub fn sweep_stale(&self, max_age: Duration, now: Instant) -> Vec<String> {
        let stale: Vec<String> = {
            let mut devices = self.devices.lock();
            let mut ids: Vec<String> = devices
                .values()
                .filter(|d| now.saturating_duration_since(d.last_seen) > max_age)
                .map(|d| d.id.clone())
                .collect();
            ids.sort();
            for id in &ids {
                devices.remove(id);
            }
            ids
        };

        for id in &stale {
            info!("Renderer {} went stale", id);
            self.publish(RegistryEvent::DeviceRemoved { id: id.clone() });
        }
        stale
    }

    fn publish(&self, event: RegistryEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.len())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
