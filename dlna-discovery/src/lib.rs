//! UPnP/DLNA media renderer discovery
//!
//! Finds renderers on the local network with SSDP, keeps them in a
//! deduplicated [`DeviceRegistry`], and resolves their description documents
//! into the control URLs the control path needs.
//!
//! # Quick Start
//!
//! ```no_run
//! use dlna_discovery::{discover_renderers, DiscoveryConfig};
//!
//! let devices = discover_renderers(DiscoveryConfig::default())?;
//! for device in devices {
//!     println!("Found {} at {}", device.display_name(), device.host);
//! }
//! # Ok::<(), dlna_discovery::DiscoveryError>(())
//! ```
//!
//! # Sessions and events
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dlna_discovery::{DeviceRegistry, DiscoveryConfig, DiscoverySession, SharedMulticastLock};
//!
//! let registry = Arc::new(DeviceRegistry::new());
//! let events = registry.subscribe();
//! let mut session = DiscoverySession::multicast(
//!     DiscoveryConfig::default(),
//!     Arc::clone(&registry),
//!     SharedMulticastLock::default(),
//! );
//!
//! session.start()?;
//! for event in events.timeout_iter(Duration::from_secs(5)) {
//!     println!("{}: {}", event.name(), event.device_id());
//! }
//! session.stop();
//! # Ok::<(), dlna_discovery::DiscoveryError>(())
//! ```

mod config;
mod description;
pub mod device;
mod error;
mod event;
mod registry;
mod session;
pub mod ssdp;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::DiscoveryConfig;
pub use description::{DescriptionResolver, DeviceDescription};
pub use device::{Capability, DeviceCandidate, DeviceSummary, DiscoveredDevice, ServiceKind};
pub use error::{DiscoveryError, Result};
pub use event::{EventIterator, RegistryEvent};
pub use registry::{DeviceRegistry, UpsertOutcome};
pub use session::{discover_renderers, DiscoverySession, SessionState};
pub use transport::{
    Datagram, MulticastLock, MulticastTransport, NoopMulticastLock, SharedMulticastLock,
    SsdpTransport,
};
