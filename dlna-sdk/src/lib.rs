//! # DLNA SDK - discovery and control of UPnP media renderers
//!
//! A synchronous engine that finds renderers on the local network and drives
//! playback on them:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use dlna_sdk::{RegistryEvent, RendererSystem};
//!
//! fn main() -> Result<(), dlna_sdk::SdkError> {
//!     dlna_sdk::logging::init_logging_from_env().ok();
//!
//!     let system = RendererSystem::new()?;
//!     let events = system.events();
//!     let status = system.start_discovery();
//!     println!("{}", status.message);
//!
//!     while let Some(event) = events.recv_timeout(Duration::from_secs(6)) {
//!         if let RegistryEvent::DeviceDiscovered { device } = event {
//!             println!("found {} at {}", device.friendly_name, device.ip);
//!         }
//!     }
//!
//!     for device in system.discovered_devices() {
//!         let volume = system.get_volume(&device.id)?;
//!         println!("{}: volume {}", device.name, volume.volume);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! dlna-sdk (RendererSystem, RendererBackend)
//!     ↓
//! dlna-api (typed AVTransport / RenderingControl operations)
//!     ↓                          ↓
//! soap-client (SOAP 1.1)    dlna-discovery (SSDP, registry, descriptions)
//! ```
//!
//! ## Logging
//!
//! Nothing is printed unless a `tracing` subscriber is installed. See
//! [`logging`] for presets driven by `DLNA_LOG_MODE` and `DLNA_LOG_LEVEL`.

pub use backend::RendererBackend;
pub use config::EngineConfig;
pub use error::{Result, SdkError};
pub use status::{OperationStatus, PlaybackStatus, VolumeLevel, VolumeStatus};
pub use system::{RendererSystem, MAX_VOLUME};
pub use upnp::UpnpBackend;

// Re-export commonly used types from the lower crates
pub use dlna_api::TransportState;
pub use dlna_discovery::{
    DeviceSummary, DiscoveryConfig, EventIterator, MulticastLock, NoopMulticastLock,
    RegistryEvent, SharedMulticastLock,
};

mod backend;
pub mod config;
mod error;
pub mod logging;
mod status;
mod system;
mod upnp;
