//! Typed control API for UPnP/DLNA media renderers
//!
//! Operations are defined per service under [`operations`] and executed by
//! [`ControlClient`] against a resolved [`DiscoveredDevice`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use dlna_api::ControlClient;
//! use dlna_discovery::{DescriptionResolver, DeviceRegistry};
//!
//! # fn run(registry: &DeviceRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = DescriptionResolver::new(Duration::from_secs(10))?;
//! let device = resolver.resolve(registry, "uuid:renderer-1")?;
//!
//! let client = ControlClient::new();
//! client.load_media(&device, "http://192.168.1.2:8000/song.mp3", "Song A")?;
//! client.play(&device)?;
//! client.set_volume(&device, 30)?;
//! println!("volume is {}", client.get_volume(&device)?);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod didl;
mod error;
pub mod operation;
pub mod operations;
pub mod time;

pub use client::{require_capability, ControlClient};
pub use error::{ApiError, Result};
pub use operation::{UPnPOperation, Validate};
pub use operations::av_transport::{PositionInfo, TransportInfo, TransportState};

pub use dlna_discovery::{Capability, DiscoveredDevice, ServiceKind};
pub use soap_client::ActionResponse;
