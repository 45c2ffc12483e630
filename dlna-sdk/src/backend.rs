//! Renderer backend abstraction
//!
//! A backend owns discovery and control for one family of renderers. The
//! engine only talks to this trait, so protocol types never reach the host.

use std::time::Duration;

use dlna_discovery::{DeviceSummary, EventIterator};

use crate::status::PlaybackStatus;
use crate::{Result, SdkError};

/// Discovery and playback control for one kind of renderer
///
/// Methods take `&self`; implementations guard their own state so control
/// calls can run while a scan is in progress. Seeking, status queries and
/// pruning are optional and default to [`SdkError::Unsupported`] or a no-op.
pub trait RendererBackend: Send + Sync {
    /// Short backend name, e.g. "UPnP"
    fn name(&self) -> &'static str;

    /// Begin a discovery scan
    fn discover(&self) -> Result<()>;

    /// End the scan; `false` when none was running
    fn stop_discovery(&self) -> bool;

    fn is_discovering(&self) -> bool;

    /// Snapshot of known devices, sorted by id
    fn devices(&self) -> Vec<DeviceSummary>;

    /// Make a device ready for control and return its refreshed summary
    fn connect(&self, device_id: &str) -> Result<DeviceSummary>;

    /// Load a media URL with a display title; playback does not start
    fn load_media(&self, device_id: &str, media_url: &str, title: &str) -> Result<()>;

    fn play(&self, device_id: &str) -> Result<()>;

    fn pause(&self, device_id: &str) -> Result<()>;

    fn stop(&self, device_id: &str) -> Result<()>;

    fn seek(&self, _device_id: &str, _position: Duration) -> Result<()> {
        Err(SdkError::Unsupported(format!("{} backend cannot seek", self.name())))
    }

    /// Set the volume, 0 to 100
    fn set_volume(&self, device_id: &str, volume: u8) -> Result<()>;

    fn get_volume(&self, device_id: &str) -> Result<u8>;

    fn playback_status(&self, _device_id: &str) -> Result<PlaybackStatus> {
        Err(SdkError::Unsupported(format!(
            "{} backend cannot report playback status",
            self.name()
        )))
    }

    /// New receiver for device lifecycle events
    fn subscribe(&self) -> EventIterator;

    /// Drop devices that have not answered recently; returns their ids
    fn prune_stale(&self) -> Vec<String> {
        Vec::new()
    }
}
