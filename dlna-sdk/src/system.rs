//! RendererSystem - main entry point for hosts
//!
//! Wraps one renderer backend and exposes the operations a UI or bridge
//! layer calls. Everything is synchronous; discovery runs on its own worker
//! thread and reports through [`RendererSystem::events`].

use std::time::Duration;

use dlna_discovery::{DeviceSummary, EventIterator};
use tracing::{info, warn};

use crate::backend::RendererBackend;
use crate::config::EngineConfig;
use crate::status::{OperationStatus, PlaybackStatus, VolumeLevel, VolumeStatus};
use crate::upnp::UpnpBackend;
use crate::Result;

const DISCOVERY_STARTED: &str = "SSDP Discovery started";
const DISCOVERY_STOPPED: &str = "Discovery stopped";

/// Highest volume a renderer accepts
pub const MAX_VOLUME: u8 = 100;

/// Engine facade over a renderer backend
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use dlna_sdk::RendererSystem;
///
/// fn main() -> Result<(), dlna_sdk::SdkError> {
///     let system = RendererSystem::new()?;
///     let events = system.events();
///
///     system.start_discovery();
///     for event in events.timeout_iter(Duration::from_secs(5)) {
///         println!("{}: {}", event.name(), event.device_id());
///     }
///
///     if let Some(device) = system.discovered_devices().first() {
///         system.play_media(&device.id, "http://192.168.1.10:8000/track.mp3", "Track")?;
///         system.set_volume(&device.id, 30)?;
///     }
///     Ok(())
/// }
/// ```
pub struct RendererSystem {
    backend: Box<dyn RendererBackend>,
}

impl RendererSystem {
    /// UPnP engine configured from `DLNA_*` environment variables
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::from_env()?)
    }

    /// UPnP engine with an explicit configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Ok(Self::with_backend(Box::new(UpnpBackend::new(config)?)))
    }

    /// Engine over any backend
    pub fn with_backend(backend: Box<dyn RendererBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn RendererBackend {
        self.backend.as_ref()
    }

    /// Begin a scan; devices from a previous scan are removed first
    ///
    /// Failures, including a scan already in progress, are reported in the
    /// status rather than as an error.
    pub fn start_discovery(&self) -> OperationStatus {
        match self.backend.discover() {
            Ok(()) => OperationStatus::ok(DISCOVERY_STARTED),
            Err(e) => {
                warn!("{} discovery did not start: {}", self.backend.name(), e);
                OperationStatus::failed(e.to_string())
            }
        }
    }

    /// End the scan; discovered devices stay available
    pub fn stop_discovery(&self) -> OperationStatus {
        self.backend.stop_discovery();
        OperationStatus::ok(DISCOVERY_STOPPED)
    }

    pub fn is_discovering(&self) -> bool {
        self.backend.is_discovering()
    }

    /// Current device snapshot, sorted by id
    pub fn discovered_devices(&self) -> Vec<DeviceSummary> {
        self.backend.devices()
    }

    /// Fetch or refresh a device's description
    pub fn connect(&self, device_id: &str) -> Result<DeviceSummary> {
        self.backend.connect(device_id)
    }

    /// Load `media_url` and start playback
    ///
    /// Play is only sent once the renderer has accepted the URL.
    pub fn play_media(&self, device_id: &str, media_url: &str, title: &str) -> Result<OperationStatus> {
        self.backend.load_media(device_id, media_url, title)?;
        self.backend.play(device_id)?;

        info!("Playing '{}' on {}", title, device_id);
        Ok(OperationStatus::ok(format!("Playing {}", title)))
    }

    pub fn resume(&self, device_id: &str) -> Result<OperationStatus> {
        self.backend.play(device_id)?;
        Ok(OperationStatus::ok("Playback resumed"))
    }

    pub fn pause(&self, device_id: &str) -> Result<OperationStatus> {
        self.backend.pause(device_id)?;
        Ok(OperationStatus::ok("Playback paused"))
    }

    pub fn stop(&self, device_id: &str) -> Result<OperationStatus> {
        self.backend.stop(device_id)?;
        Ok(OperationStatus::ok("Playback stopped"))
    }

    pub fn seek(&self, device_id: &str, position: Duration) -> Result<OperationStatus> {
        self.backend.seek(device_id, position)?;
        Ok(OperationStatus::ok(format!("Seeked to {}s", position.as_secs())))
    }

    /// Set the volume; values outside 0..=100 are clamped
    pub fn set_volume(&self, device_id: &str, volume: i32) -> Result<VolumeLevel> {
        let volume = clamp_volume(volume);
        self.backend.set_volume(device_id, volume)?;
        Ok(VolumeLevel { volume })
    }

    pub fn get_volume(&self, device_id: &str) -> Result<VolumeStatus> {
        let volume = self.backend.get_volume(device_id)?;
        Ok(VolumeStatus::new(volume))
    }

    /// Transport state and position for "now playing" displays
    pub fn playback_status(&self, device_id: &str) -> Result<PlaybackStatus> {
        self.backend.playback_status(device_id)
    }

    /// Receiver for device lifecycle events from now on
    pub fn events(&self) -> EventIterator {
        self.backend.subscribe()
    }

    /// Remove devices that have stopped answering
    pub fn prune_stale(&self) -> Vec<String> {
        self.backend.prune_stale()
    }
}

impl std::fmt::Debug for RendererSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererSystem")
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn clamp_volume(volume: i32) -> u8 {
    // Fits in u8 after the clamp
    volume.clamp(0, MAX_VOLUME as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SdkError;
    use dlna_discovery::DeviceRegistry;
    use rstest::rstest;

    /// Backend that only implements the required methods
    #[derive(Default)]
    struct MinimalBackend {
        registry: DeviceRegistry,
    }

    impl RendererBackend for MinimalBackend {
        fn name(&self) -> &'static str {
            "Minimal"
        }

        fn discover(&self) -> Result<()> {
            Ok(())
        }

        fn stop_discovery(&self) -> bool {
            false
        }

        fn is_discovering(&self) -> bool {
            false
        }

        fn devices(&self) -> Vec<DeviceSummary> {
            Vec::new()
        }

        fn connect(&self, device_id: &str) -> Result<DeviceSummary> {
            Err(SdkError::DeviceNotFound(device_id.to_string()))
        }

        fn load_media(&self, _device_id: &str, _media_url: &str, _title: &str) -> Result<()> {
            Ok(())
        }

        fn play(&self, _device_id: &str) -> Result<()> {
            Ok(())
        }

        fn pause(&self, _device_id: &str) -> Result<()> {
            Ok(())
        }

        fn stop(&self, _device_id: &str) -> Result<()> {
            Ok(())
        }

        fn set_volume(&self, _device_id: &str, _volume: u8) -> Result<()> {
            Ok(())
        }

        fn get_volume(&self, _device_id: &str) -> Result<u8> {
            Ok(30)
        }

        fn subscribe(&self) -> EventIterator {
            self.registry.subscribe()
        }
    }

    #[test]
    fn test_optional_operations_report_unsupported() {
        let system = RendererSystem::with_backend(Box::new(MinimalBackend::default()));

        match system.seek("cast-1", Duration::from_secs(30)) {
            Err(SdkError::Unsupported(message)) => assert!(message.contains("Minimal")),
            other => panic!("expected Unsupported, got {:?}", other),
        }
        assert!(matches!(
            system.playback_status("cast-1"),
            Err(SdkError::Unsupported(_))
        ));
        assert!(system.prune_stale().is_empty());

        let status = system.play_media("cast-1", "http://host/a.mp3", "A").unwrap();
        assert!(status.success);
    }

    #[rstest]
    #[case(-5, 0)]
    #[case(0, 0)]
    #[case(42, 42)]
    #[case(100, 100)]
    #[case(150, 100)]
    fn test_clamp_volume(#[case] input: i32, #[case] expected: u8) {
        assert_eq!(clamp_volume(input), expected);
    }
}
