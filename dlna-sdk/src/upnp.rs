//! UPnP/DLNA backend

use std::sync::Arc;
use std::time::{Duration, Instant};

use dlna_api::ControlClient;
use dlna_discovery::{
    DescriptionResolver, DeviceRegistry, DeviceSummary, DiscoveredDevice, DiscoverySession,
    EventIterator, SharedMulticastLock, SsdpTransport,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::RendererBackend;
use crate::config::EngineConfig;
use crate::status::PlaybackStatus;
use crate::{Result, SdkError};

/// Renderers found over SSDP and driven with SOAP actions
///
/// Descriptions are fetched lazily: the first control call against an
/// unresolved device resolves it, and later calls reuse the stored
/// capabilities.
pub struct UpnpBackend {
    config: EngineConfig,
    registry: Arc<DeviceRegistry>,
    session: Mutex<DiscoverySession>,
    resolver: DescriptionResolver,
    control: ControlClient,
}

impl UpnpBackend {
    /// Backend on the UDP multicast transport with no platform lock
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_multicast_lock(config, SharedMulticastLock::default())
    }

    /// Backend whose scans hold `lock` while joined to the multicast group
    pub fn with_multicast_lock(config: EngineConfig, lock: SharedMulticastLock) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(DeviceRegistry::new());
        let session = DiscoverySession::multicast(config.discovery.clone(), Arc::clone(&registry), lock);
        Self::assemble(config, registry, session)
    }

    /// Backend over an arbitrary SSDP transport
    pub fn with_transport(config: EngineConfig, transport: Box<dyn SsdpTransport>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(DeviceRegistry::new());
        let session = DiscoverySession::new(config.discovery.clone(), Arc::clone(&registry), transport);
        Self::assemble(config, registry, session)
    }

    fn assemble(
        config: EngineConfig,
        registry: Arc<DeviceRegistry>,
        session: DiscoverySession,
    ) -> Result<Self> {
        let resolver = DescriptionResolver::new(config.discovery.description_timeout)?;
        let control = ControlClient::with_timeout(config.control_timeout);

        Ok(Self {
            config,
            registry,
            session: Mutex::new(session),
            resolver,
            control,
        })
    }

    /// The registry this backend discovers into
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of a device ready for control, resolving it first if needed
    pub fn resolved_device(&self, device_id: &str) -> Result<DiscoveredDevice> {
        let device = self
            .registry
            .get(device_id)
            .ok_or_else(|| SdkError::DeviceNotFound(device_id.to_string()))?;

        if device.resolved {
            return Ok(device);
        }

        debug!("Resolving {} before first control call", device_id);
        Ok(self.resolver.resolve(&self.registry, device_id)?)
    }
}

impl RendererBackend for UpnpBackend {
    fn name(&self) -> &'static str {
        "UPnP"
    }

    fn discover(&self) -> Result<()> {
        self.session.lock().start()?;
        Ok(())
    }

    fn stop_discovery(&self) -> bool {
        self.session.lock().stop()
    }

    fn is_discovering(&self) -> bool {
        self.session.lock().is_scanning()
    }

    fn devices(&self) -> Vec<DeviceSummary> {
        self.registry
            .list()
            .iter()
            .map(DiscoveredDevice::summary)
            .collect()
    }

    fn connect(&self, device_id: &str) -> Result<DeviceSummary> {
        if !self.registry.contains(device_id) {
            return Err(SdkError::DeviceNotFound(device_id.to_string()));
        }

        let device = self.resolver.resolve(&self.registry, device_id)?;
        info!("Connected to {} ({})", device.display_name(), device_id);
        Ok(device.summary())
    }

    fn load_media(&self, device_id: &str, media_url: &str, title: &str) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.load_media(&device, media_url, title)?;
        Ok(())
    }

    fn play(&self, device_id: &str) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.play(&device)?;
        Ok(())
    }

    fn pause(&self, device_id: &str) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.pause(&device)?;
        Ok(())
    }

    fn stop(&self, device_id: &str) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.stop(&device)?;
        Ok(())
    }

    fn seek(&self, device_id: &str, position: Duration) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.seek(&device, position)?;
        Ok(())
    }

    fn set_volume(&self, device_id: &str, volume: u8) -> Result<()> {
        let device = self.resolved_device(device_id)?;
        self.control.set_volume(&device, volume)?;
        Ok(())
    }

    fn get_volume(&self, device_id: &str) -> Result<u8> {
        let device = self.resolved_device(device_id)?;
        Ok(self.control.get_volume(&device)?)
    }

    fn playback_status(&self, device_id: &str) -> Result<PlaybackStatus> {
        let device = self.resolved_device(device_id)?;
        let transport = self.control.get_transport_info(&device)?;
        let position = self.control.get_position_info(&device)?;
        Ok(PlaybackStatus::from_parts(transport, position))
    }

    fn subscribe(&self) -> EventIterator {
        self.registry.subscribe()
    }

    fn prune_stale(&self) -> Vec<String> {
        self.registry
            .sweep_stale(self.config.discovery.stale_after, Instant::now())
    }
}

impl std::fmt::Debug for UpnpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpnpBackend")
            .field("devices", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
