use std::collections::BTreeMap;
use std::time::Duration;

use dlna_discovery::{Capability, DiscoveredDevice, ServiceKind};
use soap_client::{ActionResponse, SoapClient};
use tracing::debug;

use crate::didl;
use crate::operation::UPnPOperation;
use crate::operations::av_transport::{
    GetPositionInfoOperation, GetPositionInfoRequest, GetTransportInfoOperation,
    GetTransportInfoRequest, PauseOperation, PauseRequest, PlayOperation, PlayRequest,
    PositionInfo, SeekOperation, SeekRequest, SetAVTransportURIOperation,
    SetAVTransportURIRequest, StopOperation, StopRequest, TransportInfo, SEEK_REL_TIME,
};
use crate::operations::rendering_control::{
    GetVolumeOperation, GetVolumeRequest, SetVolumeOperation, SetVolumeRequest, MASTER_CHANNEL,
};
use crate::time::format_position;
use crate::{ApiError, Result};

/// Issues UPnP actions against resolved renderers
///
/// Every call checks the device snapshot first: an unresolved device or a
/// missing service fails before anything goes on the wire. Calls are
/// independent and may run concurrently from several threads.
#[derive(Debug, Clone, Default)]
pub struct ControlClient {
    soap: SoapClient,
}

impl ControlClient {
    /// Client with the default 10 second request bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            soap: SoapClient::with_timeout(timeout),
        }
    }

    /// Invoke an arbitrary action and return its output arguments
    pub fn invoke(
        &self,
        device: &DiscoveredDevice,
        service: ServiceKind,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<BTreeMap<String, String>> {
        self.call(device, service, action, arguments)
            .map(|response| response.outputs())
    }

    /// Execute a typed operation
    pub fn execute<Op: UPnPOperation>(
        &self,
        device: &DiscoveredDevice,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let arguments = Op::build_arguments(request)?;
        let borrowed: Vec<(&str, &str)> = arguments
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();

        let response = self.call(device, Op::SERVICE, Op::ACTION, &borrowed)?;
        Op::parse_response(&response)
    }

    fn call(
        &self,
        device: &DiscoveredDevice,
        service: ServiceKind,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<ActionResponse> {
        let capability = require_capability(device, service)?;
        debug!("{}#{} on {}", service, action, device.id);

        self.soap
            .call(
                &capability.control_url,
                &capability.service_urn(),
                action,
                arguments,
            )
            .map_err(ApiError::from)
    }

    /// Load a media URL; `metadata` is sent verbatim as `CurrentURIMetaData`
    pub fn set_transport_uri(
        &self,
        device: &DiscoveredDevice,
        media_url: &str,
        metadata: &str,
    ) -> Result<()> {
        let request = SetAVTransportURIRequest::new(media_url.to_string(), metadata.to_string());
        self.execute::<SetAVTransportURIOperation>(device, &request)
    }

    /// Load a media URL with a DIDL-Lite item titled `title`
    pub fn load_media(&self, device: &DiscoveredDevice, media_url: &str, title: &str) -> Result<()> {
        self.set_transport_uri(device, media_url, &didl::item_metadata(title))
    }

    pub fn play(&self, device: &DiscoveredDevice) -> Result<()> {
        self.execute::<PlayOperation>(device, &PlayRequest::new("1".to_string()))
    }

    pub fn pause(&self, device: &DiscoveredDevice) -> Result<()> {
        self.execute::<PauseOperation>(device, &PauseRequest::new())
    }

    pub fn stop(&self, device: &DiscoveredDevice) -> Result<()> {
        self.execute::<StopOperation>(device, &StopRequest::new())
    }

    /// Seek to a position in the current track
    pub fn seek(&self, device: &DiscoveredDevice, position: Duration) -> Result<()> {
        let request = SeekRequest::new(SEEK_REL_TIME.to_string(), format_position(position));
        self.execute::<SeekOperation>(device, &request)
    }

    pub fn get_transport_info(&self, device: &DiscoveredDevice) -> Result<TransportInfo> {
        self.execute::<GetTransportInfoOperation>(device, &GetTransportInfoRequest::new())
    }

    pub fn get_position_info(&self, device: &DiscoveredDevice) -> Result<PositionInfo> {
        self.execute::<GetPositionInfoOperation>(device, &GetPositionInfoRequest::new())
    }

    /// Set the master volume, 0 to 100
    pub fn set_volume(&self, device: &DiscoveredDevice, volume: u8) -> Result<()> {
        let request = SetVolumeRequest::new(MASTER_CHANNEL.to_string(), volume);
        self.execute::<SetVolumeOperation>(device, &request)
    }

    /// Current master volume, 0 to 100
    pub fn get_volume(&self, device: &DiscoveredDevice) -> Result<u8> {
        self.execute::<GetVolumeOperation>(device, &GetVolumeRequest::new(MASTER_CHANNEL.to_string()))
    }
}

/// The capability an action on `service` needs, or the reason it cannot run
pub fn require_capability(device: &DiscoveredDevice, service: ServiceKind) -> Result<&Capability> {
    if !device.resolved {
        return Err(ApiError::DeviceNotResolved(device.id.clone()));
    }

    device
        .capability(service)
        .ok_or_else(|| ApiError::CapabilityMissing {
            device_id: device.id.clone(),
            service,
        })
}
