//! Device model shared by the registry, the description resolver and the
//! control path.

use std::net::IpAddr;
use std::time::Instant;

use serde::Serialize;

/// Label reported for devices whose description has not told us a name yet
pub const UNKNOWN_DEVICE_NAME: &str = "UPnP Device";

/// The UPnP AV services this engine knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceKind {
    /// AVTransport - transport control (set URI, play, pause, stop, seek)
    AVTransport,
    /// RenderingControl - volume and mute
    RenderingControl,
}

impl ServiceKind {
    /// Service type name as it appears inside a service type URN
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::AVTransport => "AVTransport",
            ServiceKind::RenderingControl => "RenderingControl",
        }
    }

    /// Service type URN for a given version, e.g. `urn:schemas-upnp-org:service:AVTransport:1`
    pub fn urn(&self, version: u32) -> String {
        format!("urn:schemas-upnp-org:service:{}:{}", self.name(), version)
    }

    /// Classify a `<serviceType>` value and pull out its version
    ///
    /// Well-formed URNs are matched on their type segment, so
    /// `GroupRenderingControl` is not mistaken for `RenderingControl`.
    /// Anything else falls back to a substring match. A missing or
    /// non-numeric version is read as 1.
    pub fn from_service_type(service_type: &str) -> Option<(ServiceKind, u32)> {
        let service_type = service_type.trim();
        let segments: Vec<&str> = service_type.split(':').collect();

        if segments.len() >= 4 && segments[0].eq_ignore_ascii_case("urn") && segments[2] == "service" {
            let kind = Self::from_type_name(segments[3])?;
            let version = segments
                .get(4)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(1);
            return Some((kind, version));
        }

        [ServiceKind::AVTransport, ServiceKind::RenderingControl]
            .into_iter()
            .find(|kind| service_type.contains(kind.name()))
            .map(|kind| (kind, 1))
    }

    fn from_type_name(name: &str) -> Option<ServiceKind> {
        match name {
            "AVTransport" => Some(ServiceKind::AVTransport),
            "RenderingControl" => Some(ServiceKind::RenderingControl),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A control service advertised in a device description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub kind: ServiceKind,
    /// `<serviceType>` exactly as the device advertised it
    pub service_type: String,
    /// Absolute control URL
    pub control_url: String,
    /// Absolute event subscription URL, empty when the device has none
    pub event_url: String,
    pub version: u32,
}

impl Capability {
    /// URN used in the SOAPACTION header and the action element namespace
    pub fn service_urn(&self) -> String {
        self.kind.urn(self.version)
    }
}

/// What one accepted SSDP response tells us about a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    /// UDN taken from the USN, or the source address when the response carried none
    pub id: String,
    /// LOCATION header
    pub location: String,
    /// Address the response arrived from
    pub host: IpAddr,
    /// SERVER header
    pub server: Option<String>,
    /// ST header
    pub search_target: Option<String>,
}

/// A renderer tracked by the [`DeviceRegistry`](crate::DeviceRegistry)
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    pub id: String,
    /// Empty until the description has been resolved
    pub friendly_name: String,
    pub description_url: String,
    pub host: IpAddr,
    /// SERVER header hint, used as the display name before resolution
    pub server: Option<String>,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub capabilities: Vec<Capability>,
    pub last_seen: Instant,
    pub resolved: bool,
}

impl DiscoveredDevice {
    /// A fresh, unresolved entry for a first sighting
    pub fn from_candidate(candidate: DeviceCandidate, seen_at: Instant) -> Self {
        Self {
            id: candidate.id,
            friendly_name: String::new(),
            description_url: candidate.location,
            host: candidate.host,
            server: candidate.server.filter(|s| !s.is_empty()),
            device_type: None,
            manufacturer: None,
            model_name: None,
            capabilities: Vec::new(),
            last_seen: seen_at,
            resolved: false,
        }
    }

    /// The capability entry for a service, if the description advertised it
    pub fn capability(&self, kind: ServiceKind) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.kind == kind)
    }

    /// Whether the device can be asked to play media
    ///
    /// Before resolution every renderer found by the SSDP filter is assumed
    /// to support playback; afterwards the AVTransport capability decides.
    pub fn supports_playback(&self) -> bool {
        !self.resolved || self.capability(ServiceKind::AVTransport).is_some()
    }

    /// Friendly name once known, otherwise the SERVER hint
    pub fn display_name(&self) -> String {
        if !self.friendly_name.is_empty() {
            return self.friendly_name.clone();
        }
        self.server
            .clone()
            .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string())
    }

    /// Caller-facing summary of this entry
    pub fn summary(&self) -> DeviceSummary {
        let name = self.display_name();
        DeviceSummary {
            id: self.id.clone(),
            name: name.clone(),
            device_type: "UPnP".to_string(),
            friendly_name: name,
            url: self.description_url.clone(),
            ip: self.host.to_string(),
            supports_playback: self.supports_playback(),
            resolved: self.resolved,
        }
    }
}

/// Device payload carried by discovery events and returned by snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub friendly_name: String,
    pub url: String,
    pub ip: String,
    pub supports_playback: bool,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> DeviceCandidate {
        DeviceCandidate {
            id: "uuid:renderer-1::urn:schemas-upnp-org:device:MediaRenderer:1".to_string(),
            location: "http://192.168.1.50:49152/description.xml".to_string(),
            host: "192.168.1.50".parse().unwrap(),
            server: Some("Linux/5.4 UPnP/1.0 Renderer/2.1".to_string()),
            search_target: Some("urn:schemas-upnp-org:device:MediaRenderer:1".to_string()),
        }
    }

    #[test]
    fn test_service_kind_from_versioned_urn() {
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:AVTransport:1"),
            Some((ServiceKind::AVTransport, 1))
        );
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:RenderingControl:3"),
            Some((ServiceKind::RenderingControl, 3))
        );
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:AVTransport"),
            Some((ServiceKind::AVTransport, 1))
        );
    }

    #[test]
    fn test_service_kind_ignores_other_services() {
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:GroupRenderingControl:1"),
            None
        );
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:ConnectionManager:1"),
            None
        );
    }

    #[test]
    fn test_service_urn() {
        assert_eq!(
            ServiceKind::AVTransport.urn(2),
            "urn:schemas-upnp-org:service:AVTransport:2"
        );
    }

    #[test]
    fn test_unresolved_device_summary() {
        let device = DiscoveredDevice::from_candidate(candidate(), Instant::now());
        let summary = device.summary();

        assert!(!device.resolved);
        assert!(device.friendly_name.is_empty());
        assert_eq!(summary.name, "Linux/5.4 UPnP/1.0 Renderer/2.1");
        assert_eq!(summary.device_type, "UPnP");
        assert_eq!(summary.ip, "192.168.1.50");
        assert!(summary.supports_playback);
        assert!(!summary.resolved);
    }

    #[test]
    fn test_resolved_device_without_transport_cannot_play() {
        let mut device = DiscoveredDevice::from_candidate(candidate(), Instant::now());
        device.resolved = true;
        device.friendly_name = "Kitchen".to_string();

        assert!(!device.supports_playback());
        assert_eq!(device.summary().friendly_name, "Kitchen");
    }

    #[test]
    fn test_display_name_fallback() {
        let mut c = candidate();
        c.server = None;
        let device = DiscoveredDevice::from_candidate(c, Instant::now());
        assert_eq!(device.display_name(), UNKNOWN_DEVICE_NAME);
    }
}
