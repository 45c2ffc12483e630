//! Device description fetching and parsing.
//!
//! A renderer's description document lists the services it exposes. Only
//! AVTransport and RenderingControl are kept; their control and event URLs
//! are made absolute so the control path never has to know where the
//! document came from.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::device::{Capability, DiscoveredDevice, ServiceKind};
use crate::error::{DiscoveryError, Result};
use crate::registry::DeviceRegistry;

#[derive(Debug, Deserialize)]
struct RootXml {
    #[serde(rename = "URLBase", default)]
    url_base: Option<String>,
    device: DeviceXml,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceXml {
    #[serde(default)]
    device_type: Option<String>,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(rename = "UDN", default)]
    udn: Option<String>,
    #[serde(default)]
    service_list: Option<ServiceListXml>,
    #[serde(default)]
    device_list: Option<DeviceListXml>,
}

#[derive(Debug, Deserialize)]
struct ServiceListXml {
    #[serde(rename = "service", default)]
    services: Vec<ServiceXml>,
}

#[derive(Debug, Deserialize)]
struct DeviceListXml {
    #[serde(rename = "device", default)]
    devices: Vec<DeviceXml>,
}

#[derive(Debug, Deserialize)]
struct ServiceXml {
    #[serde(rename = "serviceType")]
    service_type: String,
    #[serde(rename = "controlURL")]
    control_url: String,
    #[serde(rename = "eventSubURL", default)]
    event_sub_url: Option<String>,
}

/// What a description document says about a renderer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceDescription {
    pub friendly_name: String,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub udn: Option<String>,
    /// At most one entry per [`ServiceKind`], root device first
    pub capabilities: Vec<Capability>,
}

impl DeviceDescription {
    /// Parse a description document fetched from `description_url`
    ///
    /// Relative service URLs are resolved against `<URLBase>` when the
    /// document has one, else against `description_url`. Embedded devices
    /// are searched depth-first after the root device. Any structural
    /// problem fails the whole parse.
    pub fn from_xml(xml: &str, description_url: &str) -> Result<Self> {
        let root: RootXml = quick_xml::de::from_str(xml).map_err(|e| {
            DiscoveryError::DescriptionParse(format!("Failed to parse device XML: {}", e))
        })?;

        let base = Self::base_url(root.url_base.as_deref(), description_url)?;

        let mut capabilities: Vec<Capability> = Vec::new();
        collect_capabilities(&root.device, &base, &mut capabilities)?;

        let device = root.device;
        Ok(Self {
            friendly_name: device
                .friendly_name
                .map(|n| n.trim().to_string())
                .unwrap_or_default(),
            device_type: non_empty(device.device_type),
            manufacturer: non_empty(device.manufacturer),
            model_name: non_empty(device.model_name),
            udn: non_empty(device.udn),
            capabilities,
        })
    }

    fn base_url(url_base: Option<&str>, description_url: &str) -> Result<Url> {
        if let Some(base) = url_base.map(str::trim).filter(|b| !b.is_empty()) {
            match Url::parse(base) {
                Ok(url) => return Ok(url),
                Err(e) => debug!("Ignoring unusable URLBase '{}': {}", base, e),
            }
        }

        Url::parse(description_url).map_err(|e| {
            DiscoveryError::DescriptionParse(format!(
                "Invalid description URL '{}': {}",
                description_url, e
            ))
        })
    }
}

fn collect_capabilities(device: &DeviceXml, base: &Url, out: &mut Vec<Capability>) -> Result<()> {
    if let Some(list) = &device.service_list {
        for service in &list.services {
            let Some((kind, version)) = ServiceKind::from_service_type(&service.service_type) else {
                continue;
            };
            if out.iter().any(|c| c.kind == kind) {
                continue;
            }

            let control_url = service.control_url.trim();
            if control_url.is_empty() {
                return Err(DiscoveryError::DescriptionParse(format!(
                    "Service {} has an empty controlURL",
                    service.service_type
                )));
            }

            let event_url = match service.event_sub_url.as_deref().map(str::trim) {
                Some(event) if !event.is_empty() => absolute(base, event)?,
                _ => String::new(),
            };

            out.push(Capability {
                kind,
                service_type: service.service_type.trim().to_string(),
                control_url: absolute(base, control_url)?,
                event_url,
                version,
            });
        }
    }

    if let Some(list) = &device.device_list {
        for embedded in &list.devices {
            collect_capabilities(embedded, base, out)?;
        }
    }

    Ok(())
}

fn absolute(base: &Url, reference: &str) -> Result<String> {
    base.join(reference)
        .map(String::from)
        .map_err(|e| DiscoveryError::DescriptionParse(format!("Invalid service URL '{}': {}", reference, e)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Fetches description documents and applies them to the registry
#[derive(Debug, Clone)]
pub struct DescriptionResolver {
    http: reqwest::blocking::Client,
}

impl DescriptionResolver {
    /// Create a resolver whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Fetch and parse one description document
    pub fn fetch(&self, description_url: &str) -> Result<DeviceDescription> {
        debug!("Fetching device description from {}", description_url);

        let fetch_error = |reason: String| DiscoveryError::DescriptionFetch {
            url: description_url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(description_url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let body = response.text().map_err(|e| fetch_error(e.to_string()))?;
        DeviceDescription::from_xml(&body, description_url)
    }

    /// Resolve a registry entry: fetch its description and record the result
    ///
    /// Idempotent; re-running refreshes the capability set. On failure the
    /// entry is left exactly as it was, including when the device announced
    /// a new LOCATION while the old document was being fetched.
    pub fn resolve(&self, registry: &DeviceRegistry, device_id: &str) -> Result<DiscoveredDevice> {
        let device = registry
            .get(device_id)
            .ok_or_else(|| DiscoveryError::DeviceNotFound(device_id.to_string()))?;

        let description = self.fetch(&device.description_url).map_err(|e| {
            warn!("Failed to resolve {}: {}", device_id, e);
            e
        })?;

        debug!(
            "Resolved {} as '{}' with {} control service(s)",
            device_id,
            description.friendly_name,
            description.capabilities.len()
        );

        registry.apply_description(device_id, &device.description_url, description)
    }
}
