//! Test helpers: engine wiring over a scripted transport and SOAP bodies for mockito

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dlna_discovery::{DeviceCandidate, DeviceRegistry};
use dlna_sdk::{DiscoveryConfig, EngineConfig, RendererSystem, UpnpBackend};

pub use dlna_discovery::test_support::ScriptedTransport;

pub const AV_PATH: &str = "/AVTransport/control";
pub const RC_PATH: &str = "/RenderingControl/control";
pub const DEVICE_ID: &str = "uuid:kitchen-0001";

/// Load a fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

/// Short scans so tests finish quickly
pub fn test_config() -> EngineConfig {
    EngineConfig::new()
        .with_discovery(
            DiscoveryConfig::new()
                .with_scan_window(Duration::from_millis(400))
                .with_receive_timeout(Duration::from_millis(50)),
        )
        .with_control_timeout(Duration::from_secs(5))
}

/// A renderer search response
pub fn search_response(location: &str, uuid: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=1800\r\n\
         LOCATION: {}\r\n\
         SERVER: Linux/5.10 UPnP/1.0 KitchenSpeaker/2.0\r\n\
         ST: urn:schemas-upnp-org:service:AVTransport:1\r\n\
         USN: {}::urn:schemas-upnp-org:service:AVTransport:1\r\n\r\n",
        location, uuid
    )
}

/// SOAP success envelope
pub fn envelope(action: &str, service: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action}Response xmlns:u="urn:schemas-upnp-org:service:{service}:1">{body}</u:{action}Response></s:Body></s:Envelope>"#,
        action = action,
        service = service,
        body = body
    )
}

/// SOAP fault envelope as sent with HTTP 500
pub fn fault(code: u16, description: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>{}</errorCode><errorDescription>{}</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#,
        code, description
    )
}

/// Engine plus a handle on its registry, for seeding devices directly
pub fn system_with(transport: ScriptedTransport) -> (RendererSystem, Arc<DeviceRegistry>) {
    let backend = UpnpBackend::with_transport(test_config(), Box::new(transport)).unwrap();
    let registry = Arc::clone(backend.registry());
    (RendererSystem::with_backend(Box::new(backend)), registry)
}

/// Put a device into the registry as if an SSDP response had arrived
pub fn seed_device(registry: &DeviceRegistry, id: &str, location: String) {
    registry.upsert(
        DeviceCandidate {
            id: id.to_string(),
            location,
            host: "127.0.0.1".parse().unwrap(),
            server: Some("Linux/5.10 UPnP/1.0 KitchenSpeaker/2.0".to_string()),
            search_target: Some("urn:schemas-upnp-org:device:MediaRenderer:1".to_string()),
        },
        Instant::now(),
    );
}
