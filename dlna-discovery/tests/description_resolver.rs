//! Description resolution against a mock HTTP device

mod helpers;

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dlna_discovery::{
    DescriptionResolver, DeviceCandidate, DeviceRegistry, DiscoveryError, RegistryEvent,
    ServiceKind,
};
use helpers::load_fixture;

fn resolver() -> DescriptionResolver {
    DescriptionResolver::new(Duration::from_secs(5)).unwrap()
}

fn register(registry: &DeviceRegistry, id: &str, location: String) {
    registry.upsert(
        DeviceCandidate {
            id: id.to_string(),
            location,
            host: "127.0.0.1".parse::<IpAddr>().unwrap(),
            server: Some("Linux UPnP/1.0 Renderer/1.0".to_string()),
            search_target: Some("urn:schemas-upnp-org:device:MediaRenderer:1".to_string()),
        },
        Instant::now(),
    );
}

#[test]
fn test_resolve_single_av_transport() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/description.xml")
        .with_status(200)
        .with_header("content-type", "text/xml; charset=\"utf-8\"")
        .with_body(load_fixture("renderer_av1.xml"))
        .create();

    let registry = DeviceRegistry::new();
    register(&registry, "uuid:tv", format!("{}/description.xml", server.url()));
    let events = registry.subscribe();

    let device = resolver().resolve(&registry, "uuid:tv").unwrap();
    mock.assert();

    assert!(device.resolved);
    assert_eq!(device.friendly_name, "Living Room TV");
    assert_eq!(device.manufacturer.as_deref(), Some("Acme Electronics"));
    assert_eq!(device.model_name.as_deref(), Some("ScreenCast 55"));
    assert_eq!(device.capabilities.len(), 1);

    let transport = device.capability(ServiceKind::AVTransport).unwrap();
    assert_eq!(transport.version, 1);
    assert_eq!(
        transport.control_url,
        format!("{}/upnp/control/AVTransport1", server.url())
    );
    assert_eq!(
        transport.event_url,
        format!("{}/upnp/event/AVTransport1", server.url())
    );
    assert!(device.capability(ServiceKind::RenderingControl).is_none());

    // The stored entry matches the returned snapshot
    assert_eq!(registry.get("uuid:tv").unwrap(), device);
    assert!(matches!(
        events.try_recv(),
        Some(RegistryEvent::DeviceUpdated { .. })
    ));
}

#[test]
fn test_resolve_embedded_renderer() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(load_fixture("zoneplayer_embedded.xml"))
        .create();

    let registry = DeviceRegistry::new();
    register(
        &registry,
        "uuid:RINCON_000E58A0123456",
        format!("{}/xml/device_description.xml", server.url()),
    );

    let device = resolver()
        .resolve(&registry, "uuid:RINCON_000E58A0123456")
        .unwrap();

    assert_eq!(device.friendly_name, "192.168.1.40 - Office");
    assert_eq!(device.capabilities.len(), 2);
    assert!(device.supports_playback());
    assert_eq!(
        device.capability(ServiceKind::AVTransport).unwrap().control_url,
        format!("{}/MediaRenderer/AVTransport/Control", server.url())
    );
    assert_eq!(
        device
            .capability(ServiceKind::RenderingControl)
            .unwrap()
            .control_url,
        format!("{}/MediaRenderer/RenderingControl/Control", server.url())
    );
}

#[test]
fn test_resolve_honours_url_base() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/desc.xml")
        .with_status(200)
        .with_body(load_fixture("rendering_only.xml"))
        .create();

    let registry = DeviceRegistry::new();
    register(&registry, "uuid:bathroom", format!("{}/desc.xml", server.url()));

    let device = resolver().resolve(&registry, "uuid:bathroom").unwrap();
    let rendering = device.capability(ServiceKind::RenderingControl).unwrap();

    assert_eq!(rendering.version, 2);
    assert_eq!(rendering.control_url, "http://192.168.1.77:8200/rc/control");
    assert!(!device.supports_playback());
    assert!(!device.summary().supports_playback);
}

#[test]
fn test_not_found_leaves_device_unresolved() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/description.xml").with_status(404).create();

    let registry = DeviceRegistry::new();
    register(&registry, "uuid:tv", format!("{}/description.xml", server.url()));

    let result = resolver().resolve(&registry, "uuid:tv");
    match result {
        Err(DiscoveryError::DescriptionFetch { url, reason }) => {
            assert!(url.ends_with("/description.xml"));
            assert!(reason.contains("404"));
        }
        other => panic!("expected DescriptionFetch, got {:?}", other),
    }

    let stored = registry.get("uuid:tv").unwrap();
    assert!(!stored.resolved);
    assert!(stored.capabilities.is_empty());
}

#[test]
fn test_malformed_description_is_all_or_nothing() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/description.xml")
        .with_status(200)
        .with_body(
            r#"<root><device><friendlyName>Half</friendlyName><serviceList>
<service><serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType><controlURL>/av</controlURL></service>
<service><serviceType>urn:schemas-upnp-org:service:RenderingControl:1</serviceType>"#,
        )
        .create();

    let registry = DeviceRegistry::new();
    register(&registry, "uuid:half", format!("{}/description.xml", server.url()));

    assert!(matches!(
        resolver().resolve(&registry, "uuid:half"),
        Err(DiscoveryError::DescriptionParse(_))
    ));

    let stored = registry.get("uuid:half").unwrap();
    assert!(!stored.resolved);
    assert!(stored.friendly_name.is_empty());
    assert!(stored.capabilities.is_empty());
}

#[test]
fn test_resolve_is_idempotent() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/description.xml")
        .with_status(200)
        .with_body(load_fixture("renderer_av1.xml"))
        .expect(2)
        .create();

    let registry = DeviceRegistry::new();
    register(&registry, "uuid:tv", format!("{}/description.xml", server.url()));

    let first = resolver().resolve(&registry, "uuid:tv").unwrap();
    let second = resolver().resolve(&registry, "uuid:tv").unwrap();
    mock.assert();

    assert_eq!(first.capabilities, second.capabilities);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_unknown_device() {
    let registry = DeviceRegistry::new();
    assert!(matches!(
        resolver().resolve(&registry, "uuid:ghost"),
        Err(DiscoveryError::DeviceNotFound(_))
    ));
}

#[test]
fn test_unreachable_device() {
    let registry = DeviceRegistry::new();
    // Nothing listens on the discard port
    register(&registry, "uuid:gone", "http://127.0.0.1:9/description.xml".to_string());

    assert!(matches!(
        resolver().resolve(&registry, "uuid:gone"),
        Err(DiscoveryError::DescriptionFetch { .. })
    ));
}
