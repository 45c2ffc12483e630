//! Test helpers: description fixtures and canned search responses

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

pub use dlna_discovery::test_support::{ScriptedTransport, TransportLog};

/// Load a fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

/// A renderer search response as a real device would send it
pub fn renderer_response(ip: &str, uuid: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=1800\r\n\
         EXT:\r\n\
         LOCATION: http://{}:49152/description.xml\r\n\
         SERVER: Linux/4.9 UPnP/1.0 Renderer/1.0\r\n\
         ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
         USN: uuid:{}::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\r\n",
        ip, uuid
    )
}
