//! SSDP message codec
//!
//! Builds the M-SEARCH request and decodes the HTTP-like responses devices
//! send back. Decoding is deliberately lenient: any `key: value` line is
//! taken, header names are case-insensitive and the status line is ignored.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::device::DeviceCandidate;
use crate::error::{DiscoveryError, Result};

/// SSDP multicast group
pub const MULTICAST_GROUP: &str = "239.255.255.250";

/// SSDP port
pub const SSDP_PORT: u16 = 1900;

/// Search target matching every device and service
pub const SEARCH_ALL: &str = "ssdp:all";

/// Build an M-SEARCH request
pub fn build_msearch(search_target: &str, mx: u8) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         ST: {}\r\n\
         MX: {}\r\n\
         \r\n",
        MULTICAST_GROUP, SSDP_PORT, search_target, mx
    )
}

/// A decoded SSDP message: the start line plus its headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpMessage {
    start_line: String,
    headers: HashMap<String, String>,
}

impl SsdpMessage {
    /// Decode a raw datagram
    ///
    /// Lines are split on CRLF (a bare LF is tolerated), the first line is
    /// kept only as the start line, and every other line is split on its
    /// first colon. Lines without a colon are skipped. A message with no
    /// headers at all is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let start_line = lines
            .next()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| DiscoveryError::MalformedMessage("empty message".to_string()))?;

        let headers: HashMap<String, String> = lines
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_ascii_uppercase(), value.trim().to_string()))
            })
            .collect();

        if headers.is_empty() {
            return Err(DiscoveryError::MalformedMessage(format!(
                "no headers after '{}'",
                start_line
            )));
        }

        Ok(Self { start_line, headers })
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_uppercase())
            .map(|value| value.as_str())
    }

    /// First line of the message, e.g. `HTTP/1.1 200 OK`
    pub fn start_line(&self) -> &str {
        &self.start_line
    }

    /// Whether this is a NOTIFY or M-SEARCH request rather than a search response
    pub fn is_request(&self) -> bool {
        !self.start_line.to_ascii_uppercase().starts_with("HTTP/")
    }

    /// Turn a search response into a registry candidate
    ///
    /// Returns `None` when the response has no LOCATION or fails the
    /// renderer filter. The id is the UDN part of the USN (everything before
    /// `::`), so the several responses one device sends for `ssdp:all`
    /// collapse onto one entry; it falls back to `source` when USN is
    /// missing or empty.
    pub fn to_candidate(&self, source: IpAddr) -> Option<DeviceCandidate> {
        let location = self.header("LOCATION").filter(|l| !l.is_empty())?;
        let search_target = self.header("ST").map(|st| st.to_string());

        if !is_renderer_target(search_target.as_deref()) {
            return None;
        }

        let id = self
            .header("USN")
            .map(device_id_from_usn)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| source.to_string());

        Some(DeviceCandidate {
            id,
            location: location.to_string(),
            host: source,
            server: self.header("SERVER").map(|s| s.to_string()),
            search_target,
        })
    }
}

/// Renderer filter for search responses
///
/// This is a heuristic, not a service-type match: a response passes when it
/// has no ST at all (treated as match-all) or when its ST contains
/// `MediaRenderer` or `AVTransport` anywhere.
pub fn is_renderer_target(search_target: Option<&str>) -> bool {
    match search_target {
        None => true,
        Some(st) => st.contains("MediaRenderer") || st.contains("AVTransport"),
    }
}

/// UDN portion of a USN header
pub fn device_id_from_usn(usn: &str) -> String {
    usn.split("::").next().unwrap_or(usn).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn source() -> IpAddr {
        "192.168.1.50".parse().unwrap()
    }

    #[test]
    fn test_msearch_template() {
        let request = build_msearch(SEARCH_ALL, 3);
        assert_eq!(
            request,
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: 239.255.255.250:1900\r\n\
             MAN: \"ssdp:discover\"\r\n\
             ST: ssdp:all\r\n\
             MX: 3\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_parse_valid_response() {
        let response = "HTTP/1.1 200 OK\r\n\
            CACHE-CONTROL: max-age=1800\r\n\
            LOCATION: http://192.168.1.50:49152/description.xml\r\n\
            SERVER: Linux/5.4 UPnP/1.0 Renderer/2.1\r\n\
            ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            USN: uuid:renderer-1::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            \r\n";

        let message = SsdpMessage::parse(response).unwrap();
        assert_eq!(message.start_line(), "HTTP/1.1 200 OK");
        assert!(!message.is_request());
        assert_eq!(
            message.header("location"),
            Some("http://192.168.1.50:49152/description.xml")
        );

        let candidate = message.to_candidate(source()).unwrap();
        assert_eq!(candidate.id, "uuid:renderer-1");
        assert_eq!(candidate.location, "http://192.168.1.50:49152/description.xml");
        assert_eq!(candidate.server.as_deref(), Some("Linux/5.4 UPnP/1.0 Renderer/2.1"));
        assert_eq!(candidate.host, source());
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\n\
            location: http://10.0.0.5/desc.xml\r\n\
            St: urn:schemas-upnp-org:service:AVTransport:1\r\n\
            usn: uuid:abc::urn:schemas-upnp-org:service:AVTransport:1\r\n\
            \r\n";

        let message = SsdpMessage::parse(response).unwrap();
        assert_eq!(message.header("LOCATION"), Some("http://10.0.0.5/desc.xml"));
        assert_eq!(message.header("Usn"), Some("uuid:abc::urn:schemas-upnp-org:service:AVTransport:1"));
    }

    #[test]
    fn test_value_split_on_first_colon_only() {
        let response = "HTTP/1.1 200 OK\r\nLOCATION:   http://10.0.0.5:8080/desc.xml  \r\n\r\n";
        let message = SsdpMessage::parse(response).unwrap();
        assert_eq!(message.header("LOCATION"), Some("http://10.0.0.5:8080/desc.xml"));
    }

    #[test]
    fn test_missing_location_is_dropped() {
        let response = "HTTP/1.1 200 OK\r\n\
            ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            USN: uuid:renderer-1\r\n\
            \r\n";

        let message = SsdpMessage::parse(response).unwrap();
        assert!(message.to_candidate(source()).is_none());
    }

    #[test]
    fn test_missing_usn_falls_back_to_source() {
        let response = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.50/desc.xml\r\n\
            ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
            \r\n";

        let candidate = SsdpMessage::parse(response)
            .unwrap()
            .to_candidate(source())
            .unwrap();
        assert_eq!(candidate.id, "192.168.1.50");
    }

    #[test]
    fn test_empty_usn_falls_back_to_source() {
        let response = "HTTP/1.1 200 OK\r\nLOCATION: http://192.168.1.50/desc.xml\r\nUSN:\r\n\r\n";

        let candidate = SsdpMessage::parse(response)
            .unwrap()
            .to_candidate(source())
            .unwrap();
        assert_eq!(candidate.id, "192.168.1.50");
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("urn:schemas-upnp-org:device:MediaRenderer:1"), true)]
    #[case(Some("urn:schemas-upnp-org:service:AVTransport:2"), true)]
    #[case(Some("urn:schemas-upnp-org:device:MediaServer:1"), false)]
    #[case(Some("upnp:rootdevice"), false)]
    #[case(Some("urn:dial-multiscreen-org:service:dial:1"), false)]
    fn test_renderer_filter(#[case] st: Option<&str>, #[case] accepted: bool) {
        assert_eq!(is_renderer_target(st), accepted);
    }

    #[test]
    fn test_non_renderer_response_rejected() {
        let response = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.1:5000/rootDesc.xml\r\n\
            ST: urn:schemas-upnp-org:device:InternetGatewayDevice:1\r\n\
            USN: uuid:router::urn:schemas-upnp-org:device:InternetGatewayDevice:1\r\n\
            \r\n";

        let message = SsdpMessage::parse(response).unwrap();
        assert!(message.to_candidate(source()).is_none());
    }

    #[test]
    fn test_notify_is_request() {
        let notify = "NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNTS: ssdp:alive\r\n\r\n";
        assert!(SsdpMessage::parse(notify).unwrap().is_request());
    }

    #[rstest]
    #[case("")]
    #[case("\r\n\r\n")]
    #[case("This is not a valid SSDP response")]
    #[case("HTTP/1.1 200 OK\r\nno colon here\r\n\r\n")]
    fn test_malformed_messages(#[case] text: &str) {
        assert!(matches!(
            SsdpMessage::parse(text),
            Err(DiscoveryError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_device_id_from_usn() {
        assert_eq!(
            device_id_from_usn("uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1"),
            "uuid:RINCON_000E58A0123456"
        );
        assert_eq!(device_id_from_usn("uuid:plain"), "uuid:plain");
    }
}
