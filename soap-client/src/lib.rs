//! Private SOAP client for UPnP device control
//!
//! This crate provides a minimal SOAP 1.1 client for invoking UPnP actions
//! on media renderers. Callers hand it an absolute control URL, the service
//! type URN and an ordered list of string arguments; it returns either the
//! action's output arguments or a typed fault.

mod error;

pub use error::SoapError;

use std::collections::BTreeMap;
use std::time::Duration;

use quick_xml::escape::escape;
use xmltree::{Element, XMLNode};

/// Parsed `<u:{Action}Response>` element of a successful SOAP reply
#[derive(Debug, Clone)]
pub struct ActionResponse {
    element: Element,
}

impl ActionResponse {
    /// Wrap an already extracted response element
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Text of a single output argument, `None` when the device omitted it
    ///
    /// An argument present but empty (`<CurrentURI/>`) yields `Some("")`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.element.get_child(name).map(element_text)
    }

    /// All output arguments keyed by argument name
    pub fn outputs(&self) -> BTreeMap<String, String> {
        self.element
            .children
            .iter()
            .filter_map(|node| node.as_element())
            .map(|child| (child.name.clone(), element_text(child)))
            .collect()
    }

    /// The raw response element
    pub fn element(&self) -> &Element {
        &self.element
    }
}

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with a 10 second request bound
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a SOAP client whose connect and read phases are each bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .build(),
        }
    }

    /// Invoke `action` on the service behind `control_url`
    ///
    /// Arguments are sent in the given order, each value XML-escaped.
    /// A non-2xx reply is always reported as [`SoapError::Fault`], using the
    /// UPnP error code and description from the body when the device sent one.
    pub fn call(
        &self,
        control_url: &str,
        service_urn: &str,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<ActionResponse, SoapError> {
        let body = build_envelope(service_urn, action, arguments);
        let soap_action = format!("\"{}#{}\"", service_urn, action);

        tracing::debug!("SOAP {} -> {}", soap_action, control_url);

        let result = self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body);

        match result {
            Ok(response) => {
                let xml_text = response
                    .into_string()
                    .map_err(|e| SoapError::Network(e.to_string()))?;
                parse_response(&xml_text, action)
            }
            Err(ureq::Error::Status(status, response)) => {
                let xml_text = response.into_string().unwrap_or_default();
                tracing::debug!("SOAP {} failed with HTTP {}", action, status);
                Err(parse_fault_body(&xml_text, status).unwrap_or_else(|| SoapError::Fault {
                    code: status,
                    description: format!("HTTP {}", status),
                }))
            }
            Err(e) => Err(SoapError::Network(e.to_string())),
        }
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the SOAP 1.1 envelope for one action invocation
pub fn build_envelope(service_urn: &str, action: &str, arguments: &[(&str, &str)]) -> String {
    let mut payload = String::new();
    for (name, value) in arguments {
        payload.push_str(&format!("<{name}>{}</{name}>", escape(*value), name = name));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service_urn}">{payload}</u:{action}></s:Body>"#,
            r#"</s:Envelope>"#
        ),
        action = action,
        service_urn = service_urn,
        payload = payload
    )
}

/// Parse a 2xx SOAP reply into the action's response element
///
/// Some renderers answer faults with HTTP 200, so a `<Fault>` in the body
/// still wins over a missing response element.
pub fn parse_response(xml_text: &str, action: &str) -> Result<ActionResponse, SoapError> {
    let xml = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        return Err(fault_from_element(fault, 500));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .map(ActionResponse::new)
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

fn parse_fault_body(xml_text: &str, status: u16) -> Option<SoapError> {
    let xml = Element::parse(xml_text.as_bytes()).ok()?;
    let fault = xml.get_child("Body")?.get_child("Fault")?;
    Some(fault_from_element(fault, status))
}

fn fault_from_element(fault: &Element, default_code: u16) -> SoapError {
    let upnp_error = fault
        .get_child("detail")
        .and_then(|detail| child_ignore_case(detail, "UPnPError"));

    let code = upnp_error
        .and_then(|e| e.get_child("errorCode"))
        .map(element_text)
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(default_code);

    let description = upnp_error
        .and_then(|e| e.get_child("errorDescription"))
        .map(element_text)
        .filter(|d| !d.is_empty())
        .or_else(|| {
            fault
                .get_child("faultstring")
                .map(element_text)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "SOAP fault".to_string());

    SoapError::Fault { code, description }
}

fn child_ignore_case<'a>(parent: &'a Element, name: &str) -> Option<&'a Element> {
    parent
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .find(|child| child.name.eq_ignore_ascii_case(name))
}

fn element_text(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Text(text) | XMLNode::CData(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
