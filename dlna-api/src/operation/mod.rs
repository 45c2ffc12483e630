//! Operation framework
//!
//! An operation pairs a typed request with the SOAP action it maps to and
//! knows how to read the action's output arguments back into a typed response.

pub(crate) mod macros;

use crate::{ActionResponse, ApiError, Result, ServiceKind};

/// A UPnP action with typed request and response
pub trait UPnPOperation {
    type Request;
    type Response;

    /// The service this action belongs to
    const SERVICE: ServiceKind;

    /// The SOAP action name
    const ACTION: &'static str;

    /// Validate the request and turn it into ordered `(name, value)` arguments
    fn build_arguments(request: &Self::Request) -> Result<Vec<(&'static str, String)>>;

    /// Read the action's output arguments
    fn parse_response(response: &ActionResponse) -> Result<Self::Response>;
}

/// Request-level validation run before anything is sent
pub trait Validate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A required output argument
pub(crate) fn required(response: &ActionResponse, name: &str) -> Result<String> {
    response
        .get(name)
        .ok_or_else(|| ApiError::ParseError(format!("Missing {} in response", name)))
}

/// An optional output argument, empty when absent
pub(crate) fn optional(response: &ActionResponse, name: &str) -> String {
    response.get(name).unwrap_or_default()
}
