use dlna_discovery::ServiceKind;
use soap_client::SoapError;
use thiserror::Error;

/// Errors from controlling a renderer
///
/// Nothing here is retried automatically. UPnP actions are not guaranteed to
/// be idempotent, so the caller decides whether to re-issue a command.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The device could not be reached or the connection failed mid-request
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The device answered, but not with something we could read
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The device rejected the action
    ///
    /// `code` is the UPnP error code when the device sent one (e.g. 701
    /// "Transition not available"), otherwise the HTTP status.
    #[error("Action fault {code}: {description}")]
    ActionFault { code: u16, description: String },

    /// The device's description does not advertise the service the action needs
    #[error("Device {device_id} has no {service} service")]
    CapabilityMissing {
        device_id: String,
        service: ServiceKind,
    },

    /// The device's description has not been fetched yet
    #[error("Device {0} has not been resolved")]
    DeviceNotResolved(String),

    /// A request value is outside what the action accepts
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// Whether the device itself refused the request
    pub fn is_fault(&self) -> bool {
        matches!(self, ApiError::ActionFault { .. })
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault { code, description } => ApiError::ActionFault { code, description },
        }
    }
}
