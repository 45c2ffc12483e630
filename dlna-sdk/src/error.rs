use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] dlna_discovery::DiscoveryError),

    #[error("Control error: {0}")]
    Api(#[from] dlna_api::ApiError),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported by this backend: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
