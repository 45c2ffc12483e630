//! Error types for the discovery system.

use thiserror::Error;

/// Error type for discovery operations.
///
/// Transport failures are fatal to the operation that triggered them.
/// Description failures are per device: the device stays in the registry
/// unresolved until a later resolve succeeds.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Multicast socket could not be created, bound, joined or written
    #[error("Transport error: {0}")]
    Transport(String),

    /// Description document could not be fetched (network failure or non-success status)
    #[error("Failed to fetch device description from {url}: {reason}")]
    DescriptionFetch { url: String, reason: String },

    /// Description document was fetched but is not a usable UPnP device description
    #[error("Failed to parse device description: {0}")]
    DescriptionParse(String),

    /// An SSDP datagram that could not be decoded
    #[error("Malformed SSDP message: {0}")]
    MalformedMessage(String),

    /// `start()` was called while a scan is already running
    #[error("A discovery scan is already running")]
    AlreadyScanning,

    /// No registry entry with this id
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
