//! Configuration for discovery scans and description fetches

use std::time::Duration;

use crate::error::{DiscoveryError, Result};

/// Configuration for a [`DiscoverySession`](crate::DiscoverySession) and its resolver
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Total length of one scan
    /// Default: 5 seconds
    pub scan_window: Duration,

    /// Upper bound of a single blocking receive; also bounds how long `stop()` waits
    /// Default: 1 second
    pub receive_timeout: Duration,

    /// MX header of the M-SEARCH request, in seconds
    /// Default: 3
    pub mx: u8,

    /// ST header of the M-SEARCH request
    /// Default: "ssdp:all"
    pub search_target: String,

    /// Request timeout for fetching a device description document
    /// Default: 10 seconds
    pub description_timeout: Duration,

    /// Entries not seen for this long are dropped by a staleness sweep
    /// Default: 10 seconds (twice the scan window)
    pub stale_after: Duration,

    /// Size of the datagram receive buffer
    /// Default: 8192
    pub recv_buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scan_window: Duration::from_secs(5),
            receive_timeout: Duration::from_secs(1),
            mx: 3,
            search_target: crate::ssdp::SEARCH_ALL.to_string(),
            description_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(10),
            recv_buffer_size: 8192,
        }
    }
}

impl DiscoveryConfig {
    /// Create a DiscoveryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// A short scan for interactive pickers
    pub fn quick() -> Self {
        Self {
            scan_window: Duration::from_secs(2),
            receive_timeout: Duration::from_millis(250),
            mx: 1,
            stale_after: Duration::from_secs(4),
            ..Default::default()
        }
    }

    /// Set the scan window, keeping the staleness threshold at twice its length
    pub fn with_scan_window(mut self, scan_window: Duration) -> Self {
        self.scan_window = scan_window;
        self.stale_after = scan_window * 2;
        self
    }

    /// Set the per-receive timeout
    pub fn with_receive_timeout(mut self, receive_timeout: Duration) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.scan_window.is_zero() {
            return Err(DiscoveryError::Configuration(
                "Scan window must be greater than 0".to_string(),
            ));
        }

        if self.receive_timeout.is_zero() {
            return Err(DiscoveryError::Configuration(
                "Receive timeout must be greater than 0".to_string(),
            ));
        }

        if self.receive_timeout > self.scan_window {
            return Err(DiscoveryError::Configuration(
                "Receive timeout must not exceed the scan window".to_string(),
            ));
        }

        if self.stale_after < self.scan_window {
            return Err(DiscoveryError::Configuration(
                "Staleness threshold must not be shorter than the scan window".to_string(),
            ));
        }

        if self.mx == 0 || self.mx > 5 {
            return Err(DiscoveryError::Configuration(format!(
                "MX must be between 1 and 5 seconds, got {}",
                self.mx
            )));
        }

        if self.recv_buffer_size == 0 {
            return Err(DiscoveryError::Configuration(
                "Receive buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan_window, Duration::from_secs(5));
        assert_eq!(config.receive_timeout, Duration::from_secs(1));
        assert_eq!(config.mx, 3);
        assert_eq!(config.search_target, "ssdp:all");
        assert_eq!(config.stale_after, config.scan_window * 2);
    }

    #[test]
    fn test_quick_config_is_valid() {
        assert!(DiscoveryConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_with_scan_window_tracks_staleness() {
        let config = DiscoveryConfig::new().with_scan_window(Duration::from_secs(8));
        assert_eq!(config.stale_after, Duration::from_secs(16));
    }

    #[test]
    fn test_invalid_configs() {
        let zero_window = DiscoveryConfig {
            scan_window: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_window.validate().is_err());

        let long_receive = DiscoveryConfig::new().with_receive_timeout(Duration::from_secs(30));
        assert!(long_receive.validate().is_err());

        let bad_mx = DiscoveryConfig {
            mx: 0,
            ..Default::default()
        };
        assert!(matches!(bad_mx.validate(), Err(DiscoveryError::Configuration(_))));

        let eager_sweep = DiscoveryConfig {
            stale_after: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(eager_sweep.validate().is_err());

        let no_buffer = DiscoveryConfig {
            recv_buffer_size: 0,
            ..Default::default()
        };
        assert!(no_buffer.validate().is_err());
    }
}
