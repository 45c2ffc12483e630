//! Engine configuration

use std::time::Duration;

use dlna_discovery::DiscoveryConfig;

use crate::{Result, SdkError};

/// Scan window in milliseconds
pub const ENV_SCAN_WINDOW_MS: &str = "DLNA_SCAN_WINDOW_MS";
/// Per-receive timeout in milliseconds
pub const ENV_RECEIVE_TIMEOUT_MS: &str = "DLNA_RECEIVE_TIMEOUT_MS";
/// M-SEARCH MX value in seconds
pub const ENV_MX: &str = "DLNA_MX";
/// Bound for description fetches and SOAP calls in milliseconds
pub const ENV_HTTP_TIMEOUT_MS: &str = "DLNA_HTTP_TIMEOUT_MS";

/// Configuration for a [`RendererSystem`](crate::RendererSystem)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scan and description-fetch settings
    pub discovery: DiscoveryConfig,

    /// Connect and read bound for each SOAP call
    /// Default: 10 seconds
    pub control_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            control_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `DLNA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// A variable that is set but does not parse is an error rather than
    /// being silently ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_SCAN_WINDOW_MS)? {
            config.discovery = config.discovery.with_scan_window(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_RECEIVE_TIMEOUT_MS)? {
            config.discovery.receive_timeout = Duration::from_millis(ms);
        }
        if let Some(mx) = parse_var::<u8, _>(&lookup, ENV_MX)? {
            config.discovery.mx = mx;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_HTTP_TIMEOUT_MS)? {
            let timeout = Duration::from_millis(ms);
            config.discovery.description_timeout = timeout;
            config.control_timeout = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        self.discovery
            .validate()
            .map_err(|e| SdkError::Configuration(e.to_string()))?;

        if self.control_timeout.is_zero() {
            return Err(SdkError::Configuration(
                "Control timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            SdkError::Configuration(format!("{} has an invalid value: '{}'", key, raw))
        }),
    }
}
