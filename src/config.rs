//! Provider connection configuration
//!
//! Holds everything needed to reach the remote data provider: host, port,
//! transport security, the base lookup path and optional credentials. Settings
//! can be loaded from a JSON file and overridden by command-line flags; the
//! refresh pipeline itself never reads configuration from anywhere else.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::EndpointDescriptor;

/// Default path below the authority where the provider's lookup tree lives
pub const DEFAULT_LOOKUP_PATH: &str = "ssp-data-provider/lookup";

/// Default provider port
pub const DEFAULT_PORT: u16 = 8080;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[from] std::io::Error),

    /// Config file is not valid JSON
    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[from] serde_json::Error),

    /// No provider host is configured
    #[error("No provider host configured")]
    EmptyHost,

    /// A refresh interval is configured as zero
    #[error("Refresh interval must be greater than zero")]
    ZeroInterval,
}

/// Basic-auth credentials for the data provider
///
/// The `Debug` form masks the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name presented to the provider
    pub username: String,
    /// Account password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the remote data provider
///
/// All fields have defaults so a config file only needs to name the values it
/// changes. The host has no usable default; `base_endpoint` rejects an empty
/// host before any network activity happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Hostname of the data provider, without scheme or port
    pub host: String,
    /// TCP port of the data provider
    pub port: u16,
    /// Whether to connect over HTTPS
    pub secure: bool,
    /// Path below the authority where the lookup tree lives
    pub lookup_path: String,
    /// Optional basic-auth credentials
    pub credentials: Option<Credentials>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            secure: false,
            lookup_path: DEFAULT_LOOKUP_PATH.to_string(),
            credentials: None,
        }
    }
}

impl ProviderConfig {
    /// Loads configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the JSON config file
    ///
    /// # Returns
    /// * `Ok(ProviderConfig)` with file values over defaults
    /// * `Err(ConfigError)` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Scheme, host and port combined, e.g. `https://data.example.com:8443`
    pub fn authority(&self) -> Result<String, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        let scheme = if self.secure { "https" } else { "http" };
        Ok(format!("{}://{}:{}", scheme, self.host, self.port))
    }

    /// Base endpoint descriptor that every data kind extends with its own segments
    ///
    /// Rebuilt at the start of each refresh cycle, so configuration changes
    /// apply from the next cycle onward.
    pub fn base_endpoint(&self) -> Result<EndpointDescriptor, ConfigError> {
        let authority = self.authority()?;
        Ok(EndpointDescriptor::new(authority).with_segment(self.lookup_path.as_str()))
    }
}
