//! Command-line interface for the cache daemon
//!
//! Parses CLI arguments with clap and derives the runtime options: provider
//! connection settings (optionally seeded from a JSON config file, with flags
//! overriding individual fields) and the refresh intervals.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{ConfigError, ProviderConfig};
use crate::refresh::RefreshConfig;

/// Ad data cache daemon - keeps lookup caches fresh from the remote provider
#[derive(Parser, Debug)]
#[command(name = "adcached")]
#[command(about = "Keeps ad-serving lookup caches fresh from the remote data provider")]
#[command(version)]
pub struct Cli {
    /// Hostname of the remote data provider
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// TCP port of the remote data provider
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Connect to the provider over HTTPS
    #[arg(long)]
    pub secure: bool,

    /// Path to a JSON config file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between ad data refresh cycles (banner and video)
    #[arg(long, value_name = "SECONDS")]
    pub ad_interval: Option<u64>,

    /// Seconds between supplier refresh cycles
    #[arg(long, value_name = "SECONDS")]
    pub supplier_interval: Option<u64>,

    /// Seconds between currency rate refresh cycles
    #[arg(long, value_name = "SECONDS")]
    pub currency_interval: Option<u64>,

    /// Run one refresh cycle for every data kind, then exit
    #[arg(long)]
    pub once: bool,
}

/// Runtime options derived from CLI arguments and the optional config file
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Provider connection settings
    pub provider: ProviderConfig,
    /// Scheduler intervals
    pub refresh: RefreshConfig,
    /// Run one cycle per data kind and exit instead of scheduling
    pub once: bool,
}

impl DaemonOptions {
    /// Builds runtime options from parsed CLI arguments
    ///
    /// Values from the config file come first; individual flags override
    /// single fields on top of it.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(DaemonOptions)` with the effective settings
    /// * `Err(ConfigError)` if the config file cannot be read or parsed
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut provider = match &cli.config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };

        if let Some(host) = &cli.host {
            provider.host = host.clone();
        }
        if let Some(port) = cli.port {
            provider.port = port;
        }
        if cli.secure {
            provider.secure = true;
        }

        let mut refresh = RefreshConfig::default();
        if let Some(secs) = cli.ad_interval {
            refresh.banner_interval = positive_interval(secs)?;
            refresh.video_interval = refresh.banner_interval;
        }
        if let Some(secs) = cli.supplier_interval {
            refresh.supplier_interval = positive_interval(secs)?;
        }
        if let Some(secs) = cli.currency_interval {
            refresh.currency_interval = positive_interval(secs)?;
        }

        Ok(Self {
            provider,
            refresh,
            once: cli.once,
        })
    }
}

/// Converts an interval flag to a duration, rejecting zero
fn positive_interval(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(Duration::from_secs(secs))
}
