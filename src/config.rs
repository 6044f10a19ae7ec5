//! Runtime settings for the allocation system.
//!
//! Values are layered: built-in defaults, then an optional `allocation.toml` in the
//! working directory, then `STOCK_`-prefixed environment variables
//! (e.g. `STOCK_EXPIRY_WINDOW_SECS=300`).

use crate::model::{ExpiryWindow, DEFAULT_EXPIRY_WINDOW_SECS};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_FILE: &str = "allocation.toml";
const ENV_PREFIX: &str = "STOCK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// How long a claim counts against capacity.
    #[serde(default = "default_expiry_window_secs")]
    pub expiry_window_secs: i64,
    /// Request channel capacity of the store actor.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Extra attempts `reserve_with_retry` makes after a timeout.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Background sweep period. `None` leaves the compactor off.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

fn default_expiry_window_secs() -> i64 {
    DEFAULT_EXPIRY_WINDOW_SECS
}

fn default_channel_buffer() -> usize {
    32
}

fn default_request_timeout_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            expiry_window_secs: default_expiry_window_secs(),
            channel_buffer: default_channel_buffer(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            sweep_interval_secs: None,
        }
    }
}

impl AllocationConfig {
    /// Loads `allocation.toml` (if present) and `STOCK_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_FILE)
    }

    /// Same as [`load`](Self::load) with an explicit file name.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.expiry_window()?;
        if self.channel_buffer == 0 {
            return Err(ConfigError::Message(
                "channel_buffer must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.sweep_interval_secs == Some(0) {
            return Err(ConfigError::Message(
                "sweep_interval_secs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured window, or an error if it is not positive or out of range.
    pub fn expiry_window(&self) -> Result<ExpiryWindow, ConfigError> {
        if self.expiry_window_secs <= 0 {
            return Err(ConfigError::Message(
                "expiry_window_secs must be positive".to_string(),
            ));
        }
        ExpiryWindow::try_from_secs(self.expiry_window_secs).ok_or_else(|| {
            ConfigError::Message(format!(
                "expiry_window_secs out of range: {}",
                self.expiry_window_secs
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs.map(Duration::from_secs)
    }
}
