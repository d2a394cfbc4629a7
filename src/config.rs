//! Link configuration loaded from YAML.
//!
//! ```yaml
//! nodes:
//!   flight: 31
//!   ground: 30
//! test_pattern: aXXYYZZgXXYYZZttPPaaVV
//! tx_interval_ms: 1000
//! ground_endpoint: 127.0.0.1:40868
//! flight_port: 1963
//! receive_timeout_ms: 5000
//! retry:
//!   max_attempts: 5
//!   initial_backoff_ms: 50
//!   max_backoff_ms: 1600
//! ```
//!
//! Every key is optional; missing keys take the defaults shown.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::link::DEFAULT_TEST_PATTERN;
use crate::types::NodePair;
use crate::{Result, TelemetryError};

/// Bounded exponential retry for transport sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per operation, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, initial_backoff_ms: 50, max_backoff_ms: 1600 }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): 50ms, 100ms, 200ms, ... capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        let millis = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

/// Settings shared by the flight and ground ends of the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub nodes: NodePair,
    pub test_pattern: String,
    pub tx_interval_ms: u64,
    pub ground_endpoint: SocketAddr,
    pub flight_port: u16,
    pub receive_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            nodes: NodePair::default(),
            test_pattern: DEFAULT_TEST_PATTERN.to_string(),
            tx_interval_ms: 1000,
            ground_endpoint: SocketAddr::from(([127, 0, 0, 1], 40868)),
            flight_port: 1963,
            receive_timeout_ms: 5000,
            retry: RetryPolicy::default(),
        }
    }
}

impl LinkConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::config_error(path, format!("cannot read file: {}", e)))?;
        let config = Self::parse(&text).map_err(|e| match e {
            TelemetryError::Config { details, .. } => TelemetryError::config_error(path, details),
            other => other,
        })?;
        info!("Loaded link configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration YAML.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TelemetryError::config_error(PathBuf::from("<inline>"), e.to_string()))?;
        config.validate()?;
        debug!("Link configuration: {:?}", config);
        Ok(config)
    }

    /// Check values that would make the link unusable.
    pub fn validate(&self) -> Result<()> {
        let fail = |details: &str| Err(TelemetryError::config_error("<config>", details));
        if self.nodes.flight == self.nodes.ground {
            return fail("flight and ground node ids must differ");
        }
        if self.test_pattern.is_empty() {
            return fail("test_pattern must not be empty");
        }
        if self.tx_interval_ms == 0 {
            return fail("tx_interval_ms must be positive");
        }
        if self.receive_timeout_ms == 0 {
            return fail("receive_timeout_ms must be positive");
        }
        if self.retry.max_attempts == 0 {
            return fail("retry.max_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn tx_interval(&self) -> Duration {
        Duration::from_millis(self.tx_interval_ms)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}
