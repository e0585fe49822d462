//! Driver configuration and validation
//!
//! # Example
//!
//! ```
//! use sg_driver::domain::{DriverConfigBuilder, SeekPolicy};
//!
//! let config = DriverConfigBuilder::new()
//!     .cache_capacity(64)
//!     .seek_policy(SeekPolicy::Strict)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.cache_capacity, 64);
//! ```

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Largest cache the driver accepts, in blocks.
pub const MAX_CACHE_CAPACITY: usize = 4096;

/// How `seek` treats its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekPolicy {
    /// Always report the requested offset; move only while the current
    /// cursor does not exceed the file size.
    #[default]
    Permissive,
    /// Reject offsets past the file size.
    Strict,
}

impl SeekPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "permissive" => Some(SeekPolicy::Permissive),
            "strict" => Some(SeekPolicy::Strict),
            _ => None,
        }
    }
}

/// Scatter/Gather driver configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Maximum blocks held in the client cache
    pub cache_capacity: usize,
    /// Bounds handling for `seek`
    pub seek_policy: SeekPolicy,
    /// Treat a response whose operation differs from the request as a
    /// remote error
    pub verify_response_operation: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 32,
            seek_policy: SeekPolicy::Permissive,
            verify_response_operation: true,
        }
    }
}

impl DriverConfig {
    /// Validate configuration bounds
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.cache_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "cache_capacity cannot be 0".to_string(),
            ));
        }
        if self.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(DriverError::InvalidConfig(format!(
                "cache_capacity {} exceeds maximum {}",
                self.cache_capacity, MAX_CACHE_CAPACITY
            )));
        }
        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// - `SG_CACHE_CAPACITY`: cache size in blocks (default: 32)
    /// - `SG_SEEK_POLICY`: `permissive` or `strict` (default: permissive)
    ///
    /// Unparseable values are logged and fall back to the default.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_value(&lookup, "SG_CACHE_CAPACITY", |v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            seek_policy: env_value(&lookup, "SG_SEEK_POLICY", SeekPolicy::parse)
                .unwrap_or(defaults.seek_policy),
            verify_response_operation: defaults.verify_response_operation,
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, DriverError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DriverError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Read and parse `key`, warning when it is set but unparseable.
fn env_value<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(key, value = %raw, "[sg] Ignoring unparseable setting, using default");
    }
    parsed
}

/// Builder for DriverConfig with validation
#[derive(Default)]
pub struct DriverConfigBuilder {
    cache_capacity: Option<usize>,
    seek_policy: Option<SeekPolicy>,
    verify_response_operation: Option<bool>,
}

impl DriverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn seek_policy(mut self, policy: SeekPolicy) -> Self {
        self.seek_policy = Some(policy);
        self
    }

    pub fn verify_response_operation(mut self, verify: bool) -> Self {
        self.verify_response_operation = Some(verify);
        self
    }

    /// Build the DriverConfig, validating all parameters
    pub fn build(self) -> Result<DriverConfig, DriverError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation (for internal use only)
    pub fn build_unchecked(self) -> DriverConfig {
        let defaults = DriverConfig::default();
        DriverConfig {
            cache_capacity: self.cache_capacity.unwrap_or(defaults.cache_capacity),
            seek_policy: self.seek_policy.unwrap_or(defaults.seek_policy),
            verify_response_operation: self
                .verify_response_operation
                .unwrap_or(defaults.verify_response_operation),
        }
    }
}
