//! Reconciliation configuration
//!
//! Defaults match the remote IVR API limits. Loaded from TOML, every field
//! optional:
//!
//! ```toml
//! max_dnis_per_request = 50
//! inter_chunk_delay_ms = 2000
//!
//! [validation]
//! max_attempts = 3
//! retry_delay_ms = 3000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for this schema
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are out of range
    #[error("validation error: {0}")]
    Validation(String),
}

/// Reconciliation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Most numbers the remote accepts in one write
    pub max_dnis_per_request: usize,
    /// Pause before every chunk write after the first
    pub inter_chunk_delay_ms: u64,
    /// Number availability check policy
    pub validation: ValidationConfig,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max numbers per request
    #[inline]
    #[must_use]
    pub fn with_max_dnis_per_request(mut self, max: usize) -> Self {
        self.max_dnis_per_request = max;
        self
    }

    /// With inter-chunk delay
    #[inline]
    #[must_use]
    pub fn with_inter_chunk_delay(mut self, delay: Duration) -> Self {
        self.inter_chunk_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With availability check policy
    #[inline]
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Pause before every chunk write after the first
    #[inline]
    #[must_use]
    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_delay_ms)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Validation` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dnis_per_request == 0 {
            return Err(ConfigError::Validation(
                "max_dnis_per_request must be positive".to_string(),
            ));
        }
        if self.validation.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "validation.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Parse or validation failure
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// IO, parse or validation failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded sync config");
        Ok(config)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_dnis_per_request: 50,
            inter_chunk_delay_ms: 2_000,
            validation: ValidationConfig::default(),
        }
    }
}

/// Retry policy for number availability lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lookups per number before giving up
    pub max_attempts: u32,
    /// Pause between lookups of the same number
    pub retry_delay_ms: u64,
}

impl ValidationConfig {
    /// Pause between lookups of the same number
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 3_000,
        }
    }
}
