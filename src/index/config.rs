//! Index configuration
//!
//! Defaults match the classic layout: one level-2 sample every 256 keys.
//! Disabling indexing never changes a lookup result, only its speed.

use serde::{Deserialize, Serialize};

use super::errors::{MapError, MapResult};

/// Default level-2 sampling interval.
pub const DEFAULT_SAMPLE_STEP: usize = 256;

/// Configuration for the background index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Whether the background indexer runs at all.
    pub enabled: bool,
    /// Level-1 keys per level-2 sample.
    pub sample_step: usize,
    /// Entries the builder processes before re-reading the state.
    /// `1` re-checks after every entry.
    pub build_chunk: usize,
    /// Spins before a waiter parks on the condition variable.
    pub spin_limit: u32,
    /// Name of the background thread.
    pub worker_name: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_step: DEFAULT_SAMPLE_STEP,
            build_chunk: 64,
            spin_limit: 64,
            worker_name: "bkmap-indexer".to_string(),
        }
    }
}

impl IndexConfig {
    /// Config with the background indexer switched off (direct search only).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> MapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_sample_step(mut self, step: usize) -> Self {
        self.sample_step = step;
        self
    }

    pub fn with_build_chunk(mut self, chunk: usize) -> Self {
        self.build_chunk = chunk;
        self
    }

    pub fn with_spin_limit(mut self, spins: u32) -> Self {
        self.spin_limit = spins;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Reject configurations the builder cannot run with.
    pub fn validate(&self) -> MapResult<()> {
        if self.sample_step == 0 {
            return Err(MapError::invalid_config("sample_step must be at least 1"));
        }
        if self.build_chunk == 0 {
            return Err(MapError::invalid_config("build_chunk must be at least 1"));
        }
        if self.worker_name.trim().is_empty() {
            return Err(MapError::invalid_config("worker_name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert!(config.enabled);
        assert_eq!(config.sample_step, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let err = IndexConfig::default().with_sample_step(0).validate().unwrap_err();
        assert_eq!(err.code(), "BKMAP_CONFIG_INVALID");
    }

    #[test]
    fn test_validate_rejects_zero_chunk_and_blank_name() {
        assert!(IndexConfig::default().with_build_chunk(0).validate().is_err());
        assert!(IndexConfig::default().with_worker_name("  ").validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = IndexConfig::from_json(r#"{"sample_step": 16}"#).unwrap();
        assert_eq!(config.sample_step, 16);
        assert_eq!(config.build_chunk, 64);
        assert_eq!(config.worker_name, "bkmap-indexer");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = IndexConfig::from_json(r#"{"sample_step": 0}"#).unwrap_err();
        assert_eq!(err.code(), "BKMAP_CONFIG_INVALID");

        let err = IndexConfig::from_json("not json").unwrap_err();
        assert_eq!(err.code(), "BKMAP_CONFIG_PARSE_FAILED");
    }

    #[test]
    fn test_disabled() {
        let config = IndexConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.sample_step, DEFAULT_SAMPLE_STEP);
    }
}
