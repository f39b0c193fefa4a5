//! Error types for the indexed map
//!
//! Error codes:
//! - BKMAP_CONFIG_INVALID
//! - BKMAP_CONFIG_PARSE_FAILED
//! - BKMAP_WORKER_SPAWN_FAILED
//!
//! Lookups and removals of absent keys are not errors.

use thiserror::Error;

/// Result type for map construction and configuration
pub type MapResult<T> = Result<T, MapError>;

/// Indexed map errors
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid index configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse index configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to spawn index worker '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl MapError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MapError::InvalidConfig(_) => "BKMAP_CONFIG_INVALID",
            MapError::ConfigParse(_) => "BKMAP_CONFIG_PARSE_FAILED",
            MapError::WorkerSpawn { .. } => "BKMAP_WORKER_SPAWN_FAILED",
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        MapError::InvalidConfig(reason.into())
    }
}
