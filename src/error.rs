//! Error types for startup and persistence faults.
//!
//! Per-tick simulation never fails; boundary conditions clamp or no-op.

use thiserror::Error;

/// Configuration fault, surfaced once when a run is constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::GameConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tunable is outside its allowed range.
    #[error("Invalid config value '{field}': {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Persistence fault from a [`crate::KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error on '{path}': {source}")]
    Io {
        /// Path of the backing file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Backing file content is not a JSON object of integers.
    #[error("Store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
