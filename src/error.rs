//! Error types for the D2D mode-selection simulator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the simulator.
///
/// The engine itself has no environmental failure modes; every variant here
/// is either misuse (bad configuration, stepping before reset) or I/O at the
/// dataset boundary.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Engine state errors
    #[error("environment stepped before reset()")]
    NotReset,

    // Dataset errors
    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for building an [`Error::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig(reason.into())
    }
}
