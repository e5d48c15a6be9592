use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving a weekly duration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize durations: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the store exists but could not be parsed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Error type for startup and shutdown failures of the tracker process
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Could not create data directory: {0}")]
    DataDirCreation(std::io::Error),

    #[error("Failed to install shutdown handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    #[error("Tracker thread panicked")]
    TrackerPanicked,
}
