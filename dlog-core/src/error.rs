//! Error types for delivery-log core operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while accessing delivery-log data
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error when opening or reading a log generation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when opening or mapping a specific log file
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A specialized Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
