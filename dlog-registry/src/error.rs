//! Error types for generation discovery

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering log generations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Stat of a generation failed for a reason other than absence
    #[error("cannot access log generation {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
