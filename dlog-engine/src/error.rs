//! Error types for query execution

use thiserror::Error;

/// Errors that can occur while running a delivery-log query
#[derive(Debug, Error)]
pub enum EngineError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the core record layer
    #[error(transparent)]
    Core(#[from] dlog_core::CoreError),

    /// Error from generation discovery
    #[error(transparent)]
    Registry(#[from] dlog_registry::RegistryError),

    /// A search pattern failed to compile
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    /// A numeric filter expression could not be parsed
    #[error("invalid filter expression {0:?}")]
    FilterExpression(String),

    /// Growing the line index ran out of memory
    #[error("allocation of line index storage failed")]
    Allocation,
}

/// A specialized Result type for query operations
pub type Result<T> = std::result::Result<T, EngineError>;
