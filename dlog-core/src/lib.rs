//! Core functionality for reading AFD delivery-log files.
//!
//! This crate provides:
//! - The record grammar for delivery-log lines: [`record`] module
//! - Time-indexed lookup over a log region: [`time_index`] module
//! - Archive-status interpretation: [`archive`] module
//! - Read-only access to one log generation: [`buffer`] module
//!
//! Discovery of rotated generations lives in the `dlog-registry` crate;
//! query planning and scanning live in `dlog-engine`.

// Core error types used throughout the crate
pub mod error;

// Per-log-type framing parameters and `#!#` header notes
pub mod log_type;

// Delivery protocol codes
pub mod protocol;

// File-size field with its overflow sentinel
pub mod size;

// Delivery-log record grammar
pub mod record;

// Archive-status interpretation
pub mod archive;

// Binary search for a time bound inside a log region
pub mod time_index;

// Memory-mapped (or heap-read) log generation
pub mod buffer;

// Re-export commonly used types for convenience
pub use buffer::LogBuffer;
pub use error::{CoreError, Result};
pub use log_type::LogType;
pub use protocol::{Protocol, ProtocolMask};
pub use record::{Decoded, DeliveryRecord, Outcome};
pub use size::FileSize;
pub use time_index::TimeBound;
