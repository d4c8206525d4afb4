//! Rotated delivery-log generation discovery.
//!
//! A delivery log is kept as a fixed ring of rotated files named
//! `<base><n>` inside the log directory: generation 0 is the file currently
//! written, higher numbers are older. This crate stats the ring, pairs each
//! present generation with its file metadata, and selects the span of
//! generations a time window can touch.
//!
//! ## Usage
//!
//! ```no_run
//! use dlog_registry::GenerationSet;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let set = GenerationSet::discover(Path::new("/var/log/afd"), "output.log", 10)?;
//!
//! // Generations that may hold records between the two times
//! if let Some((start_gen, end_gen)) = set.select_span(Some(1_000_000), Some(2_000_000), 3600) {
//!     for generation in set.span_oldest_first(start_gen, end_gen) {
//!         println!("{}", generation.path.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generation;

pub use error::{RegistryError, Result};
pub use generation::{Generation, GenerationSet};
