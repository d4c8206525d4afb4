//! Types shared by every dlog crate.
//!
//! Delivery-log records, generation mtimes and the query window all speak
//! in whole seconds since the epoch, so the [`Seconds`] newtype lives here,
//! below the registry/core/engine crates that exchange it.

mod seconds;

pub use seconds::Seconds;
