//! File-size field with its overflow sentinel.

use serde::{Deserialize, Serialize};

/// Number of hex digits above which a size field is taken as infinite.
///
/// Fifteen hex digits hold values below 2^60; anything wider may not fit the
/// numeric types of every platform that ever wrote the log, so it is carried
/// as a sentinel instead of a (possibly truncated) number.
const MAX_SIZE_DIGITS: usize = 15;

/// Size of a delivered file as recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSize {
    Bytes(u64),
    Infinity,
}

impl FileSize {
    /// Parse a hex size field. Fields wider than [`MAX_SIZE_DIGITS`] become
    /// [`FileSize::Infinity`]; malformed fields are `None`.
    pub fn parse_hex(field: &[u8]) -> Option<FileSize> {
        if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }

        if field.len() > MAX_SIZE_DIGITS {
            return Some(FileSize::Infinity);
        }

        let text = std::str::from_utf8(field).ok()?;
        u64::from_str_radix(text, 16).ok().map(FileSize::Bytes)
    }

    /// The size as a double, with the sentinel mapping to `f64::INFINITY`.
    ///
    /// All size comparators operate on this representation, so an infinite
    /// size compares greater than every finite search value and equal to
    /// itself.
    pub fn as_f64(&self) -> f64 {
        match self {
            FileSize::Bytes(bytes) => *bytes as f64,
            FileSize::Infinity => f64::INFINITY,
        }
    }
}

impl std::fmt::Display for FileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileSize::Bytes(bytes) => write!(f, "{}", bytes),
            FileSize::Infinity => write!(f, "INF"),
        }
    }
}
