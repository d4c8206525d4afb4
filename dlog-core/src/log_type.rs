//! Per-log-type framing parameters.
//!
//! Every generation may start with `#` comment lines. A line beginning with
//! `#!#` carries log-type metadata: an ASCII payload of whitespace-separated
//! decimal fields `<version> <date_width> <hostname_width>`. The widths fix
//! the layout of the timestamp and host fields for every record that
//! follows, so they must be applied before any record of that generation is
//! decoded.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default field delimiter written by the logger (ASCII unit separator).
pub const DEFAULT_SEP: u8 = 0x1f;

/// Default width of the hex timestamp field.
pub const DEFAULT_DATE_WIDTH: usize = 10;

/// Default width of the blank-padded host field.
pub const DEFAULT_HOSTNAME_WIDTH: usize = 8;

/// Framing parameters for one delivery-log type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogType {
    /// Single-byte field delimiter.
    pub sep: u8,
    /// Fixed width of the hex timestamp field.
    pub date_width: usize,
    /// Fixed width of the host-name field.
    pub hostname_width: usize,
    /// Log-type version as announced by the `#!#` header, if any.
    pub version: u32,
}

impl Default for LogType {
    fn default() -> Self {
        Self {
            sep: DEFAULT_SEP,
            date_width: DEFAULT_DATE_WIDTH,
            hostname_width: DEFAULT_HOSTNAME_WIDTH,
            version: 0,
        }
    }
}

impl LogType {
    pub fn new(sep: u8, date_width: usize, hostname_width: usize) -> Self {
        Self {
            sep,
            date_width,
            hostname_width,
            version: 0,
        }
    }

    /// Byte offset of the delimiter that follows the host field.
    pub fn frame_base(&self) -> usize {
        self.date_width + 1 + self.hostname_width
    }

    /// Shortest byte count a record line can have. Used to step over a
    /// record cheaply before scanning for its terminating newline.
    pub fn min_record_len(&self) -> usize {
        self.date_width + self.hostname_width + 3
    }

    /// Apply a `#!#` header payload.
    ///
    /// The payload is `<version> <date_width> <hostname_width>`; trailing
    /// fields may be absent. Malformed payloads are logged and ignored, the
    /// previous parameters stay in effect.
    pub fn note_log_type(&mut self, payload: &[u8]) {
        let Ok(text) = std::str::from_utf8(payload) else {
            warn!("ignoring non-ASCII log-type header");
            return;
        };

        let mut fields = text.split_ascii_whitespace();

        if let Some(version) = fields.next() {
            match version.parse::<u32>() {
                Ok(version) => self.version = version,
                Err(_) => {
                    warn!("ignoring malformed log-type header {:?}", text);
                    return;
                }
            }
        }

        if let Some(width) = fields.next() {
            match width.parse::<usize>() {
                Ok(width) if width > 0 => self.date_width = width,
                _ => warn!("ignoring bad date width in log-type header {:?}", text),
            }
        }

        if let Some(width) = fields.next() {
            match width.parse::<usize>() {
                Ok(width) if width > 0 => self.hostname_width = width,
                _ => warn!("ignoring bad host width in log-type header {:?}", text),
            }
        }
    }

    /// Consume the leading comment lines of a generation, applying any
    /// `#!#` headers found there.
    ///
    /// Record decoding needs the field widths before the first record is
    /// read, so callers prime the log type from the header block before
    /// searching or scanning the buffer.
    pub fn prime_from_header(&mut self, buf: &[u8]) {
        let mut pos = 0;

        while pos < buf.len() && buf[pos] == b'#' {
            let end = match buf[pos..].iter().position(|&b| b == b'\n') {
                Some(nl) => pos + nl,
                None => buf.len(),
            };

            if buf[pos..end].starts_with(b"#!#") {
                self.note_log_type(&buf[pos + 3..end]);
            }

            pos = end + 1;
        }
    }
}
