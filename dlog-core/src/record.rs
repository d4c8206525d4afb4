//! Delivery-log record grammar.
//!
//! One record is one text line. After the fixed-width timestamp and host
//! fields, three historical framings of the type code coexist and are told
//! apart by probing two bytes. With `B` the offset of the delimiter that
//! follows the host field:
//!
//! ```text
//! V0   SEP <type> ' ' <toggle> SEP <names…>          probe B+2 is not SEP
//! V1   SEP <toggle> SEP <type> SEP <names…>          probes B+2 and B+4 are SEP
//! V2   SEP <outcome> SEP <toggle> <split> <type> SEP <names…>
//!                                                    probe B+2 is SEP, B+4 is not
//! ```
//!
//! The name section is `local SEP [remote] SEP size SEP duration SEP
//! [retries SEP] job_id SEP [archive]`. The retries field exists for V1 and
//! V2 records only; V2 additionally carries the outcome digit that marks
//! received records and the four confirmation kinds.
//!
//! Decoding never panics on malformed input: every reader is bounds-checked
//! and a line that does not conform is reported as a reject whose length
//! lets the caller skip past the newline and continue.

use crate::log_type::LogType;
use crate::protocol::Protocol;
use crate::size::FileSize;

/// What a delivery record describes, from the V2 outcome digit.
///
/// V0 and V1 records predate the digit and are always delivered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    NormalDelivered,
    NormalReceived,
    ConfOfDispatch,
    ConfOfReceipt,
    ConfOfRetrieve,
    ConfTimeup,
}

impl Outcome {
    /// Decode the outcome digit (`'0'` + value).
    pub fn from_digit(digit: u8) -> Option<Outcome> {
        Some(match digit {
            b'0' => Outcome::NormalDelivered,
            b'1' => Outcome::NormalReceived,
            b'2' => Outcome::ConfOfDispatch,
            b'3' => Outcome::ConfOfReceipt,
            b'4' => Outcome::ConfOfRetrieve,
            b'5' => Outcome::ConfTimeup,
            _ => return None,
        })
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Outcome::ConfOfDispatch
                | Outcome::ConfOfReceipt
                | Outcome::ConfOfRetrieve
                | Outcome::ConfTimeup
        )
    }

    pub fn is_received(&self) -> bool {
        matches!(self, Outcome::NormalReceived)
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::NormalDelivered)
    }

    /// The one-character archive column for confirmation records.
    pub fn confirmation_char(&self) -> Option<char> {
        match self {
            Outcome::ConfOfDispatch => Some('d'),
            Outcome::ConfOfReceipt => Some('r'),
            Outcome::ConfOfRetrieve => Some('R'),
            Outcome::ConfTimeup => Some('t'),
            _ => None,
        }
    }
}

/// One decoded delivery-log record, borrowing from the source line.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord<'a> {
    /// Seconds since the epoch.
    pub timestamp: i64,
    /// Host field as written, including its blank padding.
    pub host: &'a [u8],
    pub protocol: Protocol,
    pub outcome: Outcome,
    /// Host-toggle digit carried by every framing.
    pub toggle: u8,
    /// Split-counter digit, V2 only.
    pub split: Option<u8>,
    /// Offset of the type code relative to the frame base: 1, 3 or 5.
    pub type_offset: usize,
    pub local_name: &'a [u8],
    pub remote_name: Option<&'a [u8]>,
    pub size: FileSize,
    /// Transfer duration in seconds.
    pub duration: f64,
    /// Retry count, present for V1/V2 framings.
    pub retries: Option<u32>,
    pub job_id: u64,
    /// Byte offset of the job-id field within the line, for detail views.
    pub job_id_offset: usize,
    /// Archive path, when the delivery was archived.
    pub archive: Option<&'a [u8]>,
}

impl<'a> DeliveryRecord<'a> {
    /// Host field without its blank padding.
    pub fn host_trimmed(&self) -> &'a [u8] {
        trim_blanks(self.host)
    }

    /// The name to render: the remote name when requested and recorded,
    /// otherwise the local one.
    pub fn display_name(&self, remote: bool) -> &'a [u8] {
        if remote {
            self.remote_name.unwrap_or(self.local_name)
        } else {
            self.local_name
        }
    }
}

/// Result of decoding one line from a log region.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<'a> {
    /// A well-formed record; `line_len` includes the newline.
    Record {
        record: DeliveryRecord<'a>,
        line_len: usize,
    },
    /// A `#` comment line; `#!#` lines expose their log-type payload.
    Comment {
        log_type_payload: Option<&'a [u8]>,
        line_len: usize,
    },
    /// A malformed line to skip.
    Reject { line_len: usize },
    /// The buffer ends before the line does; nothing was consumed.
    Incomplete,
}

/// Decode the line starting at `buf[0]`.
pub fn decode_line<'a>(buf: &'a [u8], log_type: &LogType) -> Decoded<'a> {
    if buf.is_empty() {
        return Decoded::Incomplete;
    }

    if buf[0] == b'#' {
        let Some(nl) = find_newline(buf) else {
            return Decoded::Incomplete;
        };
        let log_type_payload = buf[..nl].strip_prefix(b"#!#");
        return Decoded::Comment {
            log_type_payload,
            line_len: nl + 1,
        };
    }

    let Some(nl) = find_newline(buf) else {
        return Decoded::Incomplete;
    };
    let line = &buf[..nl];
    let line_len = nl + 1;
    let reject = Decoded::Reject { line_len };

    match decode_record(line, log_type) {
        Some(record) => Decoded::Record { record, line_len },
        None => reject,
    }
}

fn decode_record<'a>(line: &'a [u8], log_type: &LogType) -> Option<DeliveryRecord<'a>> {
    let sep = log_type.sep;
    let base = log_type.frame_base();

    if line.len() < log_type.min_record_len() {
        return None;
    }

    let timestamp = parse_hex_i64(trim_blanks(&line[..log_type.date_width]))?;
    if line[log_type.date_width] != sep {
        return None;
    }

    let host = &line[log_type.date_width + 1..base];
    if line[base] != sep {
        return None;
    }

    // Framing discrimination over the two probe bytes.
    let probe1 = *line.get(base + 2)?;
    let (type_offset, outcome, toggle, split, name_start);
    if probe1 != sep {
        // V0: type, blank, toggle.
        type_offset = 1;
        outcome = Outcome::NormalDelivered;
        toggle = *line.get(base + 3)?;
        split = None;
        if *line.get(base + 4)? != sep {
            return None;
        }
        name_start = base + 5;
    } else if *line.get(base + 4)? == sep {
        // V1: toggle, type.
        type_offset = 3;
        outcome = Outcome::NormalDelivered;
        toggle = line[base + 1];
        split = None;
        name_start = base + 5;
    } else {
        // V2: outcome, toggle, split, type.
        type_offset = 5;
        outcome = Outcome::from_digit(line[base + 1])?;
        toggle = line[base + 3];
        split = Some(line[base + 4]);
        if *line.get(base + 6)? != sep {
            return None;
        }
        name_start = base + 7;
    }

    let protocol = Protocol::from_type_code(*line.get(base + type_offset)?)?;

    let mut cursor = FieldCursor::new(line, name_start, sep);
    let local_name = cursor.take_to_sep()?;

    // The remote name is present iff the byte after the local name's
    // delimiter is not itself the delimiter.
    let remote_name = match cursor.peek()? {
        b if b == sep => {
            cursor.advance(1);
            None
        }
        _ => Some(cursor.take_to_sep()?),
    };

    let size = FileSize::parse_hex(cursor.take_to_sep()?)?;

    let duration = std::str::from_utf8(cursor.take_to_sep()?)
        .ok()?
        .parse::<f64>()
        .ok()?;
    if !duration.is_finite() || duration < 0.0 {
        return None;
    }

    let retries = if type_offset > 1 {
        Some(parse_hex_u32(cursor.take_to_sep()?)?)
    } else {
        None
    };

    let job_id_offset = cursor.pos();
    let (job_field, had_sep) = cursor.take_to_sep_or_end();
    if job_field.len() > 15 {
        return None;
    }
    let job_id = parse_hex_u64(job_field)?;

    let archive = if had_sep {
        let rest = cursor.rest();
        (!rest.is_empty()).then_some(rest)
    } else {
        None
    };

    Some(DeliveryRecord {
        timestamp,
        host,
        protocol,
        outcome,
        toggle,
        split,
        type_offset,
        local_name,
        remote_name,
        size,
        duration,
        retries,
        job_id,
        job_id_offset,
        archive,
    })
}

fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(start, |p| p + 1);
    &bytes[start..end]
}

fn parse_hex_i64(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    i64::from_str_radix(std::str::from_utf8(bytes).ok()?, 16).ok()
}

fn parse_hex_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u64::from_str_radix(std::str::from_utf8(bytes).ok()?, 16).ok()
}

fn parse_hex_u32(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u32::from_str_radix(std::str::from_utf8(bytes).ok()?, 16).ok()
}

/// Bounds-checked reader over one record line.
struct FieldCursor<'a> {
    line: &'a [u8],
    pos: usize,
    sep: u8,
}

impl<'a> FieldCursor<'a> {
    fn new(line: &'a [u8], pos: usize, sep: u8) -> Self {
        Self { line, pos, sep }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// The field up to the next delimiter, consuming the delimiter too.
    fn take_to_sep(&mut self) -> Option<&'a [u8]> {
        let rest = self.line.get(self.pos..)?;
        let sep_at = rest.iter().position(|&b| b == self.sep)?;
        let field = &rest[..sep_at];
        self.pos += sep_at + 1;
        Some(field)
    }

    /// The field up to the next delimiter or the end of the line; the flag
    /// reports whether a delimiter terminated it.
    fn take_to_sep_or_end(&mut self) -> (&'a [u8], bool) {
        let rest = self.line.get(self.pos..).unwrap_or(&[]);
        match rest.iter().position(|&b| b == self.sep) {
            Some(sep_at) => {
                self.pos += sep_at + 1;
                (&rest[..sep_at], true)
            }
            None => {
                self.pos = self.line.len();
                (rest, false)
            }
        }
    }

    fn rest(&self) -> &'a [u8] {
        self.line.get(self.pos..).unwrap_or(&[])
    }
}
