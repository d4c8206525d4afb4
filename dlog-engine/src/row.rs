//! Formatted result rows.

use dlog_core::record::DeliveryRecord;
use dlog_core::{FileSize, Protocol};
use serde::Serialize;

/// One surviving record, formatted for the sink.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    /// Record timestamp in epoch seconds.
    pub timestamp: i64,
    pub host: String,
    pub protocol: Protocol,
    /// Displayed file name, non-printable bytes already substituted.
    pub name: String,
    pub size: FileSize,
    pub duration: f64,
    pub retries: Option<u32>,
    pub job_id: u64,
    /// One-character archive status.
    pub archive: char,
    /// Generation the record came from.
    pub generation: u32,
    /// Byte offset of the record within its generation.
    pub line_offset: u64,
}

impl Row {
    /// Build a row from a decoded record. Returns the row together with the
    /// number of non-printable name bytes that were substituted.
    pub(crate) fn build(
        record: &DeliveryRecord<'_>,
        archive: char,
        remote_name: bool,
        generation: u32,
        line_offset: u64,
    ) -> (Row, u64) {
        let (name, unprintable) = sanitize_name(record.display_name(remote_name));
        let host = String::from_utf8_lossy(record.host_trimmed()).into_owned();

        let row = Row {
            timestamp: record.timestamp,
            host,
            protocol: record.protocol,
            name,
            size: record.size,
            duration: record.duration,
            retries: record.retries,
            job_id: record.job_id,
            archive,
            generation,
            line_offset,
        };

        (row, unprintable)
    }

    /// Fixed-layout text rendering:
    /// date, name, host, protocol, size, duration, retries, job id, status.
    pub fn render(&self) -> String {
        let when = chrono::DateTime::from_timestamp(self.timestamp, 0)
            .map(|utc| {
                utc.with_timezone(&chrono::Local)
                    .format("%d.%m.%Y %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| format!("{:>19}", self.timestamp));

        let retries = match self.retries {
            Some(retries) => format!("{retries:>3}"),
            None => "   ".to_string(),
        };

        format!(
            "{when} {:<38} {:<8} {:<6} {:>12} {:>9.2} {retries} {:>13x} {}",
            self.name,
            self.host,
            self.protocol.short_name(),
            self.size.to_string(),
            self.duration,
            self.job_id,
            self.archive,
        )
    }
}

/// Substitute non-printable bytes (below 0x20) with `?`, counting them.
pub(crate) fn sanitize_name(bytes: &[u8]) -> (String, u64) {
    let mut unprintable = 0u64;
    let cleaned: Vec<u8> = bytes
        .iter()
        .map(|&b| {
            if b < 0x20 {
                unprintable += 1;
                b'?'
            } else {
                b
            }
        })
        .collect();

    (String::from_utf8_lossy(&cleaned).into_owned(), unprintable)
}
