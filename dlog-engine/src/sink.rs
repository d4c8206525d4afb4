//! The sink boundary and the running summary.
//!
//! The sink is the only component that touches whatever displays the rows;
//! everything else talks to it through this narrow trait. Batches arrive in
//! emission order; the summary and a rotating searching indicator are
//! refreshed at every batch boundary.

use crate::row::Row;
use serde::Serialize;

/// Receiver of query results.
pub trait RowSink {
    /// A query (or a rotation-triggered rerun) starts: drop any visible
    /// rows.
    fn clear(&mut self);

    /// Append a batch of formatted rows.
    fn push_batch(&mut self, rows: Vec<Row>);

    /// Refresh the summary label.
    fn publish_summary(&mut self, summary: &Summary);

    /// Show a status message or the searching indicator.
    fn publish_status(&mut self, message: &str);

    /// True when the user asked the query to stop. Called at batch
    /// boundaries and periodically between them, so implementations may
    /// also use it to keep their event loop live.
    fn check_interrupt(&mut self) -> bool;
}

/// Running totals over the surviving records of one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Earliest record timestamp seen.
    pub first_time: Option<i64>,
    /// Latest record timestamp seen.
    pub last_time: Option<i64>,
    pub records: u64,
    /// Total bytes; a record with the infinite size sentinel drives this to
    /// infinity rather than dropping the record.
    pub bytes: f64,
    /// Total transfer time in seconds.
    pub transfer_time: f64,
    /// Non-printable file-name bytes substituted so far.
    pub unprintable: u64,
}

impl Summary {
    pub(crate) fn note(&mut self, timestamp: i64, bytes: f64, transfer_time: f64, unprintable: u64) {
        self.first_time = Some(match self.first_time {
            Some(first) => first.min(timestamp),
            None => timestamp,
        });
        self.last_time = Some(match self.last_time {
            Some(last) => last.max(timestamp),
            None => timestamp,
        });
        self.records += 1;
        self.bytes += bytes;
        self.transfer_time += transfer_time;
        self.unprintable += unprintable;
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = if self.bytes.is_finite() {
            format!("{:.0}", self.bytes)
        } else {
            "INF".to_string()
        };

        write!(
            f,
            "{} records  {} bytes  {:.2}s transfer time",
            self.records, bytes, self.transfer_time
        )?;

        if let (Some(first), Some(last)) = (self.first_time, self.last_time) {
            write!(f, "  [{first:x} .. {last:x}]")?;
        }
        if self.unprintable > 0 {
            write!(f, "  ({} unprintable)", self.unprintable)?;
        }

        Ok(())
    }
}

/// The four frames of the searching indicator.
pub(crate) const SEARCH_INDICATOR: [char; 4] = ['-', '\\', '|', '/'];
