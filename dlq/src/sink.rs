//! Terminal row sink.
//!
//! Rows go to stdout, status messages to stderr; the searching indicator is
//! drawn in place so it does not flood the terminal. Ctrl-C cancels the
//! token the interrupt check polls.

use dlog_engine::{Row, RowSink, Summary};
use std::io::{IsTerminal, Write};
use tokio_util::sync::CancellationToken;

pub struct TerminalSink {
    stop: CancellationToken,
    latest_summary: Summary,
    rows_written: u64,
    show_indicator: bool,
}

impl TerminalSink {
    pub fn new(stop: CancellationToken) -> Self {
        Self {
            stop,
            latest_summary: Summary::default(),
            rows_written: 0,
            show_indicator: std::io::stderr().is_terminal(),
        }
    }

    pub fn summary(&self) -> &Summary {
        &self.latest_summary
    }

    fn is_indicator(message: &str) -> bool {
        matches!(message, "-" | "\\" | "|" | "/")
    }
}

impl RowSink for TerminalSink {
    fn clear(&mut self) {
        // A terminal cannot take rows back; mark the restart instead.
        if self.rows_written > 0 {
            eprintln!("-- log rotated, result list restarted --");
        }
        self.rows_written = 0;
    }

    fn push_batch(&mut self, rows: Vec<Row>) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for row in &rows {
            let _ = writeln!(out, "{}", row.render());
        }
        self.rows_written += rows.len() as u64;
    }

    fn publish_summary(&mut self, summary: &Summary) {
        self.latest_summary = *summary;
    }

    fn publish_status(&mut self, message: &str) {
        if Self::is_indicator(message) {
            if self.show_indicator {
                eprint!("{message}\r");
                let _ = std::io::stderr().flush();
            }
        } else {
            eprintln!("{message}");
        }
    }

    fn check_interrupt(&mut self) -> bool {
        self.stop.is_cancelled()
    }
}
