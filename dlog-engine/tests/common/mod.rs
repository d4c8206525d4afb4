//! Shared helpers for the query integration tests.
#![allow(dead_code)]

use dlog_core::LogType;
use dlog_engine::{Clock, Row, RowSink, Summary};
use std::fs::{File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, UNIX_EPOCH};

/// Log type of the test corpora: `|` delimiter, widths set by the header
/// every generation starts with.
pub fn test_log_type() -> LogType {
    LogType::new(b'|', 10, 8)
}

pub fn generation_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("output.log{index}"))
}

/// Write one generation: the `#!#` width header plus the given record
/// lines, with a controlled mtime.
pub fn write_generation(dir: &Path, index: u32, mtime: i64, lines: &[&str]) {
    let path = generation_path(dir, index);

    let mut content = String::from("#!# 2 8 5\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    set_mtime(&path, mtime);
}

pub fn set_mtime(path: &Path, mtime: i64) {
    let file = File::options().write(true).open(path).unwrap();
    let at = UNIX_EPOCH + Duration::from_secs(mtime as u64);
    file.set_times(FileTimes::new().set_modified(at).set_accessed(at))
        .unwrap();
}

pub fn append_line(path: &Path, line: &str) {
    let mut file = File::options().append(true).open(path).unwrap();
    writeln!(file, "{line}").unwrap();
}

#[derive(Default)]
pub struct SinkState {
    pub rows: Vec<Row>,
    pub statuses: Vec<String>,
    pub summaries: Vec<Summary>,
    pub clears: usize,
    pub interrupt: bool,
}

/// A sink whose state the test can observe while the query runs.
#[derive(Clone, Default)]
pub struct SharedSink {
    inner: Arc<Mutex<SinkState>>,
}

impl SharedSink {
    pub fn state(&self) -> MutexGuard<'_, SinkState> {
        self.inner.lock().unwrap()
    }

    pub fn names(&self) -> Vec<String> {
        self.state().rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.state().rows.len()
    }

    pub fn last_summary(&self) -> Summary {
        *self.state().summaries.last().expect("no summary published")
    }

    pub fn interrupt(&self) {
        self.state().interrupt = true;
    }
}

impl RowSink for SharedSink {
    fn clear(&mut self) {
        let mut state = self.state();
        state.rows.clear();
        state.clears += 1;
    }

    fn push_batch(&mut self, rows: Vec<Row>) {
        self.state().rows.extend(rows);
    }

    fn publish_summary(&mut self, summary: &Summary) {
        self.state().summaries.push(*summary);
    }

    fn publish_status(&mut self, message: &str) {
        self.state().statuses.push(message.to_string());
    }

    fn check_interrupt(&mut self) -> bool {
        self.state().interrupt
    }
}

/// A clock the test can move forward while the query runs.
#[derive(Clone, Default)]
pub struct SteppingClock(Arc<AtomicI64>);

impl SteppingClock {
    pub fn starting_at(now: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Poll the sink until the predicate holds; panics when it never does.
pub async fn wait_until(sink: &SharedSink, what: &str, pred: impl Fn(&SinkState) -> bool) {
    for _ in 0..10_000 {
        if pred(&sink.state()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("timed out waiting for {what}");
}
