//! Query engine configuration.

use dlog_core::archive::DEFAULT_EXPIRY_GRACE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Knobs governing one query run.
///
/// Only the log directory is required; every other knob has the logger's
/// conventional default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Directory holding the rotated generations.
    pub log_dir: PathBuf,

    /// Base file name of the ring; generation `n` is `<base><n>`.
    pub base_name: String,

    /// Size of the rotation ring.
    pub max_generations: u32,

    /// Surviving rows per batch handed to the sink. Also the growth stride
    /// of the line-index arrays, so it bounds both UI jitter and allocation
    /// churn.
    pub lines_per_batch: usize,

    /// Longest stretch the scanner may run without testing for an
    /// interrupt.
    pub check_time_interval: Duration,

    /// Poll interval of the tail follower.
    pub tail_poll_interval: Duration,

    /// Slack added to a generation's mtime when deciding whether it may
    /// still contain records at the window start, covering the rotation
    /// interval.
    pub generation_mtime_grace: i64,

    /// Seconds past its expiry time after which an archive copy is assumed
    /// purged.
    pub archive_expiry_grace: i64,
}

impl QueryConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            base_name: "output.log".to_string(),
            max_generations: 10,
            lines_per_batch: 1000,
            check_time_interval: Duration::from_secs(1),
            tail_poll_interval: Duration::from_secs(2),
            generation_mtime_grace: 3600,
            archive_expiry_grace: DEFAULT_EXPIRY_GRACE,
        }
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn with_max_generations(mut self, max_generations: u32) -> Self {
        self.max_generations = max_generations;
        self
    }

    pub fn with_lines_per_batch(mut self, lines_per_batch: usize) -> Self {
        self.lines_per_batch = lines_per_batch.max(1);
        self
    }

    pub fn with_check_time_interval(mut self, interval: Duration) -> Self {
        self.check_time_interval = interval;
        self
    }

    pub fn with_tail_poll_interval(mut self, interval: Duration) -> Self {
        self.tail_poll_interval = interval;
        self
    }

    pub fn with_generation_mtime_grace(mut self, grace: i64) -> Self {
        self.generation_mtime_grace = grace;
        self
    }

    pub fn with_archive_expiry_grace(mut self, grace: i64) -> Self {
        self.archive_expiry_grace = grace;
        self
    }
}
