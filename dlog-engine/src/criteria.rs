//! Multi-dimensional query criteria.
//!
//! A query combines any subset of these dimensions; composition is always
//! conjunctive. Patterns use glob syntax, and a file-name pattern starting
//! with `!` excludes what it matches.

use crate::error::EngineError;
use dlog_core::ProtocolMask;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Comparator of the size and transfer-time filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Equal,
    Less,
    Greater,
    NotEqual,
}

impl CompareOp {
    /// Apply the comparator. Both sides are doubles so the infinite size
    /// sentinel orders correctly against any finite search value.
    pub fn matches(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Equal => lhs == rhs,
            CompareOp::Less => lhs < rhs,
            CompareOp::Greater => lhs > rhs,
            CompareOp::NotEqual => lhs != rhs,
        }
    }
}

/// One numeric filter: a comparator plus its reference value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericFilter {
    pub op: CompareOp,
    pub value: f64,
}

impl NumericFilter {
    pub fn new(op: CompareOp, value: f64) -> Self {
        Self { op, value }
    }

    pub fn matches(&self, value: f64) -> bool {
        self.op.matches(value, self.value)
    }
}

impl FromStr for NumericFilter {
    type Err = EngineError;

    /// Parse expressions like `>1000`, `<2.5`, `=42`, `!=7` or a bare
    /// number (equality).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (op, rest) = if let Some(rest) = s.strip_prefix("!=") {
            (CompareOp::NotEqual, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (CompareOp::Greater, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (CompareOp::Less, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (CompareOp::Equal, rest)
        } else {
            (CompareOp::Equal, s)
        };

        rest.trim()
            .parse::<f64>()
            .map(|value| NumericFilter::new(op, value))
            .map_err(|_| EngineError::FilterExpression(s.to_string()))
    }
}

bitflags::bitflags! {
    /// View restrictions over the record outcome and archive status.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ViewFlags: u8 {
        /// Only records whose archive copy still exists.
        const ARCHIVED_ONLY = 1 << 0;
        /// Only received (input) records.
        const RECEIVED_ONLY = 1 << 1;
        /// Only delivered (output) records.
        const OUTPUT_ONLY = 1 << 2;
        /// Include confirmation records.
        const CONFIRMATION = 1 << 3;
    }
}

impl Serialize for ViewFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ViewFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(ViewFlags::from_bits_truncate(bits))
    }
}

/// Which path column a row renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameDisplay {
    #[default]
    Local,
    Remote,
}

/// Everything a query filters on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Criteria {
    /// Window start in epoch seconds; `None` is open.
    pub start_time: Option<i64>,
    /// Window end in epoch seconds; `None` is open and enables tail-follow.
    pub end_time: Option<i64>,

    /// File-name globs; a leading `!` negates a pattern.
    pub file_names: Vec<String>,
    /// Recipient-host globs.
    pub hosts: Vec<String>,
    /// Directory globs, matched against the job's resolved directory.
    pub directories: Vec<String>,
    /// Directory ids, an alternative way to select directories.
    pub dir_ids: Vec<u32>,
    /// Exact job ids.
    pub job_ids: Vec<u64>,
    /// User globs, matched against the job's resolved user.
    pub users: Vec<String>,

    pub size: Option<NumericFilter>,
    pub transfer_time: Option<NumericFilter>,

    pub protocols: ProtocolMask,
    pub view: ViewFlags,
    pub name_display: NameDisplay,

    /// Hard cap on surviving records; 0 is unbounded.
    pub list_limit: usize,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_end_time(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_file_names(mut self, file_names: Vec<String>) -> Self {
        self.file_names = file_names;
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_directories(mut self, directories: Vec<String>) -> Self {
        self.directories = directories;
        self
    }

    pub fn with_dir_ids(mut self, dir_ids: Vec<u32>) -> Self {
        self.dir_ids = dir_ids;
        self
    }

    pub fn with_job_ids(mut self, job_ids: Vec<u64>) -> Self {
        self.job_ids = job_ids;
        self
    }

    pub fn with_users(mut self, users: Vec<String>) -> Self {
        self.users = users;
        self
    }

    pub fn with_size_filter(mut self, filter: NumericFilter) -> Self {
        self.size = Some(filter);
        self
    }

    pub fn with_transfer_time_filter(mut self, filter: NumericFilter) -> Self {
        self.transfer_time = Some(filter);
        self
    }

    pub fn with_protocols(mut self, protocols: ProtocolMask) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_view(mut self, view: ViewFlags) -> Self {
        self.view = view;
        self
    }

    pub fn with_name_display(mut self, name_display: NameDisplay) -> Self {
        self.name_display = name_display;
        self
    }

    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }
}
