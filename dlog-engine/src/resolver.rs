//! Job-id resolution with per-query memoisation.
//!
//! Directory and user filters need the job entry behind a record's job id.
//! The lookup itself belongs to an external collaborator; the resolver in
//! front of it guarantees that identical job ids resolve identically within
//! one query scan and that the cache is dropped when the query ends.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which half of a job entry a lookup needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    UserOnly,
    DirOnly,
}

/// The data a job id resolves to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    pub user: String,
    pub mail_destination: String,
    pub dir: String,
    pub dir_id: u32,
}

/// External source of job data.
pub trait JobInfo {
    fn lookup(&self, job_id: u64, mode: LookupMode) -> Option<JobEntry>;
}

/// A job-info source that knows nothing; dir and user filters then match no
/// record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJobInfo;

impl JobInfo for NoJobInfo {
    fn lookup(&self, _job_id: u64, _mode: LookupMode) -> Option<JobEntry> {
        None
    }
}

/// An in-memory job-info table.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StaticJobInfo {
    jobs: FxHashMap<u64, JobEntry>,
}

impl StaticJobInfo {
    pub fn insert(&mut self, job_id: u64, entry: JobEntry) {
        self.jobs.insert(job_id, entry);
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobInfo for StaticJobInfo {
    fn lookup(&self, job_id: u64, _mode: LookupMode) -> Option<JobEntry> {
        self.jobs.get(&job_id).cloned()
    }
}

/// Memoising front of a [`JobInfo`] source, alive for one query.
#[derive(Debug)]
pub struct JobResolver<'a, J: JobInfo> {
    source: &'a J,
    users: FxHashMap<u64, Option<(String, String)>>,
    dirs: FxHashMap<u64, Option<(String, u32)>>,
}

impl<'a, J: JobInfo> JobResolver<'a, J> {
    pub fn new(source: &'a J) -> Self {
        Self {
            source,
            users: FxHashMap::default(),
            dirs: FxHashMap::default(),
        }
    }

    /// User and mail destination of a job id.
    pub fn resolve_user(&mut self, job_id: u64) -> Option<&(String, String)> {
        let source = self.source;
        self.users
            .entry(job_id)
            .or_insert_with(|| {
                source
                    .lookup(job_id, LookupMode::UserOnly)
                    .map(|entry| (entry.user, entry.mail_destination))
            })
            .as_ref()
    }

    /// Directory path and directory id of a job id.
    pub fn resolve_dir(&mut self, job_id: u64) -> Option<&(String, u32)> {
        let source = self.source;
        self.dirs
            .entry(job_id)
            .or_insert_with(|| {
                source
                    .lookup(job_id, LookupMode::DirOnly)
                    .map(|entry| (entry.dir, entry.dir_id))
            })
            .as_ref()
    }

    /// Drop the cache at query end.
    pub fn free(&mut self) {
        self.users.clear();
        self.dirs.clear();
    }
}
