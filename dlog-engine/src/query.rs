//! Top-level query orchestration.
//!
//! The driver owns every piece of per-query state, selects the generation
//! span, drives the scanner across it oldest-to-newest, and, when the
//! window end is open, keeps following the live generation until the user
//! stops it or the window closes. A rotation the follower cannot express as
//! a delta restarts the whole query against the rediscovered ring.

use crate::clock::{Clock, SystemClock};
use crate::config::QueryConfig;
use crate::criteria::Criteria;
use crate::error::Result;
use crate::follow::{Follower, Tick};
use crate::planner::Plan;
use crate::resolver::{JobInfo, JobResolver, NoJobInfo};
use crate::scanner::{scan_region, LineIndex, ScanOutcome};
use crate::sink::{RowSink, Summary, SEARCH_INDICATOR};
use dlog_core::time_index::{first_timestamp, last_timestamp, search_time};
use dlog_core::{CoreError, LogBuffer, LogType, TimeBound};
use dlog_registry::GenerationSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How a query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Done,
    Interrupted,
}

/// Line index of one scanned generation.
#[derive(Debug)]
pub struct GenerationIndex {
    pub generation: u32,
    pub lines: LineIndex,
}

/// All mutable state of one query run.
///
/// Owned by the driver and handed down by explicit reference; nothing here
/// lives in process-wide state. The line-index arrays persist after a
/// completed query for detail views and are released deterministically when
/// the next query starts.
#[derive(Debug, Default)]
pub struct QueryState {
    pub(crate) summary: Summary,
    pub(crate) emitted: u64,
    spinner: usize,
    generations: Vec<GenerationIndex>,
}

impl QueryState {
    pub(crate) fn reset(&mut self) {
        self.generations = Vec::new();
        self.summary = Summary::default();
        self.emitted = 0;
        self.spinner = 0;
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn generations(&self) -> &[GenerationIndex] {
        &self.generations
    }

    pub(crate) fn index_for(&mut self, generation: u32, stride: usize) -> &mut LineIndex {
        if self.generations.last().map(|g| g.generation) != Some(generation) {
            self.generations.push(GenerationIndex {
                generation,
                lines: LineIndex::with_stride(stride),
            });
        }
        &mut self.generations.last_mut().expect("just pushed").lines
    }

    pub(crate) fn next_indicator(&mut self) -> String {
        let frame = SEARCH_INDICATOR[self.spinner];
        self.spinner = (self.spinner + 1) % SEARCH_INDICATOR.len();
        frame.to_string()
    }
}

/// One configured delivery-log query.
pub struct Query<J = NoJobInfo, C = SystemClock> {
    criteria: Criteria,
    config: QueryConfig,
    log_type: LogType,
    job_info: J,
    clock: C,
    state: QueryState,
}

impl Query {
    pub fn new(criteria: Criteria, config: QueryConfig) -> Query {
        Query {
            criteria,
            config,
            log_type: LogType::default(),
            job_info: NoJobInfo,
            clock: SystemClock,
            state: QueryState::default(),
        }
    }
}

impl<J: JobInfo, C: Clock> Query<J, C> {
    /// Replace the job-info collaborator.
    pub fn with_job_info<J2: JobInfo>(self, job_info: J2) -> Query<J2, C> {
        Query {
            criteria: self.criteria,
            config: self.config,
            log_type: self.log_type,
            job_info,
            clock: self.clock,
            state: self.state,
        }
    }

    /// Replace the clock collaborator.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Query<J, C2> {
        Query {
            criteria: self.criteria,
            config: self.config,
            log_type: self.log_type,
            job_info: self.job_info,
            clock,
            state: self.state,
        }
    }

    /// Override the initial log-type parameters (`#!#` headers still apply
    /// on top).
    pub fn with_log_type(mut self, log_type: LogType) -> Self {
        self.log_type = log_type;
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn summary(&self) -> &Summary {
        &self.state.summary
    }

    /// Run the query to completion.
    ///
    /// Failures are also surfaced to the sink as a status message so the
    /// display never just goes quiet; the error still propagates for the
    /// caller to decide.
    pub async fn run<S: RowSink>(&mut self, sink: &mut S) -> Result<QueryOutcome> {
        let result = self.run_inner(sink).await;
        if let Err(err) = &result {
            sink.publish_status(&format!("Query failed: {err}"));
        }
        result
    }

    async fn run_inner<S: RowSink>(&mut self, sink: &mut S) -> Result<QueryOutcome> {
        let Query {
            criteria,
            config,
            log_type,
            job_info,
            clock,
            state,
        } = self;

        'search: loop {
            state.reset();
            sink.clear();
            sink.publish_summary(&state.summary);

            let mut follower =
                match run_pass(criteria, config, log_type, &*job_info, &*clock, state, sink)? {
                    PassEnd::Done => {
                        sink.publish_summary(&state.summary);
                        return Ok(QueryOutcome::Done);
                    }
                    PassEnd::Interrupted => return Ok(QueryOutcome::Interrupted),
                    PassEnd::Follow(follower) => follower,
                };

            let plan = Plan::select(criteria)?;
            let mut resolver = JobResolver::new(&*job_info);

            loop {
                tokio::time::sleep(config.tail_poll_interval).await;

                if sink.check_interrupt() {
                    return Ok(QueryOutcome::Interrupted);
                }

                match follower.tick()? {
                    Tick::Delta {
                        bytes, base_offset, ..
                    } => {
                        let (outcome, consumed) = scan_region(
                            &bytes,
                            base_offset,
                            0,
                            criteria,
                            config,
                            &plan,
                            log_type,
                            &mut resolver,
                            &*clock,
                            state,
                            sink,
                        )?;
                        follower.advance(consumed);

                        match outcome {
                            ScanOutcome::Interrupted => return Ok(QueryOutcome::Interrupted),
                            ScanOutcome::LimitReached => return Ok(QueryOutcome::Done),
                            ScanOutcome::Completed => {}
                        }
                        if window_expired(criteria, &*clock) {
                            return Ok(QueryOutcome::Done);
                        }
                    }
                    Tick::Rediscover => {
                        debug!("rotation detected, rerunning the query");
                        continue 'search;
                    }
                    Tick::Waiting => {
                        let indicator = state.next_indicator();
                        sink.publish_status(&indicator);
                        if window_expired(criteria, &*clock) {
                            return Ok(QueryOutcome::Done);
                        }
                    }
                }
            }
        }
    }
}

fn window_expired<C: Clock>(criteria: &Criteria, clock: &C) -> bool {
    match criteria.end_time {
        Some(end) => clock.now() > end,
        None => false,
    }
}

enum PassEnd {
    Done,
    Interrupted,
    Follow(Follower),
}

/// One historical pass over the selected generation span.
#[allow(clippy::too_many_arguments)]
fn run_pass<J, C, S>(
    criteria: &Criteria,
    config: &QueryConfig,
    log_type: &mut LogType,
    job_info: &J,
    clock: &C,
    state: &mut QueryState,
    sink: &mut S,
) -> Result<PassEnd>
where
    J: JobInfo,
    C: Clock,
    S: RowSink,
{
    let set = GenerationSet::discover(&config.log_dir, &config.base_name, config.max_generations)?;

    let Some((start_gen, end_gen)) = set.select_span(
        criteria.start_time,
        criteria.end_time,
        config.generation_mtime_grace,
    ) else {
        sink.publish_status("No log data found");
        return Ok(PassEnd::Done);
    };

    let plan = Plan::select(criteria)?;
    let mut resolver = JobResolver::new(job_info);
    let mut live: Option<(PathBuf, u64)> = None;

    for generation in set.span_oldest_first(start_gen, end_gen) {
        let buffer = match LogBuffer::load(&generation.path) {
            Ok(buffer) => buffer,
            Err(CoreError::Open { path, source })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!("generation {} vanished, treating as empty", path.display());
                continue;
            }
            Err(err) => {
                warn!("{err}");
                sink.publish_status(&format!(
                    "Skipping generation {}: {err}",
                    generation.index
                ));
                continue;
            }
        };

        log_type.prime_from_header(&buffer);

        let Some(first_ts) = first_timestamp(&buffer, log_type) else {
            // Empty or header-only; the live file may still grow.
            if generation.index == 0 {
                live = Some((generation.path.clone(), buffer.len() as u64));
            }
            continue;
        };
        let last_ts = last_timestamp(&buffer, log_type).unwrap_or(first_ts);

        let lo = match criteria.start_time {
            None => 0,
            Some(t) => search_time(&buffer, TimeBound::Lower, t, first_ts, last_ts, log_type),
        };
        let hi = match criteria.end_time {
            None => buffer.len(),
            Some(t) => search_time(&buffer, TimeBound::Upper, t, first_ts, last_ts, log_type),
        };

        let mut live_offset = buffer.len() as u64;
        if lo < hi {
            let (outcome, consumed) = scan_region(
                &buffer[lo..hi],
                lo as u64,
                generation.index,
                criteria,
                config,
                &plan,
                log_type,
                &mut resolver,
                clock,
                state,
                sink,
            )?;
            live_offset = (lo + consumed) as u64;

            match outcome {
                ScanOutcome::Interrupted => {
                    resolver.free();
                    return Ok(PassEnd::Interrupted);
                }
                ScanOutcome::LimitReached => {
                    resolver.free();
                    return Ok(PassEnd::Done);
                }
                ScanOutcome::Completed => {}
            }
        }

        if generation.index == 0 {
            live = Some((generation.path.clone(), live_offset));
        }
        // The mapping is released here, before the next generation opens.
    }

    resolver.free();

    let follow_wanted = match criteria.end_time {
        None => true,
        Some(end) => clock.now() <= end,
    };
    if follow_wanted {
        if let Some((path, offset)) = live {
            match Follower::open(&path, offset) {
                Ok(follower) => return Ok(PassEnd::Follow(follower)),
                Err(err) => warn!("cannot follow the live generation: {err}"),
            }
        }
    }

    Ok(PassEnd::Done)
}
