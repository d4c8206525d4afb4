//! The record scan loop.
//!
//! One call scans one contiguous byte region of a generation: the windowed
//! slice of the historical pass, or a growth delta during tail-follow. The
//! loop decodes records, applies the planned predicate and the always-on
//! gates, formats surviving rows into batches and keeps the line index and
//! summary current. Interrupts are tested at batch boundaries, every
//! [`INTERRUPT_CANDIDATE_STRIDE`] candidate records, and at least once per
//! configured wall-clock interval, whichever comes sooner.

use crate::clock::Clock;
use crate::config::QueryConfig;
use crate::criteria::{Criteria, NameDisplay, ViewFlags};
use crate::error::{EngineError, Result};
use crate::planner::Plan;
use crate::query::QueryState;
use crate::resolver::{JobInfo, JobResolver};
use crate::row::Row;
use crate::sink::RowSink;
use dlog_core::archive::archive_status;
use dlog_core::record::{decode_line, Decoded, Outcome};
use dlog_core::LogType;
use std::time::Instant;

/// Candidate records between two interrupt tests.
pub(crate) const INTERRUPT_CANDIDATE_STRIDE: u32 = 200;

/// How one region scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanOutcome {
    /// The region was consumed.
    Completed,
    /// The sink asked to stop.
    Interrupted,
    /// The list limit was reached.
    LimitReached,
}

/// Per-record index of the surviving records of one generation.
///
/// Three parallel arrays keyed by surviving-record index, grown in strides
/// of the batch size. They outlive the scan so detail views can seek back
/// into the generation.
#[derive(Debug, Default)]
pub struct LineIndex {
    line_offsets: Vec<u64>,
    field_offsets: Vec<u64>,
    archived: Vec<bool>,
    stride: usize,
}

impl LineIndex {
    pub(crate) fn with_stride(stride: usize) -> Self {
        Self {
            line_offsets: Vec::new(),
            field_offsets: Vec::new(),
            archived: Vec::new(),
            stride: stride.max(1),
        }
    }

    pub(crate) fn push(&mut self, line_offset: u64, field_offset: u64, archived: bool) -> Result<()> {
        if self.line_offsets.len() == self.line_offsets.capacity() {
            self.line_offsets
                .try_reserve_exact(self.stride)
                .map_err(|_| EngineError::Allocation)?;
            self.field_offsets
                .try_reserve_exact(self.stride)
                .map_err(|_| EngineError::Allocation)?;
            self.archived
                .try_reserve_exact(self.stride)
                .map_err(|_| EngineError::Allocation)?;
        }

        self.line_offsets.push(line_offset);
        self.field_offsets.push(field_offset);
        self.archived.push(archived);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.line_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_offsets.is_empty()
    }

    /// Byte offset at which surviving record `k` begins.
    pub fn line_offset(&self, k: usize) -> Option<u64> {
        self.line_offsets.get(k).copied()
    }

    /// Byte offset at which record `k`'s job-id field begins.
    pub fn field_offset(&self, k: usize) -> Option<u64> {
        self.field_offsets.get(k).copied()
    }

    /// Whether record `k` carried an archive path.
    pub fn archived(&self, k: usize) -> Option<bool> {
        self.archived.get(k).copied()
    }
}

/// Scan `buf` (a region of generation `generation` starting at absolute
/// byte `base_offset`) and emit surviving rows.
///
/// Returns how the scan ended and how many bytes of `buf` were consumed;
/// a trailing partial line is left unconsumed for the next delta.
#[allow(clippy::too_many_arguments)]
pub(crate) fn scan_region<J, C, S>(
    buf: &[u8],
    base_offset: u64,
    generation: u32,
    criteria: &Criteria,
    config: &QueryConfig,
    plan: &Plan,
    log_type: &mut LogType,
    resolver: &mut JobResolver<'_, J>,
    clock: &C,
    state: &mut QueryState,
    sink: &mut S,
) -> Result<(ScanOutcome, usize)>
where
    J: JobInfo,
    C: Clock,
    S: RowSink,
{
    let remote_name = criteria.name_display == NameDisplay::Remote;
    let mut batch: Vec<Row> = Vec::new();
    let mut pos = 0usize;
    let mut candidates = 0u32;
    let mut last_check = Instant::now();

    while pos < buf.len() {
        let (record, line_len) = match decode_line(&buf[pos..], log_type) {
            Decoded::Incomplete => break,
            Decoded::Comment {
                log_type_payload,
                line_len,
            } => {
                if let Some(payload) = log_type_payload {
                    log_type.note_log_type(payload);
                }
                pos += line_len;
                continue;
            }
            Decoded::Reject { line_len } => {
                pos += line_len;
                continue;
            }
            Decoded::Record { record, line_len } => (record, line_len),
        };

        candidates += 1;
        if candidates >= INTERRUPT_CANDIDATE_STRIDE
            || last_check.elapsed() >= config.check_time_interval
        {
            candidates = 0;
            last_check = Instant::now();
            if sink.check_interrupt() {
                flush(state, sink, &mut batch);
                return Ok((ScanOutcome::Interrupted, pos));
            }
        }

        // Protocol toggle mask.
        if !criteria.protocols.admits(record.protocol) {
            pos += line_len;
            continue;
        }

        // View gates over the outcome.
        let view = criteria.view;
        let dropped = match record.outcome {
            Outcome::NormalDelivered => view.contains(ViewFlags::RECEIVED_ONLY),
            Outcome::NormalReceived => {
                view.contains(ViewFlags::OUTPUT_ONLY) || view.contains(ViewFlags::ARCHIVED_ONLY)
            }
            _ => !view.contains(ViewFlags::CONFIRMATION),
        };
        if dropped {
            pos += line_len;
            continue;
        }

        // The planned predicate, then the transfer-time comparator.
        if !plan.accepts(criteria, &record, resolver) {
            pos += line_len;
            continue;
        }
        if let Some(filter) = &criteria.transfer_time {
            if !filter.matches(record.duration) {
                pos += line_len;
                continue;
            }
        }

        // Archive status.
        let status = archive_status(
            record.archive,
            record.outcome,
            clock.now(),
            config.archive_expiry_grace,
        );
        if view.contains(ViewFlags::ARCHIVED_ONLY) && status != 'Y' {
            pos += line_len;
            continue;
        }

        // List limit: at most `list_limit` rows are emitted.
        if criteria.list_limit > 0 && state.emitted >= criteria.list_limit as u64 {
            flush(state, sink, &mut batch);
            sink.publish_status(&format!("List limit ({}) reached!", criteria.list_limit));
            return Ok((ScanOutcome::LimitReached, pos));
        }

        let line_offset = base_offset + pos as u64;
        let (row, unprintable) = Row::build(&record, status, remote_name, generation, line_offset);

        state
            .index_for(generation, config.lines_per_batch)
            .push(line_offset, line_offset + record.job_id_offset as u64, record.archive.is_some())?;
        state
            .summary
            .note(record.timestamp, record.size.as_f64(), record.duration, unprintable);
        state.emitted += 1;
        batch.push(row);

        if batch.len() >= config.lines_per_batch {
            flush(state, sink, &mut batch);
            if sink.check_interrupt() {
                return Ok((ScanOutcome::Interrupted, pos + line_len));
            }
        }

        pos += line_len;
    }

    flush(state, sink, &mut batch);
    Ok((ScanOutcome::Completed, pos))
}

/// Hand the pending batch to the sink and refresh its two labels.
fn flush<S: RowSink>(state: &mut QueryState, sink: &mut S, batch: &mut Vec<Row>) {
    if !batch.is_empty() {
        sink.push_batch(std::mem::take(batch));
    }
    sink.publish_summary(&state.summary);
    let indicator = state.next_indicator();
    sink.publish_status(&indicator);
}
