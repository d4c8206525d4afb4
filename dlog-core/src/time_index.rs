//! Binary search for a time bound inside a log region.
//!
//! Delivery-log records are appended in timestamp order, so the byte range
//! covering a time window can be found by bisecting the buffer: each probe
//! snaps forward to the next record start and reads the fixed-width hex
//! timestamp there. Comment lines are invisible to the search.

use crate::log_type::LogType;

/// Which side of the window an offset is wanted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    /// Offset of the first record whose timestamp is >= t.
    Lower,
    /// One past the last record whose timestamp is <= t.
    Upper,
}

/// Locate a time bound inside `buf`.
///
/// `first_ts`/`last_ts` are the timestamps of the first and last record of
/// the region; they gate the fast paths. An open bound (`t == -1`) and any
/// `t` past `last_ts` answer with the end of the buffer, a `t` before
/// `first_ts` with its start.
pub fn search_time(
    buf: &[u8],
    bound: TimeBound,
    t: i64,
    first_ts: i64,
    last_ts: i64,
    log_type: &LogType,
) -> usize {
    if t == -1 || t > last_ts {
        return buf.len();
    }
    if t < first_ts {
        return 0;
    }

    let pred = |ts: i64| match bound {
        TimeBound::Lower => ts < t,
        TimeBound::Upper => ts <= t,
    };

    let mut lo = 0usize;
    let mut hi = buf.len();
    let mut answer = buf.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;

        match next_record_start(buf, mid, hi, log_type) {
            // No record begins in [mid, hi); the bound lies below mid.
            None => hi = mid,
            Some((start, ts)) => {
                if pred(ts) {
                    lo = end_of_line(buf, start);
                } else {
                    answer = start;
                    hi = start;
                }
            }
        }
    }

    answer
}

/// Timestamp of the first record of the region, skipping comments.
pub fn first_timestamp(buf: &[u8], log_type: &LogType) -> Option<i64> {
    next_record_start(buf, 0, buf.len(), log_type).map(|(_, ts)| ts)
}

/// Timestamp of the last record of the region, skipping comments.
pub fn last_timestamp(buf: &[u8], log_type: &LogType) -> Option<i64> {
    let mut end = buf.len();

    loop {
        let line_end = if end > 0 && buf[end - 1] == b'\n' {
            end - 1
        } else {
            end
        };
        if line_end == 0 {
            return None;
        }

        let start = buf[..line_end]
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let line = &buf[start..line_end];

        if !line.is_empty() && line[0] != b'#' {
            if let Some(ts) = read_timestamp(line, log_type) {
                return Some(ts);
            }
        }

        if start == 0 {
            return None;
        }
        end = start;
    }
}

/// First record start at or after `pos` (strictly before `limit`), together
/// with its timestamp. Comment lines and lines without a readable timestamp
/// are stepped over.
fn next_record_start(
    buf: &[u8],
    pos: usize,
    limit: usize,
    log_type: &LogType,
) -> Option<(usize, i64)> {
    let mut candidate = if pos == 0 || buf[pos - 1] == b'\n' {
        pos
    } else {
        let nl = buf[pos..limit].iter().position(|&b| b == b'\n')?;
        pos + nl + 1
    };

    while candidate < limit {
        let line_end = buf[candidate..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buf.len(), |nl| candidate + nl);

        if buf[candidate] != b'#' {
            if let Some(ts) = read_timestamp(&buf[candidate..line_end], log_type) {
                return Some((candidate, ts));
            }
        }

        candidate = line_end + 1;
    }

    None
}

/// Offset just past the newline terminating the line at `start`.
fn end_of_line(buf: &[u8], start: usize) -> usize {
    buf[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(buf.len(), |nl| start + nl + 1)
}

fn read_timestamp(line: &[u8], log_type: &LogType) -> Option<i64> {
    let field = line.get(..log_type.date_width)?;
    let trimmed = {
        let start = field.iter().position(|&b| b != b' ')?;
        let end = field.iter().rposition(|&b| b != b' ')? + 1;
        &field[start..end]
    };

    if !trimmed.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    i64::from_str_radix(std::str::from_utf8(trimmed).ok()?, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_type() -> LogType {
        LogType::new(b'|', 8, 5)
    }

    /// Region with timestamps 0x10, 0x20, 0x20, 0x30 and interleaved
    /// comments, returning the buffer plus each record's start offset.
    fn corpus() -> (Vec<u8>, Vec<usize>) {
        let mut buf = Vec::new();
        let mut starts = Vec::new();

        buf.extend_from_slice(b"# header\n#!# 2 8 5\n");
        for ts in [0x10u32, 0x20, 0x20, 0x30] {
            if ts == 0x20 {
                buf.extend_from_slice(b"# noise\n");
            }
            starts.push(buf.len());
            buf.extend_from_slice(format!("{:08x}|hostA|1 2|f|  |1|0.1|f|\n", ts).as_bytes());
        }

        (buf, starts)
    }

    fn search(buf: &[u8], bound: TimeBound, t: i64) -> usize {
        search_time(buf, bound, t, 0x10, 0x30, &log_type())
    }

    #[test]
    fn bounds_of_duplicate_timestamps() {
        let (buf, starts) = corpus();

        assert_eq!(search(&buf, TimeBound::Lower, 0x20), starts[1]);
        assert_eq!(search(&buf, TimeBound::Upper, 0x20), starts[3]);
    }

    #[test]
    fn bounds_between_timestamps() {
        let (buf, starts) = corpus();

        assert_eq!(search(&buf, TimeBound::Lower, 0x11), starts[1]);
        assert_eq!(search(&buf, TimeBound::Upper, 0x11), starts[1]);
        assert_eq!(search(&buf, TimeBound::Lower, 0x30), starts[3]);
        assert_eq!(search(&buf, TimeBound::Upper, 0x2f), starts[3]);
    }

    #[test]
    fn out_of_range_and_open_bounds() {
        let (buf, _) = corpus();

        assert_eq!(search(&buf, TimeBound::Lower, 0x0f), 0);
        assert_eq!(search(&buf, TimeBound::Upper, 0x31), buf.len());
        assert_eq!(search(&buf, TimeBound::Upper, -1), buf.len());
    }

    #[test]
    fn first_and_last_timestamps_skip_comments() {
        let (buf, _) = corpus();

        assert_eq!(first_timestamp(&buf, &log_type()), Some(0x10));
        assert_eq!(last_timestamp(&buf, &log_type()), Some(0x30));
    }

    #[test]
    fn comment_only_region_has_no_timestamps() {
        let buf = b"# one\n# two\n";

        assert_eq!(first_timestamp(buf, &log_type()), None);
        assert_eq!(last_timestamp(buf, &log_type()), None);
    }

    #[test]
    fn window_round_trip_covers_exactly_the_window() {
        let (buf, starts) = corpus();

        let lo = search(&buf, TimeBound::Lower, 0x20);
        let hi = search(&buf, TimeBound::Upper, 0x20);
        let window = &buf[lo..hi];

        assert!(window.starts_with(b"00000020|"));
        assert!(window.ends_with(b"0.1|f|\n"));
        assert_eq!(lo, starts[1]);
        assert_eq!(hi, starts[3]);
    }
}
