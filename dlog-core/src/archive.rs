//! Archive-status interpretation.
//!
//! An archived delivery carries the path of its archive copy. The directory
//! segment at [`ARCHIVE_SUB_DIR_LEVEL`] starts with the hex expiry time of
//! that copy, terminated by `_`. Comparing the expiry against the wall
//! clock yields the one-character status rendered in the archive column.

use crate::record::Outcome;

/// Directory depth of the path segment that carries the expiry time.
pub const ARCHIVE_SUB_DIR_LEVEL: usize = 1;

/// Seconds past the expiry time after which the archive copy is assumed to
/// have been purged already.
pub const DEFAULT_EXPIRY_GRACE: i64 = 3600;

/// One-character archive status of a record.
///
/// - `'Y'` archived and still present
/// - `'?'` archived but about to expire
/// - `'D'` archived but already purged
/// - `'N'` delivered without archiving, `'*'` received
/// - `'d'`/`'r'`/`'R'`/`'t'` the confirmation kinds
pub fn archive_status(
    archive: Option<&[u8]>,
    outcome: Outcome,
    now: i64,
    expiry_grace: i64,
) -> char {
    let Some(path) = archive else {
        if let Some(c) = outcome.confirmation_char() {
            return c;
        }
        return if outcome.is_received() { '*' } else { 'N' };
    };

    // An unparseable expiry reads as the epoch, which renders as purged.
    let expiry = parse_expiry(path).unwrap_or(0);

    if now > expiry + expiry_grace {
        'D'
    } else if now > expiry - 5 {
        '?'
    } else {
        'Y'
    }
}

/// Extract the hex expiry time from the archive path.
fn parse_expiry(path: &[u8]) -> Option<i64> {
    let segment = segment_at(path, ARCHIVE_SUB_DIR_LEVEL)?;
    let hex_end = segment.iter().position(|&b| b == b'_')?;
    let text = std::str::from_utf8(&segment[..hex_end]).ok()?;

    if text.is_empty() {
        return None;
    }
    i64::from_str_radix(text, 16).ok()
}

/// The `/`-separated segment at the given depth, honouring `\`-escapes.
fn segment_at(path: &[u8], depth: usize) -> Option<&[u8]> {
    let mut level = 0;
    let mut start = 0;
    let mut i = 0;

    while i < path.len() {
        match path[i] {
            b'\\' => i += 1, // skip the escaped byte
            b'/' => {
                if level == depth {
                    return Some(&path[start..i]);
                }
                level += 1;
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    (level == depth).then(|| &path[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: i64 = 3600;

    #[test]
    fn present_expiring_and_purged() {
        let path = Some(&b"arch/5f0a0000_1"[..]);
        let expiry = 0x5f0a0000;

        let status = |now| archive_status(path, Outcome::NormalDelivered, now, GRACE);

        assert_eq!(status(expiry - 100), 'Y');
        assert_eq!(status(expiry - 5), 'Y');
        assert_eq!(status(expiry - 4), '?');
        assert_eq!(status(expiry + GRACE), '?');
        assert_eq!(status(expiry + GRACE + 1), 'D');
    }

    #[test]
    fn missing_archive_renders_by_outcome() {
        assert_eq!(archive_status(None, Outcome::NormalDelivered, 0, GRACE), 'N');
        assert_eq!(archive_status(None, Outcome::NormalReceived, 0, GRACE), '*');
        assert_eq!(archive_status(None, Outcome::ConfOfDispatch, 0, GRACE), 'd');
        assert_eq!(archive_status(None, Outcome::ConfOfReceipt, 0, GRACE), 'r');
        assert_eq!(archive_status(None, Outcome::ConfOfRetrieve, 0, GRACE), 'R');
        assert_eq!(archive_status(None, Outcome::ConfTimeup, 0, GRACE), 't');
    }

    #[test]
    fn deeper_paths_use_the_configured_level() {
        let path = Some(&b"host/5f0a0000_22/some/file"[..]);
        assert_eq!(
            archive_status(path, Outcome::NormalDelivered, 0x5f0a0000 - 100, GRACE),
            'Y'
        );
    }

    #[test]
    fn escaped_slashes_do_not_count() {
        let segment = segment_at(br"we\/ird/5f000000_0/x", 1).unwrap();
        assert_eq!(segment, b"5f000000_0");
    }

    #[test]
    fn unparseable_expiry_reads_as_purged() {
        let path = Some(&b"arch/no-expiry-here"[..]);
        assert_eq!(
            archive_status(path, Outcome::NormalDelivered, GRACE + 100, GRACE),
            'D'
        );
    }
}
