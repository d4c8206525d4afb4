//! Tail-follow over the live generation.
//!
//! While a query's end is open the live generation keeps growing. The
//! follower holds its own descriptor with its own read cursor, separate
//! from the mapping the historical pass used, and is polled on a timer.
//! Each tick compares the inode behind the file name with the inode held:
//! a mismatch means the log rotated underneath us. Bytes that reached the
//! old inode after our last read are drained from the still-open descriptor
//! first; only then does the driver restart the query against the new ring.

use crate::error::Result;
use std::fs::File;
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What one poll of the live generation found.
#[derive(Debug)]
pub(crate) enum Tick {
    /// New bytes to scan. `old_inode` marks a delta drained from a rotated-
    /// away file.
    Delta {
        bytes: Vec<u8>,
        base_offset: u64,
        old_inode: bool,
    },
    /// The ring changed in a way a delta cannot express; rerun the query.
    Rediscover,
    /// Nothing new.
    Waiting,
}

/// Read cursor over the live generation.
#[derive(Debug)]
pub(crate) struct Follower {
    path: PathBuf,
    file: File,
    offset: u64,
    ino: u64,
}

impl Follower {
    /// Open the live generation, starting to read at `offset` (the end of
    /// what the historical pass consumed).
    pub(crate) fn open(path: &Path, offset: u64) -> Result<Follower> {
        let file = File::open(path)?;
        let ino = file.metadata()?.ino();

        Ok(Follower {
            path: path.to_path_buf(),
            file,
            offset,
            ino,
        })
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Poll once.
    pub(crate) fn tick(&mut self) -> Result<Tick> {
        let current = match std::fs::metadata(&self.path) {
            Ok(meta) => meta,
            // Mid-rotation the name can be briefly absent.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Tick::Waiting),
            Err(err) => return Err(err.into()),
        };

        if current.ino() != self.ino {
            // Rotated. Drain whatever still reached the old inode before
            // letting go of it.
            let held = self.file.metadata()?;
            if held.len() > self.offset {
                debug!(
                    "draining {} bytes left on rotated-away inode {}",
                    held.len() - self.offset,
                    self.ino
                );
                let bytes = self.read_delta(held.len())?;
                return Ok(Tick::Delta {
                    bytes,
                    base_offset: self.offset,
                    old_inode: true,
                });
            }
            return Ok(Tick::Rediscover);
        }

        if current.len() > self.offset {
            let bytes = self.read_delta(current.len())?;
            return Ok(Tick::Delta {
                bytes,
                base_offset: self.offset,
                old_inode: false,
            });
        }

        if current.len() < self.offset {
            // Truncated in place; our cursor points past the end.
            return Ok(Tick::Rediscover);
        }

        Ok(Tick::Waiting)
    }

    /// Move the cursor past the bytes a scan actually consumed.
    pub(crate) fn advance(&mut self, consumed: usize) {
        self.offset += consumed as u64;
    }

    fn read_delta(&self, end: u64) -> Result<Vec<u8>> {
        let len = (end - self.offset) as usize;
        let mut bytes = vec![0u8; len];
        let mut filled = 0usize;

        while filled < len {
            let n = self
                .file
                .read_at(&mut bytes[filled..], self.offset + filled as u64)?;
            if n == 0 {
                bytes.truncate(filled);
                break;
            }
            filled += n;
        }

        Ok(bytes)
    }
}
