//! Read-only access to one log generation.
//!
//! A generation is memory-mapped for scanning and released before the next
//! one is opened. Where mapping fails (network filesystems, zero-length
//! files) the content is read into a heap buffer with the same lifetime.

use crate::error::{CoreError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;
use tracing::debug;

/// The bytes of one log generation.
#[derive(Debug)]
pub enum LogBuffer {
    Mapped(Mmap),
    Heap(Vec<u8>),
}

impl LogBuffer {
    /// Open and map the generation at `path`.
    pub fn load(path: &Path) -> Result<LogBuffer> {
        let mut file = File::open(path).map_err(|source| CoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let len = file
            .metadata()
            .map_err(|source| CoreError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        if len == 0 {
            return Ok(LogBuffer::Heap(Vec::new()));
        }

        // Safety: the mapping is read-only; the logger only ever appends, so
        // the mapped prefix stays stable while we scan it.
        match unsafe { Mmap::map(&file) } {
            Ok(map) => Ok(LogBuffer::Mapped(map)),
            Err(err) => {
                debug!("mmap of {} failed ({}), reading instead", path.display(), err);

                let mut bytes = Vec::with_capacity(len as usize);
                file.read_to_end(&mut bytes)
                    .map_err(|source| CoreError::Open {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(LogBuffer::Heap(bytes))
            }
        }
    }
}

impl Deref for LogBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            LogBuffer::Mapped(map) => map,
            LogBuffer::Heap(bytes) => bytes,
        }
    }
}

impl AsRef<[u8]> for LogBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_file_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("output.log0");
        std::fs::write(&path, b"5f000000|hostA|1 2|foo|\n").unwrap();

        let buffer = LogBuffer::load(&path).unwrap();
        assert_eq!(&buffer[..8], b"5f000000");
        assert_eq!(buffer.len(), 24);
    }

    #[test]
    fn empty_file_yields_empty_buffer() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("output.log0");
        std::fs::write(&path, b"").unwrap();

        let buffer = LogBuffer::load(&path).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(LogBuffer::load(&dir.path().join("absent")).is_err());
    }
}
