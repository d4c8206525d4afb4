//! Log generations and span selection.

use crate::error::{RegistryError, Result};
use dlog_common::Seconds;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One rotated log file together with the stat data span selection needs.
///
/// Index 0 is the generation currently written; higher indices are older.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub index: u32,
    pub path: PathBuf,
    /// Last-modification time: the rotation time for archived generations,
    /// the latest append for the live one.
    pub mtime: Seconds,
    pub size: u64,
    pub ino: u64,
}

impl Generation {
    /// File name of generation `index`.
    pub fn file_name(base: &str, index: u32) -> String {
        format!("{base}{index}")
    }

    /// Stat one generation. Absent files are `Ok(None)`; any other stat
    /// failure is an access error.
    pub fn stat(dir: &Path, base: &str, index: u32) -> Result<Option<Generation>> {
        let path = dir.join(Self::file_name(base, index));

        match std::fs::metadata(&path) {
            Ok(meta) => Ok(Some(Generation {
                index,
                mtime: Seconds(meta.mtime()),
                size: meta.len(),
                ino: meta.ino(),
                path,
            })),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RegistryError::Access { path, source }),
        }
    }
}

/// The generations of one delivery log that are present on disk, ascending
/// by index (newest first).
#[derive(Debug, Default)]
pub struct GenerationSet {
    generations: Vec<Generation>,
}

impl GenerationSet {
    /// Stat generations `0..max_files` under `dir`.
    ///
    /// Missing generations are simply absent from the set; generations that
    /// cannot be stat'ed are logged and skipped so one bad file does not
    /// hide the rest of the ring.
    pub fn discover(dir: &Path, base: &str, max_files: u32) -> Result<GenerationSet> {
        let mut generations = Vec::new();

        for index in 0..max_files {
            match Generation::stat(dir, base, index) {
                Ok(Some(generation)) => generations.push(generation),
                Ok(None) => {}
                Err(err) => warn!("{err}"),
            }
        }

        Ok(GenerationSet { generations })
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Generation> {
        self.generations.iter()
    }

    pub fn get(&self, index: u32) -> Option<&Generation> {
        self.generations.iter().find(|g| g.index == index)
    }

    /// The youngest generation present (the live file, when it exists).
    pub fn newest(&self) -> Option<&Generation> {
        self.generations.first()
    }

    /// Select the generation span `[start_gen, end_gen]` a time window can
    /// touch, where `start_gen >= end_gen` and scanning runs from the old
    /// `start_gen` down to the young `end_gen`.
    ///
    /// The start generation is the oldest one whose mtime plus the rotation
    /// grace still reaches the window start, falling back to the oldest
    /// present generation. The end generation is the oldest one whose mtime
    /// is at or past the window end, or 0 when the end is open.
    pub fn select_span(
        &self,
        start_time: Option<i64>,
        end_time: Option<i64>,
        mtime_grace: i64,
    ) -> Option<(u32, u32)> {
        if self.generations.is_empty() {
            return None;
        }

        let mut start_gen = None;
        for generation in &self.generations {
            match start_time {
                None => start_gen = Some(generation.index),
                Some(t) if generation.mtime.get() + mtime_grace >= t => {
                    start_gen = Some(generation.index)
                }
                Some(_) => {}
            }
        }
        let start_gen =
            start_gen.unwrap_or_else(|| self.generations.last().map(|g| g.index).unwrap_or(0));

        let mut end_gen = 0;
        if let Some(t) = end_time {
            for generation in &self.generations {
                if generation.mtime.get() >= t {
                    end_gen = generation.index;
                }
            }
        }

        Some((start_gen, end_gen))
    }

    /// The generations of a span, oldest (highest index) first.
    pub fn span_oldest_first(
        &self,
        start_gen: u32,
        end_gen: u32,
    ) -> impl Iterator<Item = &Generation> {
        self.generations
            .iter()
            .rev()
            .filter(move |g| g.index <= start_gen && g.index >= end_gen)
    }
}
