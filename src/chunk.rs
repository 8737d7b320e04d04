//! Fixed-size chunking of manifest rows

use crate::error::{Result, SplitError};
use csv::StringRecord;
use std::num::NonZeroUsize;
use std::ops::Range;

/// Validated maximum number of data rows per chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub fn new(n: i64) -> Result<Self> {
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(ChunkSize)
            .ok_or(SplitError::InvalidChunkSize(n))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for ChunkSize {
    fn from(n: NonZeroUsize) -> Self {
        ChunkSize(n)
    }
}

/// One slice of manifest rows, numbered from 1
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub index: usize,
    pub rows: &'a [StringRecord],
}

impl Chunk<'_> {
    pub fn csv_name(&self) -> String {
        format!("{}.csv", self.index)
    }

    pub fn zip_name(&self) -> String {
        format!("{}.zip", self.index)
    }
}

/// Number of chunks needed for `total` rows: `ceil(total / n)`
pub fn chunk_count(total: usize, n: ChunkSize) -> usize {
    total.div_ceil(n.get())
}

/// Row ranges `[(i-1)*n, min(i*n, total))` for i in `1..=chunk_count`
pub fn chunk_ranges(total: usize, n: ChunkSize) -> impl Iterator<Item = Range<usize>> {
    let n = n.get();
    (0..total.div_ceil(n)).map(move |i| {
        let start = i * n;
        start..(start + n).min(total)
    })
}

/// Split rows into ordered chunks of at most `n` rows
pub fn split_rows(rows: &[StringRecord], n: ChunkSize) -> impl Iterator<Item = Chunk<'_>> {
    chunk_ranges(rows.len(), n)
        .enumerate()
        .map(move |(i, range)| Chunk {
            index: i + 1,
            rows: &rows[range],
        })
}
