//! CSV manifest handling
//!
//! A manifest is a header row plus ordered data rows. One column (by default
//! `filename`) names members of the source archive.

use crate::error::{Result, SplitError};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

/// Default name of the column holding archive member names
pub const DEFAULT_COLUMN: &str = "filename";

/// Header plus ordered data rows of a CSV manifest.
///
/// Parsing follows the `csv` crate rather than a line-per-row reading: blank
/// lines are skipped and never count as rows, and a leading UTF-8 byte order mark
/// is stripped from the first header name. A manifest with blank lines between
/// rows therefore chunks on its non-blank rows only.
#[derive(Debug, Clone)]
pub struct Manifest {
    header: StringRecord,
    rows: Vec<StringRecord>,
}

impl Manifest {
    /// Load a manifest from disk
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv_reader().from_path(path)?;
        Self::from_csv(reader, path)
    }

    /// Load a manifest from any reader; `origin` is only used in error messages
    pub fn from_reader<R: Read>(rdr: R, origin: &Path) -> Result<Self> {
        Self::from_csv(csv_reader().from_reader(rdr), origin)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, origin: &Path) -> Result<Self> {
        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(SplitError::EmptyManifest(origin.to_path_buf()));
        }

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Manifest { header, rows })
    }

    pub fn header(&self) -> &StringRecord {
        &self.header
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the named column, failing with `MissingColumn` when absent
    pub fn require_column(&self, column: &str) -> Result<usize> {
        column_index(&self.header, column)
            .ok_or_else(|| SplitError::MissingColumn(column.to_string()))
    }
}

/// Set of distinct, trimmed member names requested by one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameSet {
    names: HashSet<String>,
}

impl FilenameSet {
    /// Read the named column of a CSV file into a set.
    ///
    /// Values are whitespace-trimmed and empty values are skipped. Rows too short
    /// to have the column contribute nothing.
    pub fn from_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<Self> {
        let reader = csv_reader().from_path(path)?;
        Self::from_csv_reader(reader, column)
    }

    /// Same as `from_csv`, over any reader
    pub fn from_reader<R: Read>(rdr: R, column: &str) -> Result<Self> {
        Self::from_csv_reader(csv_reader().from_reader(rdr), column)
    }

    fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>, column: &str) -> Result<Self> {
        let index = column_index(reader.headers()?, column)
            .ok_or_else(|| SplitError::MissingColumn(column.to_string()))?;

        let mut names = HashSet::new();
        for record in reader.records() {
            let record = record?;
            if let Some(value) = record.get(index) {
                let name = value.trim();
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
            }
        }

        Ok(FilenameSet { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Write a header and a slice of rows as a CSV file
pub fn write_chunk<P: AsRef<Path>>(path: P, header: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    write_records(csv_writer().from_path(path)?, header, rows)
}

/// Write a header and rows to an arbitrary sink
pub fn write_chunk_to<W: Write>(sink: W, header: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    write_records(csv_writer().from_writer(sink), header, rows)
}

fn write_records<W: Write>(
    mut writer: csv::Writer<W>,
    header: &StringRecord,
    rows: &[StringRecord],
) -> Result<()> {
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Last header position with this name (a repeated header resolves to its final column)
fn column_index(header: &StringRecord, column: &str) -> Option<usize> {
    header
        .iter()
        .enumerate()
        .filter(|(_, h)| *h == column)
        .map(|(i, _)| i)
        .last()
}

fn csv_reader() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn csv_writer() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.flexible(true).terminator(Terminator::CRLF);
    builder
}
