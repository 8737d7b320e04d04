//! Build a ZIP archive holding only the source members named by a CSV file

use crate::error::{InputKind, Result, SplitError};
use crate::manifest::{FilenameSet, DEFAULT_COLUMN};
use crate::reader::{ArchiveReader, ZipEntry};
use crate::writer::{ArchiveWriter, DEFAULT_COMPRESSION_LEVEL};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings shared by every filter run
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// CSV column holding member names (default: "filename")
    pub column_name: String,
    /// DEFLATE level of the output archive (default: 6)
    pub compression_level: u32,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            column_name: DEFAULT_COLUMN.to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Outcome of one filter run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterReport {
    pub output: PathBuf,
    /// Members written to the output archive
    pub copied: usize,
    /// Distinct names requested by the CSV
    pub requested: usize,
    /// Requested names with no matching member in the source archive
    pub unmatched: usize,
}

/// Copy the members of `source_zip` whose names appear in `csv_path`'s target
/// column into a new archive at `output_zip`.
///
/// Members keep the source archive's order. Names listed in the CSV but absent
/// from the archive are ignored. `progress` is called after each member with
/// `(copied, total)`.
pub fn filter_archive<F>(
    source_zip: &Path,
    csv_path: &Path,
    output_zip: &Path,
    options: &FilterOptions,
    mut progress: F,
) -> Result<FilterReport>
where
    F: FnMut(usize, usize),
{
    ensure_file(source_zip, InputKind::Archive)?;
    ensure_file(csv_path, InputKind::Manifest)?;

    let wanted = FilenameSet::from_csv(csv_path, &options.column_name)?;

    let mut source = ArchiveReader::open(source_zip).map_err(|e| invalid_archive(source_zip, e))?;

    let selected: Vec<ZipEntry> = source
        .entries()
        .iter()
        .filter(|entry| wanted.contains(&entry.name))
        .cloned()
        .collect();

    let matched: HashSet<&str> = selected.iter().map(|e| e.name.as_str()).collect();
    let unmatched = wanted.len() - matched.len();
    if unmatched > 0 {
        debug!(
            csv = %csv_path.display(),
            unmatched,
            "names listed in CSV but not present in source archive"
        );
    }

    let total = selected.len();
    let mut writer = ArchiveWriter::create_with_compression(output_zip, options.compression_level)?;

    for (i, entry) in selected.iter().enumerate() {
        let data = source.read_entry(entry)?;
        writer.add_entry(&entry.name, &data)?;
        debug!(member = %entry.name, bytes = data.len(), "copied member");
        progress(i + 1, total);
    }

    writer.finish()?;

    info!("Created new ZIP file: {}", output_zip.display());
    info!("Number of extracted files: {}", total);

    Ok(FilterReport {
        output: output_zip.to_path_buf(),
        copied: total,
        requested: wanted.len(),
        unmatched,
    })
}

/// Fail with `MissingInput` unless `path` is an existing regular file
pub(crate) fn ensure_file(path: &Path, kind: InputKind) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SplitError::MissingInput {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Format problems while opening the source become `InvalidArchive`; I/O errors pass through
fn invalid_archive(path: &Path, err: SplitError) -> SplitError {
    match err {
        SplitError::InvalidFormat(reason) => SplitError::InvalidArchive {
            path: path.to_path_buf(),
            reason,
        },
        SplitError::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            SplitError::InvalidArchive {
                path: path.to_path_buf(),
                reason: "truncated central directory".to_string(),
            }
        }
        other => other,
    }
}
