//! Split-then-filter driver
//!
//! Each chunk is written as `<i>.csv` and immediately paired with `<i>.zip`
//! before the next chunk starts. The first failure ends the run.

use crate::chunk::{chunk_count, split_rows, ChunkSize};
use crate::error::{InputKind, Result, SplitError};
use crate::filter::{ensure_file, filter_archive, FilterOptions, FilterReport};
use crate::manifest::{self, Manifest, DEFAULT_COLUMN};
use crate::writer::{compression_from_level, DEFAULT_COMPRESSION_LEVEL};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration for one split run
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Source archive to select members from
    pub source_zip: PathBuf,
    /// Full manifest CSV
    pub csv_file: PathBuf,
    /// Maximum data rows per chunk; must be positive
    pub chunk_size: i64,
    /// Column holding member names (default: "filename")
    pub column_name: String,
    /// Directory receiving the numbered CSV/ZIP pairs (default: ".")
    pub output_dir: PathBuf,
    /// DEFLATE level for output archives (default: 6)
    pub compression_level: u32,
}

impl SplitConfig {
    pub fn new(source_zip: impl Into<PathBuf>, csv_file: impl Into<PathBuf>, chunk_size: i64) -> Self {
        Self {
            source_zip: source_zip.into(),
            csv_file: csv_file.into(),
            chunk_size,
            column_name: DEFAULT_COLUMN.to_string(),
            output_dir: PathBuf::from("."),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Set the filename column
    pub fn with_column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = column.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the DEFLATE level of output archives
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            column_name: self.column_name.clone(),
            compression_level: self.compression_level,
        }
    }
}

/// One produced CSV/ZIP pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub index: usize,
    pub csv_path: PathBuf,
    pub rows: usize,
    pub archive: FilterReport,
}

/// Result of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: Vec<ChunkOutput>,
}

impl RunSummary {
    /// Number of CSV/ZIP pairs created
    pub fn pairs(&self) -> usize {
        self.chunks.len()
    }

    /// Total members written across all archives
    pub fn members_copied(&self) -> usize {
        self.chunks.iter().map(|c| c.archive.copied).sum()
    }
}

/// Per-member progress: chunk index, members copied so far, members to copy
pub trait Progress {
    fn member_copied(&mut self, chunk: usize, copied: usize, total: usize);
}

impl<F: FnMut(usize, usize, usize)> Progress for F {
    fn member_copied(&mut self, chunk: usize, copied: usize, total: usize) {
        self(chunk, copied, total)
    }
}

/// Progress sink that reports nothing
pub struct NoProgress;

impl Progress for NoProgress {
    fn member_copied(&mut self, _chunk: usize, _copied: usize, _total: usize) {}
}

/// Validate inputs, split the manifest and build one filtered archive per chunk
pub fn run<P: Progress>(config: &SplitConfig, mut progress: P) -> Result<RunSummary> {
    let chunk_size = ChunkSize::new(config.chunk_size)?;
    compression_from_level(config.compression_level)?;

    ensure_file(&config.source_zip, InputKind::Archive)?;
    ensure_file(&config.csv_file, InputKind::Manifest)?;

    let manifest = Manifest::read(&config.csv_file)?;
    manifest.require_column(&config.column_name)?;
    check_outputs_spare_inputs(config, chunk_count(manifest.len(), chunk_size))?;

    info!(
        manifest = %config.csv_file.display(),
        rows = manifest.len(),
        chunk_size = chunk_size.get(),
        "Splitting manifest"
    );

    prepare_output_dir(&config.output_dir)?;

    let options = config.filter_options();
    let mut summary = RunSummary::default();

    for chunk in split_rows(manifest.rows(), chunk_size) {
        let csv_path = config.output_dir.join(chunk.csv_name());
        let zip_path = config.output_dir.join(chunk.zip_name());

        manifest::write_chunk(&csv_path, manifest.header(), chunk.rows)?;
        debug!(chunk = chunk.index, rows = chunk.rows.len(), path = %csv_path.display(), "wrote chunk CSV");

        let index = chunk.index;
        let archive = filter_archive(&config.source_zip, &csv_path, &zip_path, &options, |copied, total| {
            progress.member_copied(index, copied, total)
        })?;

        summary.chunks.push(ChunkOutput {
            index,
            csv_path,
            rows: chunk.rows.len(),
            archive,
        });
    }

    info!("Created {} pairs of CSV and ZIP files.", summary.pairs());
    Ok(summary)
}

/// Fail when one of the numbered outputs would land on an input file
fn check_outputs_spare_inputs(config: &SplitConfig, chunks: usize) -> Result<()> {
    let dir = if config.output_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        config.output_dir.as_path()
    };
    // A directory that does not exist yet holds no inputs
    let dir = match fs::canonicalize(dir) {
        Ok(dir) => dir,
        Err(_) => return Ok(()),
    };

    for input in [&config.source_zip, &config.csv_file] {
        let input = fs::canonicalize(input)?;
        if input.parent() != Some(dir.as_path()) {
            continue;
        }
        let name = match input.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let stem = match name.strip_suffix(".csv").or_else(|| name.strip_suffix(".zip")) {
            Some(stem) => stem,
            None => continue,
        };
        let numbered = stem
            .parse::<usize>()
            .is_ok_and(|i| (1..=chunks).contains(&i) && i.to_string() == stem);
        if numbered {
            return Err(SplitError::OutputOverwritesInput(dir.join(name)));
        }
    }
    Ok(())
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.is_dir() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
