//! # zip-splitter: Partition a CSV manifest and its ZIP archive into numbered pairs
//!
//! Splits a CSV manifest into chunks of at most N data rows (`1.csv`, `2.csv`, ...)
//! and, for each chunk, builds a ZIP archive (`1.zip`, `2.zip`, ...) holding only the
//! members of a larger source archive named in the chunk's filename column.
//!
//! ## Quick Start
//!
//! ### Running the whole split
//!
//! ```no_run
//! use zip_splitter::{run, NoProgress, SplitConfig};
//!
//! let config = SplitConfig::new("source.zip", "files.csv", 500)
//!     .with_column_name("filename")
//!     .with_output_dir("out");
//!
//! let summary = run(&config, NoProgress)?;
//! println!("created {} pairs", summary.pairs());
//! # Ok::<(), zip_splitter::SplitError>(())
//! ```
//!
//! ### Filtering a single archive
//!
//! ```no_run
//! use std::path::Path;
//! use zip_splitter::{filter_archive, FilterOptions};
//!
//! let report = filter_archive(
//!     Path::new("source.zip"),
//!     Path::new("subset.csv"),
//!     Path::new("subset.zip"),
//!     &FilterOptions::default(),
//!     |copied, total| eprintln!("{}/{}", copied, total),
//! )?;
//! println!("{} members copied", report.copied);
//! # Ok::<(), zip_splitter::SplitError>(())
//! ```
//!
//! ### Reading and writing archives directly
//!
//! ```no_run
//! use zip_splitter::{ArchiveReader, ArchiveWriter, DEFAULT_COMPRESSION_LEVEL};
//!
//! let mut reader = ArchiveReader::open("source.zip")?;
//! let mut writer = ArchiveWriter::create_with_compression("copy.zip", DEFAULT_COMPRESSION_LEVEL)?;
//! for entry in reader.entries().to_vec() {
//!     let data = reader.read_entry(&entry)?;
//!     writer.add_entry(&entry.name, &data)?;
//! }
//! writer.finish()?;
//! # Ok::<(), zip_splitter::SplitError>(())
//! ```

pub mod chunk;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use chunk::{chunk_count, chunk_ranges, split_rows, Chunk, ChunkSize};
pub use error::{InputKind, Result, SplitError};
pub use filter::{filter_archive, FilterOptions, FilterReport};
pub use manifest::{FilenameSet, Manifest, DEFAULT_COLUMN};
pub use pipeline::{run, ChunkOutput, NoProgress, Progress, RunSummary, SplitConfig};
pub use reader::{ArchiveReader, ZipEntry};
pub use writer::{ArchiveWriter, DEFAULT_COMPRESSION_LEVEL};
