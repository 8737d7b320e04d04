//! Error types for zip-splitter

use std::io;
use std::path::PathBuf;

/// Result type for zip-splitter operations
pub type Result<T> = std::result::Result<T, SplitError>;

/// Which required input file is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The source ZIP archive
    Archive,
    /// The CSV manifest (or a chunk CSV)
    Manifest,
}

/// Error types that can occur while splitting a manifest and filtering archives
#[derive(Debug)]
pub enum SplitError {
    /// I/O error
    Io(io::Error),
    /// CSV parse or write error
    Csv(csv::Error),
    /// Invalid ZIP format or structure
    InvalidFormat(String),
    /// Unsupported compression method
    UnsupportedCompression(u16),
    /// Decompressed member data does not match its recorded CRC-32
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    /// A required input file does not exist
    MissingInput { kind: InputKind, path: PathBuf },
    /// The manifest header lacks the configured filename column
    MissingColumn(String),
    /// The manifest has no header row
    EmptyManifest(PathBuf),
    /// The source archive could not be opened as a ZIP file
    InvalidArchive { path: PathBuf, reason: String },
    /// Chunk size was zero or negative
    InvalidChunkSize(i64),
    /// DEFLATE level outside 0-9
    InvalidCompressionLevel(u32),
    /// A numbered output file would replace one of the inputs
    OutputOverwritesInput(PathBuf),
}

impl std::fmt::Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitError::Io(e) => write!(f, "I/O error: {}", e),
            SplitError::Csv(e) => write!(f, "CSV error: {}", e),
            SplitError::InvalidFormat(msg) => write!(f, "Invalid ZIP format: {}", msg),
            SplitError::UnsupportedCompression(method) => {
                write!(f, "Unsupported compression method: {}", method)
            }
            SplitError::ChecksumMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "CRC-32 mismatch for {}: expected 0x{:08x}, got 0x{:08x}",
                name, expected, actual
            ),
            SplitError::MissingInput { kind, path } => match kind {
                InputKind::Archive => write!(f, "ZIP file not found: {}", path.display()),
                InputKind::Manifest => write!(f, "CSV file not found: {}", path.display()),
            },
            SplitError::MissingColumn(column) => {
                write!(f, "CSV file does not contain column '{}'", column)
            }
            SplitError::EmptyManifest(path) => {
                write!(f, "CSV file has no header row: {}", path.display())
            }
            SplitError::InvalidArchive { path, reason } => {
                write!(f, "{} is not a valid ZIP file: {}", path.display(), reason)
            }
            SplitError::InvalidChunkSize(n) => {
                write!(f, "chunk size must be a positive integer, got {}", n)
            }
            SplitError::InvalidCompressionLevel(level) => {
                write!(f, "compression level must be between 0 and 9, got {}", level)
            }
            SplitError::OutputOverwritesInput(path) => {
                write!(f, "output file {} would overwrite an input file", path.display())
            }
        }
    }
}

impl std::error::Error for SplitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SplitError::Io(e) => Some(e),
            SplitError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SplitError {
    fn from(err: io::Error) -> Self {
        SplitError::Io(err)
    }
}

impl From<csv::Error> for SplitError {
    fn from(err: csv::Error) -> Self {
        SplitError::Csv(err)
    }
}
