//! CLI binary for zip-splitter.

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;
use zip_splitter::{run, Progress, SplitConfig, DEFAULT_COLUMN};

/// Creates multiple ZIP files containing only selected files from split CSV.
#[derive(Parser, Debug)]
#[command(name = "zip-splitter", version)]
#[command(about = "Creates multiple ZIP files containing only selected files from split CSV")]
struct Args {
    /// Path to the source ZIP file (e.g., source.zip)
    #[arg(long = "source_zip")]
    source_zip: PathBuf,

    /// Path to the CSV file with list of files (e.g., files_to_extract.csv)
    #[arg(long = "csv_file")]
    csv_file: PathBuf,

    /// The name of the CSV column containing the filenames
    #[arg(long = "column_name", default_value = DEFAULT_COLUMN)]
    column_name: String,

    /// Maximum number of rows (excluding header) in each split CSV file
    #[arg(long = "n", allow_negative_numbers = true)]
    n: i64,

    /// Directory for the numbered CSV and ZIP files
    #[arg(long = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// DEFLATE level for output archives
    #[arg(
        long = "compression_level",
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    compression_level: u32,

    /// Log every copied member
    #[arg(long)]
    verbose: bool,
}

/// Logs `Copying files: k/total` for each member of the current chunk
struct LogProgress;

impl Progress for LogProgress {
    fn member_copied(&mut self, chunk: usize, copied: usize, total: usize) {
        info!(chunk, "Copying files: {}/{}", copied, total);
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {}", e);
    }

    debug!(?args, "parsed arguments");

    let config = SplitConfig::new(args.source_zip, args.csv_file, args.n)
        .with_column_name(args.column_name)
        .with_output_dir(args.output_dir)
        .with_compression_level(args.compression_level);

    if let Err(e) = run(&config, LogProgress) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}
