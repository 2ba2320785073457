//! CLI tool for splitting a CSV file into fixed-size chunks.
//!
//! # Usage
//!
//! ```bash
//! # Split a file into chunks of 1000 data rows each
//! splitter --input accounts.csv --rows 1000 --output-prefix out/accounts
//!
//! # Read from stdin, write chunks next to the current directory
//! cat accounts.csv | splitter --rows 500 --output-prefix chunk
//!
//! # Semicolon-delimited input without a header row
//! splitter -i data.csv -r 100 -o part --delimiter ';' --no-header
//! ```

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use csvio::parse::Row;
use csvio::reader::CsvReader;
use csvio::settings::CsvSettings;
use csvio::writer::RowWriter;

/// Split a CSV file into numbered chunk files.
///
/// Reads rows from input (file or stdin) and writes them out in
/// chunks of at most `--rows` data rows. When the input carries a
/// header row, it is repeated at the top of every chunk.
#[derive(Parser, Debug)]
#[command(name = "splitter")]
#[command(version, about)]
struct Args {
    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Maximum number of data rows per chunk.
    #[arg(short, long)]
    rows: usize,

    /// Chunk file prefix; chunks are written as `<prefix>.NNNN.csv`.
    #[arg(short, long, default_value = "chunk")]
    output_prefix: PathBuf,

    /// Field delimiter.
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Treat the first row as data instead of a header.
    #[arg(long)]
    no_header: bool,

    /// Tolerate rows with a mismatched column count.
    #[arg(long)]
    ignore_errors: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if args.rows == 0 {
        bail!("--rows must be at least 1");
    }

    let mut settings = CsvSettings::default().with_delimiter(args.delimiter);
    if args.no_header {
        settings = settings.without_header();
    }
    if args.ignore_errors {
        settings = settings.with_ignore_errors();
    }

    // Open input source
    let input: Box<dyn Read> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdin().lock()),
    };

    let (rows, chunks) = split(input, &args.output_prefix, args.rows, settings)?;

    // Report result to stderr (so it doesn't interfere with stdout output)
    eprintln!("Split {rows} row(s) into {chunks} chunk(s)");

    Ok(())
}

/// Streams rows from input into numbered chunk files.
///
/// Returns the number of data rows distributed and the number of
/// chunk files written. Empty input produces no chunks.
fn split<R: Read>(
    input: R,
    prefix: &Path,
    rows_per_chunk: usize,
    settings: CsvSettings,
) -> Result<(usize, usize)> {
    let mut reader = CsvReader::new(input, settings.clone());
    let header: Option<Vec<String>> = reader
        .headers()
        .context("Failed to read input header")?
        .map(<[String]>::to_vec);

    let mut rows = 0usize;
    let mut chunks = 0usize;
    let mut pending: Vec<Row> = Vec::with_capacity(rows_per_chunk);

    for result in reader.by_ref() {
        let row = result.with_context(|| format!("Failed to read row #{}", rows + pending.len() + 1))?;
        pending.push(row);
        if pending.len() == rows_per_chunk {
            chunks += 1;
            write_chunk(&chunk_path(prefix, chunks), header.as_deref(), &pending, &settings)?;
            rows += pending.len();
            pending.clear();
        }
    }

    if !pending.is_empty() {
        chunks += 1;
        write_chunk(&chunk_path(prefix, chunks), header.as_deref(), &pending, &settings)?;
        rows += pending.len();
    }

    Ok((rows, chunks))
}

/// Writes one chunk file, repeating the header when present.
fn write_chunk(
    path: &Path,
    header: Option<&[String]>,
    rows: &[Row],
    settings: &CsvSettings,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create chunk file: {}", path.display()))?;
    let mut writer = RowWriter::new(file, settings.clone());

    if let Some(names) = header {
        writer
            .write_names(names.iter().map(String::as_str))
            .with_context(|| format!("Failed to write header to {}", path.display()))?;
    }
    for row in rows {
        writer
            .write_row(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(())
}

/// Builds the path of chunk `index`: `<prefix>.NNNN.csv`.
fn chunk_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map_or_else(|| OsString::from("chunk"), ToOwned::to_owned);
    name.push(format!(".{index:04}.csv"));
    prefix.with_file_name(name)
}
