//! GzSink CLI - streaming gzip compression
//!
//! Compresses files or stdin through a GzSink write session and inspects the
//! framing of the result.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{CompressOptions, cmd_compress, cmd_inspect};
use gzsink_deflate::backend::{DEFAULT_BLOCK_SIZE, DEFAULT_COMPRESSOR, DEFAULT_THREADS};
use gzsink_gzip::{DEFAULT_BUFFER_CAPACITY, DEFAULT_LOW_WATER_MARK};
use std::path::PathBuf;
use utils::{LogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "gzsink")]
#[command(author, version, about = "Streaming gzip compression over any byte sink")]
#[command(long_about = "
GzSink compresses a byte stream into a single gzip member as it is written,
using a bounded output buffer and a shared deflate worker pool.

Examples:
  gzsink compress access.log
  gzsink compress -l 9 -t 8 dump.sql -o dump.sql.gz
  cat data.bin | gzsink compress > data.bin.gz
  gzsink inspect access.log.gz --json
")]
struct Cli {
    /// Diagnostic log level (written to stderr)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file or stdin into a gzip stream
    #[command(alias = "c")]
    Compress {
        /// Input file (stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Output file (INPUT.gz for files, stdout for stdin; "-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level 0-9 (negative selects the default)
        #[arg(short, long, default_value_t = 6, allow_negative_numbers = true)]
        level: i32,

        /// Worker threads for parallel block compression (1 = single stream)
        #[arg(short, long, default_value_t = DEFAULT_THREADS)]
        threads: usize,

        /// Compressor name
        #[arg(long, default_value = DEFAULT_COMPRESSOR)]
        compressor: String,

        /// Uncompressed bytes per parallel block
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Output buffer capacity in bytes
        #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
        buffer_size: usize,

        /// Flush once free buffer space drops to this many bytes
        #[arg(long, default_value_t = DEFAULT_LOW_WATER_MARK)]
        low_water: usize,

        /// Bytes read from the input per write
        #[arg(long, default_value_t = 64 * 1024)]
        chunk_size: usize,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Print a JSON summary
        #[arg(short, long)]
        json: bool,

        /// Print a human-readable summary
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the header and trailer of a gzip file
    #[command(alias = "i")]
    Inspect {
        /// Gzip file (stdin if omitted or "-")
        file: Option<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            threads,
            compressor,
            block_size,
            buffer_size,
            low_water,
            chunk_size,
            force,
            json,
            verbose,
        } => cmd_compress(&CompressOptions {
            input,
            output,
            level,
            threads,
            compressor,
            block_size,
            buffer_size,
            low_water,
            chunk_size,
            force,
            json,
            verbose,
        }),
        Commands::Inspect { file, json } => cmd_inspect(file.as_ref(), json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
