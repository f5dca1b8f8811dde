//! Compress command implementation.

use crate::utils::{compression_ratio, format_size};
use gzsink_core::{ChildWriter, CompressionLevel, GzSinkError};
use gzsink_deflate::BackendConfig;
use gzsink_gzip::{CloseSummary, GzipSink, GzipSinkConfig, IoChild};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings collected from the command line.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub level: i32,
    pub threads: usize,
    pub compressor: String,
    pub block_size: usize,
    pub buffer_size: usize,
    pub low_water: usize,
    pub chunk_size: usize,
    pub force: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Machine-readable result of one compression run.
#[derive(Debug, Serialize)]
struct CompressReport {
    input: String,
    output: String,
    level: u8,
    threads: usize,
    crc32: String,
    uncompressed_bytes: u64,
    compressed_bytes: u64,
    ratio: f64,
}

enum Endpoint {
    Std,
    File(PathBuf),
}

impl Endpoint {
    fn from_arg(path: Option<&Path>) -> Self {
        match path {
            None => Self::Std,
            Some(p) if p.as_os_str() == "-" => Self::Std,
            Some(p) => Self::File(p.to_path_buf()),
        }
    }

    fn label(&self, std_name: &str) -> String {
        match self {
            Self::Std => std_name.to_string(),
            Self::File(p) => p.display().to_string(),
        }
    }
}

/// Build the session configuration from CLI options.
pub fn session_config(opts: &CompressOptions) -> GzipSinkConfig {
    GzipSinkConfig::default()
        .level(CompressionLevel::from_signed(opts.level))
        .buffer_capacity(opts.buffer_size)
        .low_water_mark(opts.low_water)
        .backend(
            BackendConfig::default()
                .threads(opts.threads)
                .compressor(opts.compressor.clone())
                .block_size(opts.block_size),
        )
}

/// Stream everything from `reader` through a gzip session into `writer`.
pub fn compress_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: W,
    config: GzipSinkConfig,
    chunk_size: usize,
) -> Result<CloseSummary, GzSinkError> {
    let mut sink = GzipSink::open(IoChild::new(writer), config)?;

    if let Err(e) = pump(reader, &mut sink, chunk_size) {
        // The session is torn down here rather than on drop so the close
        // failure is reported next to the one that stopped the stream.
        if let Err(close_err) = sink.finish() {
            warn!(error = %close_err, "closing failed session also failed");
        }
        return Err(e);
    }

    sink.mark_eof();
    sink.finish()
}

fn pump<R: Read, C: ChildWriter>(
    reader: &mut R,
    sink: &mut GzipSink<C>,
    chunk_size: usize,
) -> Result<(), GzSinkError> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        sink.write_all(&buf[..n])?;
    }
}

pub fn cmd_compress(opts: &CompressOptions) -> Result<(), Box<dyn std::error::Error>> {
    let input = Endpoint::from_arg(opts.input.as_deref());
    let output = match (&opts.output, &input) {
        (Some(path), _) => Endpoint::from_arg(Some(path.as_path())),
        (None, Endpoint::File(path)) => Endpoint::File(default_output_path(path)),
        (None, Endpoint::Std) => Endpoint::Std,
    };

    if let Endpoint::File(path) = &output {
        if path.exists() && !opts.force {
            return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
        }
    }

    let config = session_config(opts);
    let level = config.level.level();
    debug!(?config, "starting compression");

    let mut reader: Box<dyn Read> = match &input {
        Endpoint::Std => Box::new(io::stdin().lock()),
        Endpoint::File(path) => Box::new(BufReader::new(File::open(path)?)),
    };

    let summary = match &output {
        Endpoint::Std => compress_stream(&mut reader, io::stdout().lock(), config, opts.chunk_size)?,
        Endpoint::File(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            compress_stream(&mut reader, BufWriter::new(file), config, opts.chunk_size)?
        }
    };

    info!(
        crc = format_args!("{:08x}", summary.crc),
        uncompressed = summary.uncompressed_bytes,
        compressed = summary.compressed_bytes,
        "compression finished"
    );

    let report = CompressReport {
        input: input.label("<stdin>"),
        output: output.label("<stdout>"),
        level,
        threads: opts.threads,
        crc32: format!("{:08x}", summary.crc),
        uncompressed_bytes: summary.uncompressed_bytes,
        compressed_bytes: summary.compressed_bytes,
        ratio: compression_ratio(summary.uncompressed_bytes, summary.compressed_bytes),
    };

    // Compressed data may own stdout.
    let mut out: Box<dyn Write> = match output {
        Endpoint::Std => Box::new(io::stderr()),
        Endpoint::File(_) => Box::new(io::stdout()),
    };

    if opts.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if opts.verbose {
        writeln!(out, "{} -> {}", report.input, report.output)?;
        writeln!(out, "  Level: {}", report.level)?;
        writeln!(out, "  CRC-32: {}", report.crc32)?;
        writeln!(
            out,
            "  Size: {} -> {} ({:.1}% saved)",
            format_size(report.uncompressed_bytes),
            format_size(report.compressed_bytes),
            report.ratio
        )?;
    }

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}
