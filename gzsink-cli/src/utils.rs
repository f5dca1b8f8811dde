//! Utility functions for the CLI.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Verbosity of the diagnostic log written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Install the global tracing subscriber. Logs go to stderr so compressed
/// output on stdout stays clean.
pub fn init_tracing(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(level))
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Space saved, as a percentage of the input.
pub fn compression_ratio(uncompressed: u64, compressed: u64) -> f64 {
    if uncompressed == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / uncompressed as f64) * 100.0
}

/// Meaning of a gzip XFL byte.
pub fn describe_xfl(xfl: u8) -> &'static str {
    match xfl {
        2 => "maximum compression",
        4 => "fastest compression",
        0 => "default",
        _ => "unknown",
    }
}

/// Name of a gzip OS byte.
pub fn describe_os(os: u8) -> &'static str {
    match os {
        0 => "FAT",
        3 => "Unix",
        7 => "Macintosh",
        11 => "NTFS",
        255 => "unknown",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MiB");
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio(0, 20), 0.0);
        assert!((compression_ratio(200, 50) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(describe_xfl(2), "maximum compression");
        assert_eq!(describe_os(3), "Unix");
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }
}
