//! Core traits for compressing write sessions.
//!
//! Three contracts meet in a session:
//!
//! - [`ChildWriter`]: the downstream sink that receives compressed bytes
//! - [`Compressor`]: the streaming codec that turns raw bytes into a body
//! - [`WriteSource`]: the face a session shows to the framework driving it

use crate::error::Result;
use std::io;

/// Status of a streaming compression operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressStatus {
    /// More input data can be accepted.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// Compression is complete.
    Done,
}

/// Flush mode for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// No flush - buffer data for best compression.
    #[default]
    None,
    /// Sync flush - emit all pending output on a byte boundary.
    Sync,
    /// Finish - complete the stream.
    Finish,
}

/// A streaming compressor (encoder).
///
/// Implementations write into caller-provided output slices and report how
/// far they got, so the caller decides when output space is recycled.
pub trait Compressor {
    /// Compress data from input to output.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, CompressStatus)>;

    /// Reset the compressor to its initial state.
    fn reset(&mut self);

    /// Check if the compressor has finished.
    fn is_finished(&self) -> bool;
}

impl<T: Compressor + ?Sized> Compressor for Box<T> {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, CompressStatus)> {
        (**self).compress(input, output, flush)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// Downstream byte sink owned by a session.
///
/// `write` reports how many bytes the sink accepted. A session treats
/// `Ok(0)`, an error, or fewer bytes than offered as a failed write; it never
/// retries. `destroy` is called exactly once, when the owning session closes.
pub trait ChildWriter {
    /// Hand bytes to the sink.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Tear the sink down (flush and release whatever it holds).
    fn destroy(&mut self) -> io::Result<()>;
}

impl<T: ChildWriter + ?Sized> ChildWriter for Box<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn destroy(&mut self) -> io::Result<()> {
        (**self).destroy()
    }
}

/// The write-source capability a framework drives polymorphically.
///
/// `write` returns the number of bytes consumed, `0` once the stream has
/// reached end-of-stream, and a negative value after a failure. `close`
/// never reports errors; implementations log them.
pub trait WriteSource {
    /// Short identifier of the source.
    fn name(&self) -> &'static str;

    /// Push raw bytes through the source.
    fn write(&mut self, data: &[u8]) -> i64;

    /// Finalize the stream and release everything the source owns.
    fn close(self: Box<Self>);
}

/// Compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No compression (store only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a custom compression level (0-9).
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Map a signed level from a C-style interface. Negative values pick the
    /// default, values above 9 clamp to 9.
    pub fn from_signed(level: i32) -> Self {
        if level < 0 {
            Self::DEFAULT
        } else {
            Self::new(level.min(9) as u8)
        }
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::NONE.level(), 0);
        assert_eq!(CompressionLevel::FAST.level(), 1);
        assert_eq!(CompressionLevel::DEFAULT.level(), 6);
        assert_eq!(CompressionLevel::BEST.level(), 9);

        // Test clamping
        assert_eq!(CompressionLevel::new(100).level(), 9);
    }

    #[test]
    fn test_compression_level_from_signed() {
        assert_eq!(CompressionLevel::from_signed(-1), CompressionLevel::DEFAULT);
        assert_eq!(CompressionLevel::from_signed(1).level(), 1);
        assert_eq!(CompressionLevel::from_signed(42).level(), 9);
    }

    #[test]
    fn test_flush_mode_default() {
        assert_eq!(FlushMode::default(), FlushMode::None);
    }

    struct CountingChild {
        bytes: usize,
        destroyed: bool,
    }

    impl ChildWriter for CountingChild {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes += buf.len();
            Ok(buf.len())
        }

        fn destroy(&mut self) -> io::Result<()> {
            self.destroyed = true;
            Ok(())
        }
    }

    #[test]
    fn test_boxed_child_forwards() {
        let mut child: Box<CountingChild> = Box::new(CountingChild {
            bytes: 0,
            destroyed: false,
        });
        assert_eq!(ChildWriter::write(&mut child, b"abc").unwrap(), 3);
        child.destroy().unwrap();
        assert_eq!(child.bytes, 3);
        assert!(child.destroyed);
    }
}
