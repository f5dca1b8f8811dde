//! Single-stream raw deflate codec.

use flate2::{Compress, Compression, FlushCompress, Status};
use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::{CompressStatus, CompressionLevel, Compressor, FlushMode};

/// Streaming raw-deflate compressor (no zlib or gzip wrapper).
pub struct DeflateCodec {
    inner: Compress,
    level: CompressionLevel,
    finished: bool,
}

impl DeflateCodec {
    /// Create a codec at the given level.
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            inner: Compress::new(Compression::new(level.level() as u32), false),
            level,
            finished: false,
        }
    }

    /// Level this codec compresses at.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Total bytes consumed since creation or the last reset.
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Total bytes produced since creation or the last reset.
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}

pub(crate) fn flate_flush(flush: FlushMode) -> FlushCompress {
    match flush {
        FlushMode::None => FlushCompress::None,
        FlushMode::Sync => FlushCompress::Sync,
        FlushMode::Finish => FlushCompress::Finish,
    }
}

impl Compressor for DeflateCodec {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, CompressStatus)> {
        if self.finished {
            return Ok((0, 0, CompressStatus::Done));
        }

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();

        let status = self
            .inner
            .compress(input, output, flate_flush(flush))
            .map_err(|e| GzSinkError::backend(format!("deflate: {}", e)))?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;

        let status = match status {
            Status::StreamEnd => {
                self.finished = true;
                CompressStatus::Done
            }
            // zlib only reports a completed finish as StreamEnd; anything
            // else during Finish still has output queued.
            _ if flush == FlushMode::Finish => CompressStatus::NeedsOutput,
            _ if produced == output.len() => CompressStatus::NeedsOutput,
            // BufError with room left means nothing was pending.
            Status::Ok | Status::BufError => CompressStatus::NeedsInput,
        };

        Ok((consumed, produced, status))
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.finished = false;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
