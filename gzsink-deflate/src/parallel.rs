//! Parallel block deflate.
//!
//! Input is staged until a batch of `threads * block_size` bytes is ready (or
//! the caller flushes), then every block of the batch is compressed by its
//! own flate2 compressor on the backend pool. Each block ends with a sync
//! flush, so blocks are byte-aligned and none of them carries the final-block
//! bit; concatenated in order they form one deflate stream. `Finish` appends
//! an empty final block.
//!
//! Compressed bytes that do not fit the caller's output slice wait in an
//! internal queue and are handed out first on the next call.

use crate::backend::Backend;
use crate::codec::flate_flush;
use flate2::{Compress, Compression};
use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::{CompressStatus, CompressionLevel, Compressor, FlushMode};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::trace;

/// Final fixed-Huffman block holding only end-of-block.
const FINAL_EMPTY_BLOCK: [u8; 2] = [0x03, 0x00];

/// Deflate codec that compresses blocks concurrently on the shared pool.
pub struct ParallelDeflateCodec {
    backend: Arc<Backend>,
    level: CompressionLevel,
    block_size: usize,
    /// Uncompressed input waiting for a full batch.
    staging: Vec<u8>,
    /// Compressed output not yet handed to the caller.
    queue: Vec<u8>,
    queue_pos: usize,
    tail_queued: bool,
    finished: bool,
}

impl ParallelDeflateCodec {
    /// Create a codec on `backend` at the given level.
    pub fn new(backend: Arc<Backend>, level: CompressionLevel) -> Self {
        let block_size = backend.block_size();
        Self {
            staging: Vec::with_capacity(block_size * backend.threads()),
            backend,
            level,
            block_size,
            queue: Vec::new(),
            queue_pos: 0,
            tail_queued: false,
            finished: false,
        }
    }

    fn batch_size(&self) -> usize {
        self.block_size * self.backend.threads()
    }

    fn has_queued(&self) -> bool {
        self.queue_pos < self.queue.len()
    }

    /// Copy queued output into `output`, returning the bytes copied.
    fn drain_into(&mut self, output: &mut [u8]) -> usize {
        let n = (self.queue.len() - self.queue_pos).min(output.len());
        output[..n].copy_from_slice(&self.queue[self.queue_pos..self.queue_pos + n]);
        self.queue_pos += n;
        if self.queue_pos == self.queue.len() {
            self.queue.clear();
            self.queue_pos = 0;
        }
        n
    }

    /// Compress the staged batch into the queue.
    fn compress_staging(&mut self) -> Result<()> {
        let level = Compression::new(self.level.level() as u32);
        let block_size = self.block_size;
        let staging = &self.staging;

        let segments = self.backend.install(|| {
            staging
                .par_chunks(block_size)
                .map(|block| compress_block(block, level))
                .collect::<Result<Vec<_>>>()
        })?;

        trace!(
            input = staging.len(),
            blocks = segments.len(),
            "compressed parallel batch"
        );

        for segment in segments {
            self.queue.extend_from_slice(&segment);
        }
        self.staging.clear();
        Ok(())
    }
}

/// Compress one block as a byte-aligned, non-final deflate segment.
fn compress_block(block: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut compress = Compress::new(level, false);
    let mut out = Vec::with_capacity(block.len() / 2 + 64);

    loop {
        if out.capacity() - out.len() < 64 {
            out.reserve(block.len() / 4 + 64);
        }
        let offset = compress.total_in() as usize;
        compress
            .compress_vec(&block[offset..], &mut out, flate_flush(FlushMode::Sync))
            .map_err(|e| GzSinkError::backend(format!("deflate block: {}", e)))?;

        // A sync flush is complete once zlib stops short of the capacity.
        if compress.total_in() as usize == block.len() && out.len() < out.capacity() {
            break;
        }
    }

    Ok(out)
}

impl Compressor for ParallelDeflateCodec {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, CompressStatus)> {
        if self.finished {
            return Ok((0, 0, CompressStatus::Done));
        }

        let mut produced = self.drain_into(output);
        let mut consumed = 0;

        while !self.has_queued() {
            if consumed < input.len() {
                let room = self.batch_size() - self.staging.len();
                let take = room.min(input.len() - consumed);
                self.staging
                    .extend_from_slice(&input[consumed..consumed + take]);
                consumed += take;
            }

            let input_left = consumed < input.len();
            let batch_full = self.staging.len() >= self.batch_size();
            let flushing = flush != FlushMode::None && !input_left;

            if batch_full || (flushing && !self.staging.is_empty()) {
                self.compress_staging()?;
            } else if flush == FlushMode::Finish && !input_left && !self.tail_queued {
                self.queue.extend_from_slice(&FINAL_EMPTY_BLOCK);
                self.tail_queued = true;
            } else {
                break;
            }

            produced += self.drain_into(&mut output[produced..]);
        }

        let status = if self.has_queued() {
            CompressStatus::NeedsOutput
        } else if self.tail_queued {
            self.finished = true;
            CompressStatus::Done
        } else {
            CompressStatus::NeedsInput
        };

        Ok((consumed, produced, status))
    }

    fn reset(&mut self) {
        self.staging.clear();
        self.queue.clear();
        self.queue_pos = 0;
        self.tail_queued = false;
        self.finished = false;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
