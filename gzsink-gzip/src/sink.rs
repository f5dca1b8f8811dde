//! Streaming gzip write session.
//!
//! A [`GzipSink`] sits in front of a child writer. Opening it writes the
//! gzip header; every write runs the input through the backend codec into
//! a fixed output buffer that is handed to the child whenever its free
//! space drops to the low-water mark. Closing finishes the deflate stream,
//! flushes what is left, writes the trailer and destroys the child.
//!
//! Failures are sticky. Once a write fails the session reports `-1` for
//! every later write without touching the child again; bytes that were in
//! the output buffer when the child failed are dropped, not retried.

use crate::buffer::OutputBuffer;
use crate::config::GzipSinkConfig;
use crate::framer;
use gzsink_core::crc::Crc32;
use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::{
    ChildWriter, CompressStatus, CompressionLevel, Compressor, FlushMode, WriteSource,
};
use gzsink_deflate::backend::{self, BackendGuard};
use std::io;
use tracing::{debug, error, trace, warn};

/// Name the session reports through [`WriteSource::name`].
pub const SOURCE_NAME: &str = "gzipw";

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Accepting writes.
    Ok,
    /// End of stream was marked; writes return 0.
    Eof,
    /// A write failed; writes return -1.
    Error,
}

impl SessionStatus {
    /// Lowercase name for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Eof => "eof",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals reported by a successful [`GzipSink::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseSummary {
    /// CRC-32 of everything the codec consumed.
    pub crc: u32,
    /// Uncompressed bytes consumed.
    pub uncompressed_bytes: u64,
    /// Bytes handed to the child, header and trailer included.
    pub compressed_bytes: u64,
}

/// A compressing write session over a child writer.
pub struct GzipSink<C: ChildWriter> {
    /// `None` once the session has been closed.
    child: Option<C>,
    codec: Box<dyn Compressor + Send>,
    buffer: OutputBuffer,
    status: SessionStatus,
    last_error: Option<(io::ErrorKind, String)>,
    level: CompressionLevel,
    crc: Crc32,
    total_in: u64,
    total_out: u64,
    // Declared last: released after the codec that may share its pool.
    backend: BackendGuard,
}

impl<C: ChildWriter> GzipSink<C> {
    /// Open a session over `child` and write the gzip header.
    ///
    /// The session owns `child` from here on. If opening fails the child is
    /// destroyed, the backend reference is released and nothing else is kept.
    pub fn open(mut child: C, config: GzipSinkConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            return Err(abandon(child, e));
        }

        let backend = match backend::acquire(&config.backend) {
            Ok(guard) => guard,
            Err(e) => return Err(abandon(child, e)),
        };

        let header_len = match framer::emit_header(&mut child, config.level) {
            Ok(n) => n,
            Err(e) => return Err(abandon(child, e)),
        };

        let codec = backend.shared().create_codec(config.level);

        debug!(
            level = config.level.level(),
            threads = backend.threads(),
            buffer_capacity = config.buffer_capacity,
            low_water_mark = config.low_water_mark,
            "gzip sink opened"
        );

        Ok(Self {
            child: Some(child),
            codec,
            buffer: OutputBuffer::new(config.buffer_capacity, config.low_water_mark),
            status: SessionStatus::Ok,
            last_error: None,
            level: config.level,
            crc: Crc32::new(),
            total_in: 0,
            total_out: header_len as u64,
            backend,
        })
    }

    /// Open a session with default settings at `level`.
    pub fn with_level(child: C, level: CompressionLevel) -> Result<Self> {
        Self::open(child, GzipSinkConfig::default().level(level))
    }

    /// Compress `data` into the session.
    ///
    /// Returns the number of bytes consumed (all of `data` on success), `0`
    /// for empty input or after end-of-stream, and `-1` once the session has
    /// failed. A failure part way through reports only the input consumed
    /// before this call's last successful flush, or `-1` if there was none,
    /// so a failure on the first flush of a call is never positive. Every
    /// later call returns `-1`.
    pub fn write(&mut self, data: &[u8]) -> i64 {
        match self.status {
            SessionStatus::Ok => {}
            SessionStatus::Eof => return 0,
            SessionStatus::Error => return -1,
        }
        if data.is_empty() {
            return 0;
        }

        let mut consumed = 0usize;
        // Input consumed before this call's last successful flush.
        let mut landed = 0usize;
        while consumed < data.len() {
            if self.buffer.needs_flush() {
                if let Err(e) = self.flush_buffer() {
                    return self.fail_write(e, consumed, landed, data.len());
                }
                landed = consumed;
            }

            match self.run_codec(&data[consumed..], FlushMode::None) {
                Ok((n, _)) => consumed += n,
                Err(e) => return self.fail_write(e, consumed, landed, data.len()),
            }
        }

        trace!(
            bytes = data.len(),
            pending = self.buffer.pending(),
            total_in = self.total_in,
            "gzip write"
        );
        consumed as i64
    }

    /// Sync-flush the codec and hand everything produced so far to the
    /// child. The bytes written up to here decode without the rest of the
    /// stream.
    pub fn flush_sync(&mut self) -> Result<()> {
        if self.status == SessionStatus::Error {
            return Err(GzSinkError::session_closed(self.status.as_str()));
        }

        let result = self.drive_codec(FlushMode::Sync).and_then(|()| self.flush_buffer());
        if let Err(e) = &result {
            warn!(error = %e, "gzip sync flush failed");
            self.fail(e);
        }
        result
    }

    /// Mark end-of-stream. Later writes return 0; close still finalizes.
    pub fn mark_eof(&mut self) {
        if self.status == SessionStatus::Ok {
            debug!(total_in = self.total_in, "gzip sink reached end of stream");
            self.status = SessionStatus::Eof;
        }
    }

    /// Finalize the stream, write the trailer and destroy the child.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned and each one is logged.
    pub fn finish(mut self) -> Result<CloseSummary> {
        self.close_inner()
    }

    /// Current session state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Compression level of the session.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// CRC-32 of the bytes consumed so far.
    pub fn checksum(&self) -> u32 {
        self.crc.value()
    }

    /// Uncompressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Worker threads of the shared backend; more than one selects the
    /// parallel block codec.
    pub fn threads(&self) -> usize {
        self.backend.threads()
    }

    /// Bytes handed to the child so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Compressed bytes waiting in the output buffer.
    pub fn pending(&self) -> usize {
        self.buffer.pending()
    }

    /// Description of the failure that moved the session to `Error`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|(_, msg)| msg.as_str())
    }

    /// Run the codec once over `input`, committing its output and folding
    /// the consumed bytes into the checksum. A call that makes no progress
    /// forces a flush; with nothing to flush it is a backend failure.
    fn run_codec(&mut self, input: &[u8], flush: FlushMode) -> Result<(usize, CompressStatus)> {
        let (consumed, produced, status) =
            self.codec.compress(input, self.buffer.spare_mut(), flush)?;
        let consumed = consumed.min(input.len());

        self.crc.update(&input[..consumed]);
        self.total_in += consumed as u64;
        self.buffer.commit(produced);

        let stalled = consumed == 0
            && produced == 0
            && (status == CompressStatus::NeedsOutput || !input.is_empty());
        if stalled {
            if self.buffer.is_empty() {
                return Err(GzSinkError::backend(format!(
                    "codec made no progress ({:?} with {} bytes free)",
                    status,
                    self.buffer.free()
                )));
            }
            self.flush_buffer()?;
        }

        Ok((consumed, status))
    }

    /// Drive a sync or finish flush until the codec has emitted everything.
    fn drive_codec(&mut self, flush: FlushMode) -> Result<()> {
        loop {
            if self.buffer.needs_flush() {
                self.flush_buffer()?;
            }
            match self.run_codec(&[], flush)? {
                (_, CompressStatus::Done) => return Ok(()),
                (_, CompressStatus::NeedsInput) if flush != FlushMode::Finish => return Ok(()),
                _ => {}
            }
        }
    }

    /// Hand all pending bytes to the child in one write.
    fn flush_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let Some(child) = self.child.as_mut() else {
            return Err(GzSinkError::session_closed("closed"));
        };

        let pending = self.buffer.filled();
        let requested = pending.len();
        let result = match child.write(pending) {
            Ok(n) if n == requested => Ok(()),
            Ok(n) => Err(GzSinkError::child_rejected(requested, n)),
            Err(e) => Err(GzSinkError::from(e)),
        };

        // Failed bytes are not retried.
        self.buffer.clear();
        result?;

        self.total_out += requested as u64;
        trace!(bytes = requested, total_out = self.total_out, "flushed to child");
        Ok(())
    }

    /// Move to `Error` and pick the count a failed write reports. Output of
    /// input consumed after the last successful flush was dropped with the
    /// buffer, so it is not reported.
    fn fail_write(
        &mut self,
        err: GzSinkError,
        consumed: usize,
        landed: usize,
        requested: usize,
    ) -> i64 {
        warn!(error = %err, consumed, landed, requested, "gzip write failed");
        self.fail(&err);
        if landed > 0 {
            landed as i64
        } else {
            -1
        }
    }

    fn fail(&mut self, err: &GzSinkError) {
        self.status = SessionStatus::Error;
        self.last_error = Some((err.io_kind(), err.to_string()));
    }

    fn io_error(&self) -> io::Error {
        match &self.last_error {
            Some((kind, msg)) => io::Error::new(*kind, msg.clone()),
            None => GzSinkError::session_closed(self.status.as_str()).into(),
        }
    }

    /// Teardown shared by `finish`, `WriteSource::close` and `Drop`.
    fn close_inner(&mut self) -> Result<CloseSummary> {
        if self.child.is_none() {
            return Err(GzSinkError::session_closed("closed"));
        }
        debug!(status = %self.status, total_in = self.total_in, "closing gzip sink");

        let mut first_error = None;

        if let Err(e) = self.drive_codec(FlushMode::Finish) {
            warn!(error = %e, "finishing deflate stream failed");
            keep_first(&mut first_error, e);
        }

        if let Err(e) = self.flush_buffer() {
            warn!(error = %e, "flushing compressed tail failed");
            keep_first(&mut first_error, e);
        }

        let crc = self.crc.value();
        // ISIZE is the length modulo 2^32.
        let isize = self.total_in as u32;
        if let Some(child) = self.child.as_mut() {
            match framer::emit_footer(child, crc, isize) {
                Ok(n) => self.total_out += n as u64,
                Err(e) => {
                    warn!(error = %e, "writing gzip trailer failed");
                    keep_first(&mut first_error, e);
                }
            }
        }

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.destroy() {
                warn!(error = %e, "destroying child writer failed");
                keep_first(&mut first_error, e.into());
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!(
                    crc = format_args!("{:08x}", crc),
                    total_in = self.total_in,
                    total_out = self.total_out,
                    "gzip sink closed"
                );
                Ok(CloseSummary {
                    crc,
                    uncompressed_bytes: self.total_in,
                    compressed_bytes: self.total_out,
                })
            }
        }
    }
}

fn keep_first(slot: &mut Option<GzSinkError>, err: GzSinkError) {
    if slot.is_none() {
        *slot = Some(err);
    }
}

/// Destroy a child that never became part of a session.
fn abandon<C: ChildWriter>(mut child: C, err: GzSinkError) -> GzSinkError {
    error!(error = %err, "opening gzip sink failed");
    if let Err(e) = child.destroy() {
        warn!(error = %e, "destroying child writer failed");
    }
    err
}

impl<C: ChildWriter> std::fmt::Debug for GzipSink<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipSink")
            .field("status", &self.status)
            .field("level", &self.level)
            .field("total_in", &self.total_in)
            .field("total_out", &self.total_out)
            .field("pending", &self.buffer.pending())
            .field("backend", &*self.backend)
            .finish()
    }
}

impl<C: ChildWriter> io::Write for GzipSink<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match GzipSink::write(self, buf) {
            n if n >= 0 => Ok(n as usize),
            _ => Err(self.io_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_sync().map_err(io::Error::from)
    }
}

impl<C: ChildWriter> WriteSource for GzipSink<C> {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn write(&mut self, data: &[u8]) -> i64 {
        GzipSink::write(self, data)
    }

    fn close(self: Box<Self>) {
        let sink = *self;
        if let Err(e) = sink.finish() {
            error!(source = SOURCE_NAME, error = %e, "closing write source failed");
        }
    }
}

impl<C: ChildWriter> Drop for GzipSink<C> {
    fn drop(&mut self) {
        if self.child.is_none() {
            return;
        }
        debug!("gzip sink dropped without finish");
        if let Err(e) = self.close_inner() {
            error!(error = %e, "closing dropped gzip sink failed");
        }
    }
}

/// Open a gzip write source over `child` at a signed `level`.
///
/// Negative levels select the default, levels above 9 clamp to 9. A
/// missing child fails before anything is allocated.
pub fn open_write_source(
    child: Option<Box<dyn ChildWriter + Send>>,
    level: i32,
) -> Result<Box<dyn WriteSource + Send>> {
    let Some(child) = child else {
        error!("gzip write source opened without a child writer");
        return Err(GzSinkError::MissingChild);
    };
    let sink = GzipSink::with_level(child, CompressionLevel::from_signed(level))?;
    Ok(Box::new(sink))
}
