//! Shared test children.

#![allow(dead_code)]

use flate2::read::GzDecoder;
use gzsink_core::ChildWriter;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, MutexGuard};

/// What a [`RecordingChild`] has seen.
#[derive(Debug, Default)]
pub struct Record {
    pub bytes: Vec<u8>,
    pub write_calls: usize,
    pub destroy_calls: usize,
    /// Calls with this index or later fail.
    pub fail_from: Option<usize>,
    /// Accept at most this many bytes per call.
    pub short_limit: Option<usize>,
}

/// A child that records every call, shareable across the session boundary.
#[derive(Debug, Clone, Default)]
pub struct RecordingChild(Arc<Mutex<Record>>);

impl RecordingChild {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write from call index `n` on (0 is the header).
    pub fn failing_from(n: usize) -> Self {
        let child = Self::default();
        child.record().fail_from = Some(n);
        child
    }

    /// Accept at most `limit` bytes per write.
    pub fn short(limit: usize) -> Self {
        let child = Self::default();
        child.record().short_limit = Some(limit);
        child
    }

    pub fn record(&self) -> MutexGuard<'_, Record> {
        self.0.lock().unwrap()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.record().bytes.clone()
    }

    pub fn boxed(&self) -> Box<dyn ChildWriter + Send> {
        Box::new(self.clone())
    }
}

impl ChildWriter for RecordingChild {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rec = self.record();
        let call = rec.write_calls;
        rec.write_calls += 1;

        if rec.fail_from.is_some_and(|n| call >= n) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "downstream closed"));
        }
        let n = rec.short_limit.map_or(buf.len(), |l| l.min(buf.len()));
        rec.bytes.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn destroy(&mut self) -> io::Result<()> {
        self.record().destroy_calls += 1;
        Ok(())
    }
}

/// Decode a complete gzip member with flate2.
pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .expect("valid gzip member");
    out
}

/// Deterministic, moderately compressible test data.
pub fn corpus(size: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..size)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if i % 4 == 0 {
                state as u8
            } else {
                b"streaming gzip sink "[i % 20]
            }
        })
        .collect()
}
