//! # GzSink Gzip
//!
//! Streaming gzip (RFC 1952) write sessions layered over a child writer.
//!
//! A session writes the fixed gzip header when it opens, compresses every
//! write through the shared deflate backend into a bounded output buffer,
//! and on close finishes the stream, writes the CRC-32/ISIZE trailer and
//! destroys the child.
//!
//! - [`framer`]: header and trailer layout, plus the emitters sessions use
//! - [`GzipSink`]: the session, usable directly, through `std::io::Write`,
//!   or as a boxed [`WriteSource`](gzsink_core::WriteSource)
//! - [`IoChild`]: wraps any `std::io::Write` as a child
//!
//! ## Example
//!
//! ```rust
//! use gzsink_gzip::{GzipSink, GzipSinkConfig, IoChild};
//! use std::io::Write;
//!
//! let child = IoChild::new(std::io::sink());
//! let mut sink = GzipSink::open(child, GzipSinkConfig::default().level(9u8)).unwrap();
//! sink.write_all(b"Hello, World!").unwrap();
//! let summary = sink.finish().unwrap();
//! assert_eq!(summary.uncompressed_bytes, 13);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod child;
pub mod config;
pub mod framer;
pub mod sink;

// Re-exports
pub use child::IoChild;
pub use config::{DEFAULT_BUFFER_CAPACITY, DEFAULT_LOW_WATER_MARK, GzipSinkConfig};
pub use framer::{FrameFooter, FrameHeader, emit_footer, emit_header};
pub use sink::{CloseSummary, GzipSink, SessionStatus, open_write_source};
