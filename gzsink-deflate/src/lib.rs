//! # GzSink Deflate
//!
//! DEFLATE codecs (RFC 1951) for the GzSink write adapter, built on `flate2`.
//!
//! - [`DeflateCodec`]: single-stream raw deflate, one compressor per session
//! - [`ParallelDeflateCodec`]: input split into blocks compressed on the
//!   shared worker pool, joined into one valid deflate stream
//! - [`backend`]: the process-wide, reference-counted worker pool and
//!   compressor selection shared by every open session
//!
//! Both codecs implement [`gzsink_core::Compressor`], so a session drives
//! them through the same loop.
//!
//! ## Example
//!
//! ```rust
//! use gzsink_core::{CompressionLevel, Compressor, FlushMode};
//! use gzsink_deflate::DeflateCodec;
//!
//! let mut codec = DeflateCodec::new(CompressionLevel::DEFAULT);
//! let mut out = vec![0u8; 256];
//! let (consumed, _, _) = codec.compress(b"hello hello hello", &mut out, FlushMode::None).unwrap();
//! assert_eq!(consumed, 17);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod codec;
pub mod parallel;

// Re-exports
pub use backend::{Backend, BackendConfig, BackendGuard, CompressorKind};
pub use codec::DeflateCodec;
pub use parallel::ParallelDeflateCodec;
