//! # GzSink Core
//!
//! Core components for the GzSink compressing write adapter.
//!
//! This crate provides the pieces every other layer builds on:
//!
//! - [`crc`]: CRC-32 checksum with incremental update and combination
//! - [`traits`]: child writer, write source, and streaming codec contracts
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! GzSink is designed as a layered stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Front end                                           │
//! │     gzsink CLI                                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     gzip framer, streaming compression adapter          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     flate2 deflate, parallel block codec, backend       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC-32, traits, errors                              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gzsink_core::crc::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"hello ");
//! crc.update(b"world");
//! assert_eq!(crc.value(), Crc32::compute(b"hello world"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use crc::Crc32;
pub use error::{GzSinkError, Result};
pub use traits::{
    ChildWriter, CompressStatus, CompressionLevel, Compressor, FlushMode, WriteSource,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::crc::Crc32;
    pub use crate::error::{GzSinkError, Result};
    pub use crate::traits::{ChildWriter, CompressionLevel, Compressor, WriteSource};
}
