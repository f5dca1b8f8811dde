//! Command implementations for the GzSink CLI.

pub mod compress;
pub mod inspect;

pub use compress::{CompressOptions, cmd_compress};
pub use inspect::cmd_inspect;
