//! Error types for GzSink operations.
//!
//! One error type covers every failure a compressing write session can hit:
//! configuration problems at open time, child writer failures, and codec
//! failures.

use std::io;
use thiserror::Error;

/// The main error type for GzSink operations.
#[derive(Debug, Error)]
pub enum GzSinkError {
    /// I/O error reported by a child writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A session was opened without a child writer.
    #[error("No child writer supplied")]
    MissingChild,

    /// Session or backend configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },

    /// Malformed gzip header or trailer bytes.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// The child writer accepted fewer bytes than requested.
    #[error("Child writer rejected write: accepted {accepted} of {requested} bytes")]
    ChildRejected {
        /// Number of bytes handed to the child.
        requested: usize,
        /// Number of bytes the child reported as accepted.
        accepted: usize,
    },

    /// The compression backend failed.
    #[error("Compression backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// Unsupported compressor selection.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compressor name that was requested.
        method: String,
    },

    /// A write reached a session that no longer accepts data.
    #[error("Session no longer accepts writes (status: {status})")]
    SessionClosed {
        /// Name of the terminal status.
        status: &'static str,
    },
}

/// Result type alias for GzSink operations.
pub type Result<T> = std::result::Result<T, GzSinkError>;

impl GzSinkError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a child rejection error.
    pub fn child_rejected(requested: usize, accepted: usize) -> Self {
        Self::ChildRejected {
            requested,
            accepted,
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a session closed error.
    pub fn session_closed(status: &'static str) -> Self {
        Self::SessionClosed { status }
    }

    /// Whether this error comes from the downstream sink rather than from
    /// configuration or the codec.
    pub fn is_child_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ChildRejected { .. })
    }
}

impl GzSinkError {
    /// The `io::ErrorKind` this error maps to when surfaced through
    /// `std::io::Write`.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(e) => e.kind(),
            Self::ChildRejected { .. } => io::ErrorKind::WriteZero,
            Self::SessionClosed { .. } => io::ErrorKind::BrokenPipe,
            Self::InvalidHeader { .. } => io::ErrorKind::InvalidData,
            Self::MissingChild | Self::InvalidConfig { .. } | Self::UnsupportedMethod { .. } => {
                io::ErrorKind::InvalidInput
            }
            Self::Backend { .. } => io::ErrorKind::Other,
        }
    }
}

impl From<GzSinkError> for io::Error {
    fn from(err: GzSinkError) -> Self {
        match err {
            GzSinkError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}
