//! Child writers over `std::io::Write`.

use gzsink_core::traits::ChildWriter;
use std::io::{self, Write};

/// Adapts any `std::io::Write` into a [`ChildWriter`].
///
/// `write` hands the whole slice to `write_all`, so the accepted count is
/// always the full length or an error. `destroy` flushes the writer; the
/// writer itself is dropped with the adapter.
#[derive(Debug)]
pub struct IoChild<W: Write> {
    inner: W,
    destroyed: bool,
}

impl<W: Write> IoChild<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            destroyed: false,
        }
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Whether `destroy` has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<W: Write> ChildWriter for IoChild<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.destroyed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "child writer already destroyed",
            ));
        }
        self.inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn destroy(&mut self) -> io::Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.inner.flush()
    }
}
