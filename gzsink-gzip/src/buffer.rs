//! Fixed-capacity output buffer between the codec and the child.

/// Compressed bytes waiting to be handed to the child.
///
/// The codec writes into [`spare_mut`](Self::spare_mut) and commits what it
/// produced; the session drains everything with one child write and then
/// clears the buffer.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Box<[u8]>,
    pending: usize,
    low_water: usize,
}

impl OutputBuffer {
    /// Allocate a buffer. `low_water` should be below `capacity`.
    pub fn new(capacity: usize, low_water: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            pending: 0,
            low_water,
        }
    }

    /// Total capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Remaining free space.
    pub fn free(&self) -> usize {
        self.data.len() - self.pending
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Whether free space has dropped to the low-water mark.
    pub fn needs_flush(&self) -> bool {
        self.free() <= self.low_water
    }

    /// Pending bytes.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.pending]
    }

    /// Free space for the codec to write into.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.pending..]
    }

    /// Mark `n` bytes of the spare region as pending.
    pub fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.free());
        self.pending = (self.pending + n).min(self.data.len());
    }

    /// Drop all pending bytes.
    pub fn clear(&mut self) {
        self.pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_and_clear() {
        let mut buf = OutputBuffer::new(8, 2);
        assert!(buf.is_empty());
        assert_eq!(buf.free(), 8);

        buf.spare_mut()[..3].copy_from_slice(b"abc");
        buf.commit(3);
        assert_eq!(buf.filled(), b"abc");
        assert_eq!(buf.spare_mut().len(), 5);
        assert!(!buf.needs_flush());

        buf.commit(3);
        assert_eq!(buf.free(), 2);
        assert!(buf.needs_flush());

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_zero_low_water_flushes_only_when_full() {
        let mut buf = OutputBuffer::new(4, 0);
        buf.commit(3);
        assert!(!buf.needs_flush());
        buf.commit(1);
        assert!(buf.needs_flush());
    }
}
