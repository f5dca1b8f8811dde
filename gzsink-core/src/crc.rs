//! CRC-32 (ISO 3309) as used by the gzip footer.
//!
//! - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
//! - Initial value: 0xFFFFFFFF
//! - Final XOR: 0xFFFFFFFF
//! - Reflected input and output
//!
//! Data of 16 bytes or more goes through "slicing-by-8", which folds eight
//! input bytes per step using eight pre-computed tables. Shorter inputs use
//! the single-table loop.

/// Reflected CRC-32 polynomial.
const POLY: u32 = 0xEDB88320;

/// CRC-32 slicing-by-8 lookup tables. Table 0 is the classic byte table.
const CRC32_TABLES: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Running CRC-32 calculator.
///
/// # Example
///
/// ```
/// use gzsink_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"hello world");
/// assert_eq!(crc.finalize(), 0x0D4A1185);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a calculator at the CRC-32 seed.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset to the seed.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_sw(&mut self.crc, data);
        }
    }

    /// Current CRC value (the calculator stays usable).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.value()
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn crc32_sw(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc ^ byte as u32) & 0xFF) as usize;
        *crc = CRC32_TABLES[0][index] ^ (*crc >> 8);
    }
}

#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let low = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        c = CRC32_TABLES[7][(low & 0xFF) as usize]
            ^ CRC32_TABLES[6][((low >> 8) & 0xFF) as usize]
            ^ CRC32_TABLES[5][((low >> 16) & 0xFF) as usize]
            ^ CRC32_TABLES[4][(low >> 24) as usize]
            ^ CRC32_TABLES[3][bytes[4] as usize]
            ^ CRC32_TABLES[2][bytes[5] as usize]
            ^ CRC32_TABLES[1][bytes[6] as usize]
            ^ CRC32_TABLES[0][bytes[7] as usize];
    }

    for &byte in chunks.remainder() {
        c = CRC32_TABLES[0][((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
    }

    *crc = c;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0x00000000);
    }

    #[test]
    fn test_crc32_check() {
        // Standard CRC-32 check value for "123456789"
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_hello_world() {
        assert_eq!(Crc32::compute(b"hello world"), 0x0D4A1185);
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_incremental() {
        let mut crc = Crc32::new();
        crc.update(b"hello");
        crc.update(b" world");
        assert_eq!(crc.finalize(), 0x0D4A1185);
    }

    #[test]
    fn test_value_does_not_consume() {
        let mut crc = Crc32::new();
        crc.update(b"hello");
        let partial = crc.value();
        assert_eq!(partial, Crc32::compute(b"hello"));
        crc.update(b" world");
        assert_eq!(crc.value(), 0x0D4A1185);
    }

    #[test]
    fn test_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        assert_eq!(crc.value(), 0);
    }

    #[test]
    fn test_slice_tables_derive_from_base() {
        for t in 1..8 {
            for i in 0..256 {
                let prev = CRC32_TABLES[t - 1][i];
                let expected = CRC32_TABLES[0][(prev & 0xFF) as usize] ^ (prev >> 8);
                assert_eq!(CRC32_TABLES[t][i], expected, "table {} entry {}", t, i);
            }
        }
    }

    #[test]
    fn test_crc32_various_sizes() {
        // Boundary conditions around the slicing-by-8 threshold
        for size in [1, 7, 8, 15, 16, 17, 31, 32, 63, 64, 127, 128, 255, 256] {
            let data: Vec<u8> = (0..size).map(|i| (i * 31 + 7) as u8).collect();
            let crc1 = Crc32::compute(&data);

            let mut crc2 = Crc32::new();
            for &byte in &data {
                crc2.update(&[byte]);
            }

            assert_eq!(crc1, crc2.finalize(), "CRC mismatch for size {}", size);
        }
    }
}
