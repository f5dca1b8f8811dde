//! GZIP container framing (RFC 1952).
//!
//! Sessions write a fixed 10-byte header with no optional fields and an
//! 8-byte trailer. The parsers here accept exactly that layout and exist
//! for verification; they are not a general gzip reader.

use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::{ChildWriter, CompressionLevel};
use tracing::trace;

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Operating system byte written by sessions (Unix).
pub const OS_UNIX: u8 = 3;

/// Length of the header sessions emit.
pub const HEADER_LEN: usize = 10;

/// Length of the trailer.
pub const FOOTER_LEN: usize = 8;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// Extra-flags values advertising the compression effort.
pub mod xfl {
    /// Level 9 and above.
    pub const BEST: u8 = 2;
    /// Level 1.
    pub const FASTEST: u8 = 4;
    /// Anything else.
    pub const NONE: u8 = 0;
}

/// XFL byte for a compression level.
pub fn xfl_for_level(level: CompressionLevel) -> u8 {
    match level.level() {
        l if l >= 9 => xfl::BEST,
        1 => xfl::FASTEST,
        _ => xfl::NONE,
    }
}

/// Fixed-size GZIP member header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Compression method (8 for DEFLATE).
    pub method: u8,
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 when unknown).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
}

impl FrameHeader {
    /// Header a session writes for `level`: no flags, no mtime, Unix OS.
    pub fn for_level(level: CompressionLevel) -> Self {
        Self {
            method: CM_DEFLATE,
            flags: 0,
            mtime: 0,
            xfl: xfl_for_level(level),
            os: OS_UNIX,
        }
    }

    /// Serialize to wire order.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mtime = self.mtime.to_le_bytes();
        [
            GZIP_MAGIC[0],
            GZIP_MAGIC[1],
            self.method,
            self.flags,
            mtime[0],
            mtime[1],
            mtime[2],
            mtime[3],
            self.xfl,
            self.os,
        ]
    }

    /// Parse the fixed part of a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(GzSinkError::invalid_header(format!(
                "need {} header bytes, have {}",
                HEADER_LEN,
                data.len()
            )));
        }

        if data[0..2] != GZIP_MAGIC {
            return Err(GzSinkError::invalid_header(format!(
                "bad magic {:02X} {:02X}",
                data[0], data[1]
            )));
        }

        let method = data[2];
        if method != CM_DEFLATE {
            return Err(GzSinkError::unsupported_method(format!(
                "GZIP method {}",
                method
            )));
        }

        let flags = data[3];
        if flags & flags::RESERVED != 0 {
            return Err(GzSinkError::invalid_header(format!(
                "reserved flag bits set: {:#04x}",
                flags
            )));
        }

        Ok(Self {
            method,
            flags,
            mtime: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            xfl: data[8],
            os: data[9],
        })
    }
}

/// GZIP member trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFooter {
    /// CRC-32 of the uncompressed data.
    pub crc: u32,
    /// Uncompressed length modulo 2^32.
    pub isize: u32,
}

impl FrameFooter {
    /// Serialize to wire order (both fields little-endian).
    pub fn to_bytes(&self) -> [u8; FOOTER_LEN] {
        let mut out = [0u8; FOOTER_LEN];
        out[..4].copy_from_slice(&self.crc.to_le_bytes());
        out[4..].copy_from_slice(&self.isize.to_le_bytes());
        out
    }

    /// Parse the trailer at the end of a complete member.
    pub fn parse_tail(member: &[u8]) -> Result<Self> {
        if member.len() < HEADER_LEN + FOOTER_LEN {
            return Err(GzSinkError::invalid_header(format!(
                "member of {} bytes is too short for a trailer",
                member.len()
            )));
        }
        let tail = &member[member.len() - FOOTER_LEN..];
        Ok(Self {
            crc: u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]),
            isize: u32::from_le_bytes([tail[4], tail[5], tail[6], tail[7]]),
        })
    }
}

/// Write the session header for `level` to `child`.
///
/// Returns the number of bytes written. A child that accepts fewer than
/// all ten bytes fails the call.
pub fn emit_header<C: ChildWriter + ?Sized>(child: &mut C, level: CompressionLevel) -> Result<usize> {
    let header = FrameHeader::for_level(level);
    let written = write_frame(child, &header.to_bytes())?;
    trace!(xfl = header.xfl, "wrote gzip header");
    Ok(written)
}

/// Write the trailer for a finished stream to `child`.
pub fn emit_footer<C: ChildWriter + ?Sized>(child: &mut C, crc: u32, isize: u32) -> Result<usize> {
    let footer = FrameFooter { crc, isize };
    let written = write_frame(child, &footer.to_bytes())?;
    trace!(crc = format_args!("{:08x}", crc), isize, "wrote gzip trailer");
    Ok(written)
}

fn write_frame<C: ChildWriter + ?Sized>(child: &mut C, bytes: &[u8]) -> Result<usize> {
    match child.write(bytes)? {
        n if n == bytes.len() => Ok(n),
        n => Err(GzSinkError::child_rejected(bytes.len(), n)),
    }
}
