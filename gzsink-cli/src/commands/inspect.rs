//! Inspect command implementation.

use crate::utils::{compression_ratio, describe_os, describe_xfl, format_size};
use gzsink_gzip::framer::{FOOTER_LEN, FrameFooter, FrameHeader, HEADER_LEN};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;

/// Header and trailer fields of a gzip member.
#[derive(Debug, Serialize, PartialEq)]
pub struct MemberInfo {
    pub method: u8,
    pub flags: u8,
    pub mtime: u32,
    pub xfl: u8,
    pub os: u8,
    pub crc32: String,
    pub isize: u32,
    pub compressed_bytes: u64,
    pub deflate_bytes: u64,
}

/// Read the framing of a single-member gzip stream.
pub fn inspect_member(data: &[u8]) -> Result<MemberInfo, gzsink_core::GzSinkError> {
    let header = FrameHeader::parse(data)?;
    let footer = FrameFooter::parse_tail(data)?;

    Ok(MemberInfo {
        method: header.method,
        flags: header.flags,
        mtime: header.mtime,
        xfl: header.xfl,
        os: header.os,
        crc32: format!("{:08x}", footer.crc),
        isize: footer.isize,
        compressed_bytes: data.len() as u64,
        deflate_bytes: (data.len() - HEADER_LEN - FOOTER_LEN) as u64,
    })
}

pub fn cmd_inspect(file: Option<&PathBuf>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = Vec::new();
    let name = match file {
        Some(path) if path.as_os_str() != "-" => {
            data = std::fs::read(path)?;
            path.display().to_string()
        }
        _ => {
            io::stdin().lock().read_to_end(&mut data)?;
            "<stdin>".to_string()
        }
    };

    let info = inspect_member(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("GZIP Member");
    println!("===========");
    println!("File: {}", name);
    println!("Size: {}", format_size(info.compressed_bytes));
    println!();
    println!("Header:");
    println!("  Method: {} (deflate)", info.method);
    println!("  Flags: {:#04x}", info.flags);
    if info.mtime > 0 {
        println!("  Modification time: {} (Unix timestamp)", info.mtime);
    }
    println!("  Extra flags: {} ({})", info.xfl, describe_xfl(info.xfl));
    println!("  OS: {} ({})", info.os, describe_os(info.os));
    println!();
    println!("Trailer:");
    println!("  CRC-32: {}", info.crc32);
    println!("  Uncompressed size (mod 2^32): {}", format_size(info.isize as u64));
    if info.isize > 0 {
        println!(
            "  Compression ratio: {:.1}%",
            compression_ratio(info.isize as u64, info.compressed_bytes)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::compress::{CompressOptions, compress_stream, session_config};

    #[test]
    fn test_inspect_session_output() {
        let opts = CompressOptions {
            input: None,
            output: None,
            level: 1,
            threads: 1,
            compressor: "zlib".to_string(),
            block_size: 128 * 1024,
            buffer_size: 4096,
            low_water: 512,
            chunk_size: 64,
            force: false,
            json: true,
            verbose: false,
        };
        let mut gz = Vec::new();
        compress_stream(&mut &b"hello world"[..], &mut gz, session_config(&opts), 5).unwrap();

        let info = inspect_member(&gz).unwrap();
        assert_eq!(info.method, 8);
        assert_eq!(info.xfl, 4);
        assert_eq!(info.os, 3);
        assert_eq!(info.crc32, "0d4a1185");
        assert_eq!(info.isize, 11);
        assert_eq!(info.compressed_bytes, gz.len() as u64);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["isize"], 11);
    }

    #[test]
    fn test_inspect_rejects_non_gzip() {
        assert!(inspect_member(b"definitely not a gzip member").is_err());
        assert!(inspect_member(&[0x1F, 0x8B]).is_err());
    }
}
