//! ZIP writer for filtered archives
//!
//! Each member arrives fully in memory, is deflated once and written as local
//! header + compressed data with its real CRC-32 and sizes. The central directory
//! is emitted by `finish()`. Timestamps are zeroed, which keeps output
//! deterministic for identical input.

use crate::error::{Result, SplitError};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// General purpose flag: name is UTF-8
const FLAG_UTF8: u16 = 1 << 11;

const METHOD_DEFLATE: u16 = 8;

/// Default DEFLATE level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Entry already written, kept for the central directory
struct WrittenEntry {
    name: String,
    flags: u16,
    local_header_offset: u64,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
}

impl WrittenEntry {
    fn sizes_need_zip64(&self) -> bool {
        self.uncompressed_size > u32::MAX as u64 || self.compressed_size > u32::MAX as u64
    }
}

/// ZIP writer that deflates each member as it is added
pub struct ArchiveWriter<W: Write + Seek> {
    output: W,
    entries: Vec<WrittenEntry>,
    compression: Compression,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Create a new ZIP file with the given DEFLATE level (0-9)
    pub fn create_with_compression<P: AsRef<Path>>(path: P, compression_level: u32) -> Result<Self> {
        let compression = compression_from_level(compression_level)?;
        Ok(Self::new(BufWriter::new(File::create(path)?), compression))
    }
}

impl<W: Write + Seek> ArchiveWriter<W> {
    fn new(output: W, compression: Compression) -> Self {
        ArchiveWriter {
            output,
            entries: Vec::new(),
            compression,
        }
    }

    /// Deflate `data` and append it as a member named `name`
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut encoder = DeflateEncoder::new(Vec::new(), self.compression);
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let entry = WrittenEntry {
            name: name.to_string(),
            flags: if name.is_ascii() { 0 } else { FLAG_UTF8 },
            local_header_offset: self.output.stream_position()?,
            crc32: crc32fast::hash(data),
            compressed_size: compressed.len() as u64,
            uncompressed_size: data.len() as u64,
        };

        // A local ZIP64 extra field must carry both sizes
        let zip64 = entry.sizes_need_zip64();
        let mut extra_field: Vec<u8> = Vec::new();
        if zip64 {
            extra_field.extend_from_slice(&0x0001u16.to_le_bytes());
            extra_field.extend_from_slice(&16u16.to_le_bytes());
            extra_field.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            extra_field.extend_from_slice(&entry.compressed_size.to_le_bytes());
        }
        let (compressed_32, uncompressed_32) = if zip64 {
            (0xFFFFFFFF, 0xFFFFFFFF)
        } else {
            (entry.compressed_size as u32, entry.uncompressed_size as u32)
        };
        let version: u8 = if zip64 { 45 } else { 20 };

        self.output.write_all(&[0x50, 0x4b, 0x03, 0x04])?; // local header sig
        self.output.write_all(&[version, 0])?; // version needed
        self.output.write_all(&entry.flags.to_le_bytes())?;
        self.output.write_all(&METHOD_DEFLATE.to_le_bytes())?;
        self.output.write_all(&[0, 0, 0, 0])?; // mod time/date
        self.output.write_all(&entry.crc32.to_le_bytes())?;
        self.output.write_all(&compressed_32.to_le_bytes())?;
        self.output.write_all(&uncompressed_32.to_le_bytes())?;
        self.output.write_all(&(name.len() as u16).to_le_bytes())?;
        self.output
            .write_all(&(extra_field.len() as u16).to_le_bytes())?;
        self.output.write_all(name.as_bytes())?;
        self.output.write_all(&extra_field)?;
        self.output.write_all(&compressed)?;

        self.entries.push(entry);
        Ok(())
    }

    /// Finish ZIP file (write central directory and return the writer)
    pub fn finish(mut self) -> Result<W> {
        let central_dir_offset = self.output.stream_position()?;

        for entry in &self.entries {
            let needs_zip64 =
                entry.sizes_need_zip64() || entry.local_header_offset > u32::MAX as u64;
            let version: u8 = if needs_zip64 { 45 } else { 20 };

            self.output.write_all(&[0x50, 0x4b, 0x01, 0x02])?; // central dir sig
            self.output.write_all(&[version, 0])?; // version made by
            self.output.write_all(&[version, 0])?; // version needed
            self.output.write_all(&entry.flags.to_le_bytes())?;
            self.output.write_all(&METHOD_DEFLATE.to_le_bytes())?;
            self.output.write_all(&[0, 0, 0, 0])?; // mod time/date
            self.output.write_all(&entry.crc32.to_le_bytes())?;
            self.output
                .write_all(&clamp_u32(entry.compressed_size).to_le_bytes())?;
            self.output
                .write_all(&clamp_u32(entry.uncompressed_size).to_le_bytes())?;
            self.output
                .write_all(&(entry.name.len() as u16).to_le_bytes())?;

            let mut extra_field: Vec<u8> = Vec::new();
            if needs_zip64 {
                let mut data: Vec<u8> = Vec::new();
                if entry.uncompressed_size > u32::MAX as u64 {
                    data.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
                }
                if entry.compressed_size > u32::MAX as u64 {
                    data.extend_from_slice(&entry.compressed_size.to_le_bytes());
                }
                if entry.local_header_offset > u32::MAX as u64 {
                    data.extend_from_slice(&entry.local_header_offset.to_le_bytes());
                }
                extra_field.extend_from_slice(&0x0001u16.to_le_bytes());
                extra_field.extend_from_slice(&(data.len() as u16).to_le_bytes());
                extra_field.extend_from_slice(&data);
            }

            self.output
                .write_all(&(extra_field.len() as u16).to_le_bytes())?;
            self.output.write_all(&0u16.to_le_bytes())?; // file comment len
            self.output.write_all(&0u16.to_le_bytes())?; // disk number start
            self.output.write_all(&0u16.to_le_bytes())?; // internal attrs
            self.output.write_all(&0u32.to_le_bytes())?; // external attrs
            self.output
                .write_all(&clamp_u32(entry.local_header_offset).to_le_bytes())?;
            self.output.write_all(entry.name.as_bytes())?;
            self.output.write_all(&extra_field)?;
        }

        let central_dir_size = self.output.stream_position()? - central_dir_offset;

        let need_zip64 = self.entries.len() >= u16::MAX as usize
            || central_dir_size >= u32::MAX as u64
            || central_dir_offset >= u32::MAX as u64;

        if need_zip64 {
            let zip64_eocd_pos = central_dir_offset + central_dir_size;

            // ZIP64 end of central directory record
            self.output.write_all(&[0x50, 0x4b, 0x06, 0x06])?;
            // size of remaining record: versions(4) + disks(8) + counts(16) + cd size/offset(16)
            self.output.write_all(&44u64.to_le_bytes())?;
            self.output.write_all(&[45, 0])?; // version made by
            self.output.write_all(&[45, 0])?; // version needed
            self.output.write_all(&0u32.to_le_bytes())?; // disk number
            self.output.write_all(&0u32.to_le_bytes())?; // disk where central dir starts
            self.output
                .write_all(&(self.entries.len() as u64).to_le_bytes())?;
            self.output
                .write_all(&(self.entries.len() as u64).to_le_bytes())?;
            self.output.write_all(&central_dir_size.to_le_bytes())?;
            self.output.write_all(&central_dir_offset.to_le_bytes())?;

            // ZIP64 end of central directory locator
            self.output.write_all(&[0x50, 0x4b, 0x06, 0x07])?;
            self.output.write_all(&0u32.to_le_bytes())?; // disk with ZIP64 EOCD
            self.output.write_all(&zip64_eocd_pos.to_le_bytes())?;
            self.output.write_all(&1u32.to_le_bytes())?; // total number of disks
        }

        // Classic end of central directory
        let entry_count = if need_zip64 {
            0xFFFF
        } else {
            self.entries.len() as u16
        };
        let (cd_size_32, cd_offset_32) = if need_zip64 {
            (0xFFFFFFFF, 0xFFFFFFFF)
        } else {
            (central_dir_size as u32, central_dir_offset as u32)
        };

        self.output.write_all(&[0x50, 0x4b, 0x05, 0x06])?;
        self.output.write_all(&0u16.to_le_bytes())?; // disk number
        self.output.write_all(&0u16.to_le_bytes())?; // disk with central dir
        self.output.write_all(&entry_count.to_le_bytes())?; // entries on this disk
        self.output.write_all(&entry_count.to_le_bytes())?; // total entries
        self.output.write_all(&cd_size_32.to_le_bytes())?;
        self.output.write_all(&cd_offset_32.to_le_bytes())?;
        self.output.write_all(&0u16.to_le_bytes())?; // comment len

        self.output.flush()?;
        Ok(self.output)
    }
}

/// Map a 0-9 level to flate2's `Compression`
pub(crate) fn compression_from_level(level: u32) -> Result<Compression> {
    if level > 9 {
        return Err(SplitError::InvalidCompressionLevel(level));
    }
    Ok(Compression::new(level))
}

fn clamp_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        0xFFFFFFFF
    } else {
        value as u32
    }
}
