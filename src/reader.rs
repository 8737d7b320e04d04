//! ZIP archive reader - lists members in central directory order and extracts them
//!
//! Only the central directory is held in memory. Member data is read on demand,
//! decompressed into a buffer and checked against the recorded CRC-32.

use crate::error::{Result, SplitError};
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// ZIP local file header signature
const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;

/// ZIP central directory signature
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// ZIP end of central directory signature
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;

/// ZIP64 end of central directory record signature
const ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06064b50;

/// EOCD (22 bytes) plus the largest possible archive comment
const EOCD_SEARCH_WINDOW: u64 = 65557;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Entry in the ZIP central directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: u16,
    pub flags: u16,
    pub offset: u64,
}

impl ZipEntry {
    fn is_encrypted(&self) -> bool {
        self.flags & 0x0001 != 0
    }
}

/// ZIP archive reader over any seekable source
pub struct ArchiveReader<R: Read + Seek> {
    source: R,
    len: u64,
    entries: Vec<ZipEntry>,
}

impl ArchiveReader<BufReader<File>> {
    /// Open a ZIP file and read its central directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Read the central directory from an arbitrary seekable reader
    pub fn from_reader(mut source: R) -> Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        let entries = read_central_directory(&mut source, len)?;
        Ok(ArchiveReader {
            source,
            len,
            entries,
        })
    }

    /// All entries, in the order they appear in the central directory
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Member names in archive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read an entry's decompressed data into a vector
    pub fn read_entry(&mut self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(SplitError::InvalidFormat(format!(
                "Encrypted entry not supported: {}",
                entry.name
            )));
        }

        if entry.offset.saturating_add(entry.compressed_size) > self.len {
            return Err(SplitError::InvalidFormat(format!(
                "Entry {} extends past end of archive",
                entry.name
            )));
        }

        self.source.seek(SeekFrom::Start(entry.offset))?;

        let signature = read_u32_le(&mut self.source)?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(SplitError::InvalidFormat(
                "Invalid local file header signature".to_string(),
            ));
        }

        // Skip version, flags, method, time/date, CRC-32 and both sizes;
        // the central directory values are authoritative
        self.source.seek(SeekFrom::Current(22))?;

        let filename_len = read_u16_le(&mut self.source)? as i64;
        let extra_len = read_u16_le(&mut self.source)? as i64;
        self.source
            .seek(SeekFrom::Current(filename_len + extra_len))?;

        let mut compressed_data = vec![0u8; entry.compressed_size as usize];
        self.source.read_exact(&mut compressed_data)?;

        let data = match entry.compression_method {
            METHOD_DEFLATE => {
                let decoder = DeflateDecoder::new(&compressed_data[..]);
                // The recorded size is untrusted; read at most one byte past it
                let mut decompressed = Vec::new();
                decoder
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut decompressed)?;
                decompressed
            }
            METHOD_STORED => compressed_data,
            method => return Err(SplitError::UnsupportedCompression(method)),
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(SplitError::InvalidFormat(format!(
                "Entry {} holds {} bytes, central directory records {}",
                entry.name,
                data.len(),
                entry.uncompressed_size
            )));
        }

        let actual = crc32fast::hash(&data);
        if actual != entry.crc32 {
            return Err(SplitError::ChecksumMismatch {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        Ok(data)
    }
}

/// Read the central directory
fn read_central_directory<R: Read + Seek>(file: &mut R, file_size: u64) -> Result<Vec<ZipEntry>> {
    let eocd_offset = find_eocd(file, file_size)?;

    file.seek(SeekFrom::Start(eocd_offset))?;

    let signature = read_u32_le(file)?;
    if signature != END_OF_CENTRAL_DIRECTORY_SIGNATURE {
        return Err(SplitError::InvalidFormat(format!(
            "Invalid end of central directory signature: 0x{:08x}",
            signature
        )));
    }

    // Skip disk number fields
    file.seek(SeekFrom::Current(4))?;

    let _entries_on_disk = read_u16_le(file)?;

    // These values may be placeholder 0xFFFF/0xFFFFFFFF when ZIP64 is used
    let total_entries_16 = read_u16_le(file)?;
    let cd_size_32 = read_u32_le(file)?;
    let cd_offset_32 = read_u32_le(file)?;

    let mut total_entries = total_entries_16 as u64;
    let mut cd_offset = cd_offset_32 as u64;

    if total_entries_16 == 0xFFFF || cd_size_32 == 0xFFFFFFFF || cd_offset_32 == 0xFFFFFFFF {
        let (zip64_total_entries, zip64_cd_offset) = read_zip64_eocd(file, eocd_offset)?;
        total_entries = zip64_total_entries;
        cd_offset = zip64_cd_offset;
    }

    if cd_offset > eocd_offset {
        return Err(SplitError::InvalidFormat(format!(
            "Central directory offset {} lies beyond end of central directory",
            cd_offset
        )));
    }

    file.seek(SeekFrom::Start(cd_offset))?;

    // Each central directory header takes at least 46 bytes
    let capacity = total_entries.min((eocd_offset - cd_offset) / 46) as usize;
    let mut entries = Vec::with_capacity(capacity);
    for _ in 0..total_entries {
        let signature = read_u32_le(file)?;
        if signature != CENTRAL_DIRECTORY_SIGNATURE {
            return Err(SplitError::InvalidFormat(format!(
                "Invalid central directory header signature: 0x{:08x}",
                signature
            )));
        }

        // Skip version made by, version needed
        file.seek(SeekFrom::Current(4))?;

        let flags = read_u16_le(file)?;
        let compression_method = read_u16_le(file)?;

        // Skip modification time, date
        file.seek(SeekFrom::Current(4))?;

        let crc32 = read_u32_le(file)?;

        // Sizes may be 0xFFFFFFFF placeholders meaning ZIP64
        let compressed_size_32 = read_u32_le(file)? as u64;
        let uncompressed_size_32 = read_u32_le(file)? as u64;
        let filename_len = read_u16_le(file)? as usize;
        let extra_len = read_u16_le(file)? as usize;
        let comment_len = read_u16_le(file)? as usize;

        // Skip disk number, internal attributes, external attributes
        file.seek(SeekFrom::Current(8))?;

        let offset_32 = read_u32_le(file)? as u64;

        let mut filename_buf = vec![0u8; filename_len];
        file.read_exact(&mut filename_buf)?;
        let name = String::from_utf8_lossy(&filename_buf).to_string();

        let mut extra_buf = vec![0u8; extra_len];
        file.read_exact(&mut extra_buf)?;

        let mut compressed_size = compressed_size_32;
        let mut uncompressed_size = uncompressed_size_32;
        let mut offset = offset_32;

        if compressed_size_32 == 0xFFFFFFFF
            || uncompressed_size_32 == 0xFFFFFFFF
            || offset_32 == 0xFFFFFFFF
        {
            if let Some(zip64) = find_extra_field(&extra_buf, 0x0001) {
                // Values appear in fixed order, only for fields that overflowed
                let mut values = zip64.chunks_exact(8).map(le_u64);
                if uncompressed_size_32 == 0xFFFFFFFF {
                    if let Some(v) = values.next() {
                        uncompressed_size = v;
                    }
                }
                if compressed_size_32 == 0xFFFFFFFF {
                    if let Some(v) = values.next() {
                        compressed_size = v;
                    }
                }
                if offset_32 == 0xFFFFFFFF {
                    if let Some(v) = values.next() {
                        offset = v;
                    }
                }
            }
        }

        if comment_len > 0 {
            file.seek(SeekFrom::Current(comment_len as i64))?;
        }

        entries.push(ZipEntry {
            name,
            crc32,
            compressed_size,
            uncompressed_size,
            compression_method,
            flags,
            offset,
        });
    }

    Ok(entries)
}

/// Locate an extra field block by header ID and return its data
fn find_extra_field(extra: &[u8], id: u16) -> Option<&[u8]> {
    let mut i = 0usize;
    while i + 4 <= extra.len() {
        let header_id = u16::from_le_bytes([extra[i], extra[i + 1]]);
        let data_len = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
        i += 4;
        if i + data_len > extra.len() {
            return None;
        }
        if header_id == id {
            return Some(&extra[i..i + data_len]);
        }
        i += data_len;
    }
    None
}

/// When EOCD indicates ZIP64 usage, find and read the ZIP64 EOCD locator and record.
/// Returns (total entries, central directory offset).
fn read_zip64_eocd<R: Read + Seek>(file: &mut R, eocd_offset: u64) -> Result<(u64, u64)> {
    // Locator (20 bytes) sits directly before the classic EOCD
    let search_start = eocd_offset.saturating_sub(EOCD_SEARCH_WINDOW);
    file.seek(SeekFrom::Start(search_start))?;
    let mut buffer = vec![0u8; (eocd_offset - search_start) as usize];
    file.read_exact(&mut buffer)?;

    let locator_pos = rfind_signature(&buffer, [0x50, 0x4b, 0x06, 0x07])
        .filter(|pos| pos + 20 <= buffer.len())
        .ok_or_else(|| SplitError::InvalidFormat("ZIP64 EOCD locator not found".to_string()))?;

    // signature(4), disk with zip64 eocd(4), offset of zip64 eocd(8), total disks(4)
    let zip64_eocd_offset = le_u64(&buffer[locator_pos + 8..locator_pos + 16]);

    file.seek(SeekFrom::Start(zip64_eocd_offset))?;

    let sig = read_u32_le(file)?;
    if sig != ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE {
        return Err(SplitError::InvalidFormat(format!(
            "Invalid ZIP64 EOCD signature: 0x{:08x}",
            sig
        )));
    }

    // record size(8), version made by(2), version needed(2), disk(4), cd start disk(4)
    file.seek(SeekFrom::Current(20))?;

    let _entries_on_disk = read_u64_le(file)?;
    let total_entries = read_u64_le(file)?;
    let _cd_size = read_u64_le(file)?;
    let cd_offset = read_u64_le(file)?;

    Ok((total_entries, cd_offset))
}

/// Find the end of central directory record by scanning from the end of the file
fn find_eocd<R: Read + Seek>(file: &mut R, file_size: u64) -> Result<u64> {
    if file_size < 22 {
        return Err(SplitError::InvalidFormat(
            "File too small to be a ZIP archive".to_string(),
        ));
    }

    let search_start = file_size.saturating_sub(EOCD_SEARCH_WINDOW);
    file.seek(SeekFrom::Start(search_start))?;

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    rfind_signature(&buffer, [0x50, 0x4b, 0x05, 0x06])
        .map(|i| search_start + i as u64)
        .ok_or_else(|| {
            SplitError::InvalidFormat("End of central directory not found".to_string())
        })
}

fn rfind_signature(buffer: &[u8], signature: [u8; 4]) -> Option<usize> {
    buffer.windows(4).rposition(|w| w == signature)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

fn read_u16_le<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32_le<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
