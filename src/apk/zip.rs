use std::io::{Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;

const EOCD_SIGNATURE: u32 = 0x06054B50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014B50;
const LOCAL_HEADER_SIGNATURE: u32 = 0x04034B50;

const EOCD_MIN_SIZE: usize = 22;
const MAX_COMMENT_SIZE: usize = 65535;
const CENTRAL_HEADER_SIZE: usize = 46;
const LOCAL_HEADER_SIZE: usize = 30;

pub const COMPRESSION_STORED: u16 = 0;
pub const COMPRESSION_DEFLATE: u16 = 8;

#[derive(Debug)]
pub enum ZipError {
    Io(String),
    Format(String),
    UnsupportedCompression(u16),
}

impl std::fmt::Display for ZipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipError::Io(msg) => write!(f, "I/O error: {}", msg),
            ZipError::Format(msg) => write!(f, "Malformed archive: {}", msg),
            ZipError::UnsupportedCompression(method) => {
                write!(f, "Unsupported compression method {}", method)
            }
        }
    }
}

impl std::error::Error for ZipError {}

impl From<std::io::Error> for ZipError {
    fn from(error: std::io::Error) -> Self {
        ZipError::Io(error.to_string())
    }
}

/// A central-directory record, enough to locate and decode the entry.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub compression: u16,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Locates the end-of-central-directory record in the file tail (the
/// comment can push it up to 65 535 bytes from the end) and walks the
/// central directory.
pub fn read_central_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<ZipEntry>, ZipError> {
    let file_length = reader.seek(SeekFrom::End(0))?;
    let tail_length = file_length.min((EOCD_MIN_SIZE + MAX_COMMENT_SIZE) as u64);
    if (tail_length as usize) < EOCD_MIN_SIZE {
        return Err(ZipError::Format(String::from("file too short for an archive")));
    }

    reader.seek(SeekFrom::Start(file_length - tail_length))?;
    let mut tail = vec![0u8; tail_length as usize];
    reader.read_exact(&mut tail)?;

    let eocd_start = (0..=tail.len() - EOCD_MIN_SIZE)
        .rev()
        .find(|&start| read_u32(&tail, start) == EOCD_SIGNATURE)
        .ok_or_else(|| ZipError::Format(String::from("end of central directory not found")))?;

    let declared_entries = read_u16(&tail, eocd_start + 10) as usize;
    let central_size = read_u32(&tail, eocd_start + 12) as usize;
    let central_offset = read_u32(&tail, eocd_start + 16) as u64;

    reader.seek(SeekFrom::Start(central_offset))?;
    let mut central = vec![0u8; central_size];
    reader.read_exact(&mut central)?;

    let mut entries = Vec::new();
    let mut position = 0;
    while central.len().saturating_sub(position) >= CENTRAL_HEADER_SIZE {
        if read_u32(&central, position) != CENTRAL_HEADER_SIGNATURE {
            break;
        }

        let compression = read_u16(&central, position + 10);
        let compressed_size = read_u32(&central, position + 20);
        let uncompressed_size = read_u32(&central, position + 24);
        let name_length = read_u16(&central, position + 28) as usize;
        let extra_length = read_u16(&central, position + 30) as usize;
        let comment_length = read_u16(&central, position + 32) as usize;
        let local_header_offset = read_u32(&central, position + 42);

        let name_start = position + CENTRAL_HEADER_SIZE;
        let name_end = name_start + name_length;
        if name_end > central.len() {
            break;
        }
        let name = String::from_utf8_lossy(&central[name_start..name_end]).into_owned();

        entries.push(ZipEntry {
            name,
            compression,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        });

        position = name_end + extra_length + comment_length;
    }

    if declared_entries > 0 && entries.len() > declared_entries {
        entries.truncate(declared_entries);
    }

    Ok(entries)
}

/// Resolves the entry's local header to find the data, then returns the
/// payload, inflating method-8 entries to their declared size.
pub fn read_entry<R: Read + Seek>(reader: &mut R, entry: &ZipEntry) -> Result<Vec<u8>, ZipError> {
    reader.seek(SeekFrom::Start(entry.local_header_offset as u64))?;
    let mut header = [0u8; LOCAL_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if read_u32(&header, 0) != LOCAL_HEADER_SIGNATURE {
        return Err(ZipError::Format(format!(
            "bad local header for {}",
            entry.name
        )));
    }

    let name_length = read_u16(&header, 26) as i64;
    let extra_length = read_u16(&header, 28) as i64;
    reader.seek(SeekFrom::Current(name_length + extra_length))?;

    let mut compressed = vec![0u8; entry.compressed_size as usize];
    reader.read_exact(&mut compressed)?;

    match entry.compression {
        COMPRESSION_STORED => Ok(compressed),
        COMPRESSION_DEFLATE => inflate(&compressed, entry.uncompressed_size as usize),
        method => Err(ZipError::UnsupportedCompression(method)),
    }
}

fn inflate(compressed: &[u8], expected_length: usize) -> Result<Vec<u8>, ZipError> {
    let mut output = Vec::with_capacity(expected_length);
    let mut decoder = DeflateDecoder::new(compressed).take(expected_length as u64 + 1);
    decoder.read_to_end(&mut output)?;

    if output.len() != expected_length {
        return Err(ZipError::Format(format!(
            "inflated to {} bytes, expected {}",
            output.len(),
            expected_length
        )));
    }
    Ok(output)
}
