//! CNK container layout.
//!
//! ```text
//! offset  size  field
//! 0       4     magic ("CNK0".."CNK5", copied through untouched)
//! 4       4     format version (copied through untouched)
//! 8       4     uncompressed size, little endian
//! 12      4     compressed size N, little endian (placeholder, patched last)
//! 16      N     compressed payload
//! 16+N    4     uncompressed size, big endian
//! ```
//!
//! The header is never validated or regenerated: whatever the source
//! carries in its first eight bytes is what the destination gets.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{Codec, CodecParams, DeflateCodec, Direction};
use crate::config::Config;
use crate::error::{CnkError, Result};
use crate::stream::{StreamEngine, Transfer};

/// Size of the pass-through header.
pub const HEADER_LEN: u64 = 8;
/// Size of the two little-endian size fields after the header.
pub const RECORD_LEN: u64 = 8;
/// Offset of the compressed payload from the start of the container.
pub const PAYLOAD_OFFSET: u64 = HEADER_LEN + RECORD_LEN;
/// Size of the big-endian size trailer.
pub const TRAILER_LEN: u64 = 4;
/// Fixed part of the magic; the fourth byte selects the chunk variant.
pub const CNK_TAG: &[u8; 3] = b"CNK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
}

impl ContainerHeader {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: LittleEndian::read_u32(&bytes[4..8]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut out[4..8], self.version);
        out
    }

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_LEN as usize];
        read_exact_or_truncated(reader, &mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Chunk variant 0..=5 for `CNK0`..`CNK5`, `None` for anything else.
    pub fn variant(&self) -> Option<u8> {
        if &self.magic[..3] != CNK_TAG {
            return None;
        }
        match self.magic[3] {
            c @ b'0'..=b'5' => Some(c - b'0'),
            _ => None,
        }
    }

    /// Magic rendered for logs, with non-printable bytes escaped.
    pub fn magic_display(&self) -> String {
        self.magic.escape_ascii().to_string()
    }
}

/// The two size fields that follow the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionRecord {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

impl CompressionRecord {
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; RECORD_LEN as usize];
        read_exact_or_truncated(reader, &mut bytes)?;
        let mut cur = &bytes[..];
        Ok(Self {
            uncompressed_size: cur.read_u32::<LittleEndian>()?,
            compressed_size: cur.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        Ok(())
    }
}

/// Write the byte-swapped copy of the uncompressed size.
pub fn write_trailer<W: Write + ?Sized>(writer: &mut W, uncompressed_size: u32) -> Result<()> {
    writer.write_u32::<BigEndian>(uncompressed_size)?;
    Ok(())
}

pub fn read_trailer<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut bytes = [0u8; TRAILER_LEN as usize];
    read_exact_or_truncated(reader, &mut bytes)?;
    Ok(BigEndian::read_u32(&bytes))
}

/// Outcome of encoding or decoding one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerReport {
    pub header: ContainerHeader,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub transfer: Transfer,
}

/// Encode a container.
///
/// Copies the 8-byte header from `reader`, then compresses the next
/// `payload_len` bytes into `writer`. The compressed size field is written
/// as a placeholder and patched by seeking back once the payload and
/// trailer are out. On return the writer is positioned at the end of the
/// container.
pub fn write_container<R, W>(
    reader: &mut R,
    writer: &mut W,
    payload_len: u64,
    config: &Config,
) -> Result<ContainerReport>
where
    R: Read + ?Sized,
    W: Write + Seek + ?Sized,
{
    config.validate()?;
    let uncompressed_size =
        u32::try_from(payload_len).map_err(|_| CnkError::SizeOverflow(payload_len))?;
    let mut codec = DeflateCodec::new(Direction::Encode, CodecParams { level: config.level })?;
    let mut engine = StreamEngine::new(config.buffer_capacity)?;

    let header = ContainerHeader::read_from(reader)?;
    if header.variant().is_none() {
        warn!(magic = %header.magic_display(), "unrecognised magic, copying through");
    }
    let start = writer.stream_position()?;
    header.write_to(writer)?;

    // Both fields start out as the uncompressed size; the second one is
    // overwritten below once the compressed length is known.
    CompressionRecord {
        uncompressed_size,
        compressed_size: uncompressed_size,
    }
    .write_to(writer)?;

    let transfer = engine.run(&mut codec, reader, writer, payload_len)?;
    codec.finish()?;

    write_trailer(writer, uncompressed_size)?;
    let end = writer.stream_position()?;

    let payload_bytes = end - start - PAYLOAD_OFFSET - TRAILER_LEN;
    let compressed_size =
        u32::try_from(payload_bytes).map_err(|_| CnkError::SizeOverflow(payload_bytes))?;
    if payload_bytes != transfer.total_out {
        return Err(CnkError::SizeMismatch {
            field: "compressed size",
            expected: transfer.total_out,
            actual: payload_bytes,
        });
    }

    writer.seek(SeekFrom::Start(start + HEADER_LEN + 4))?;
    writer.write_u32::<LittleEndian>(compressed_size)?;
    writer.seek(SeekFrom::Start(end))?;
    writer.flush()?;

    info!(
        magic = %header.magic_display(),
        version = header.version,
        uncompressed_size,
        compressed_size,
        "container encoded"
    );
    Ok(ContainerReport {
        header,
        uncompressed_size,
        compressed_size,
        transfer,
    })
}

/// Decode a container.
///
/// The compressed region is taken to be everything between the size
/// fields and the trailer, as measured from the length of `reader`. The
/// stored compressed size is reported but not relied on.
pub fn read_container<R, W>(reader: &mut R, writer: &mut W, config: &Config) -> Result<ContainerReport>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    config.validate()?;
    let start = reader.stream_position()?;
    let source_len = reader.seek(SeekFrom::End(0))? - start;
    reader.seek(SeekFrom::Start(start))?;

    let mut codec = DeflateCodec::new(Direction::Decode, CodecParams { level: config.level })?;
    let mut engine = StreamEngine::new(config.buffer_capacity)?;

    let header = ContainerHeader::read_from(reader)?;
    header.write_to(writer)?;

    if source_len < PAYLOAD_OFFSET + TRAILER_LEN {
        return Err(CnkError::TruncatedInput {
            expected: PAYLOAD_OFFSET + TRAILER_LEN,
            actual: source_len,
        });
    }
    let record = CompressionRecord::read_from(reader)?;
    let payload_len = source_len - PAYLOAD_OFFSET - TRAILER_LEN;
    debug!(
        payload_len,
        stored_compressed_size = record.compressed_size,
        "reading container payload"
    );

    let transfer = engine.run(&mut codec, reader, writer, payload_len)?;
    codec.finish()?;
    writer.flush()?;

    // The engine may stop short of the region if the stream ends early.
    reader.seek(SeekFrom::Start(start + PAYLOAD_OFFSET + payload_len))?;
    let trailer = read_trailer(reader)?;

    if config.verify_sizes {
        if trailer != record.uncompressed_size {
            return Err(CnkError::SizeMismatch {
                field: "trailer size",
                expected: record.uncompressed_size as u64,
                actual: trailer as u64,
            });
        }
        if transfer.total_out != record.uncompressed_size as u64 {
            return Err(CnkError::SizeMismatch {
                field: "uncompressed size",
                expected: record.uncompressed_size as u64,
                actual: transfer.total_out,
            });
        }
    } else if trailer != record.uncompressed_size {
        warn!(
            leading = record.uncompressed_size,
            trailer, "size fields disagree, verification disabled"
        );
    }

    info!(
        magic = %header.magic_display(),
        version = header.version,
        uncompressed_size = transfer.total_out,
        "container decoded"
    );
    Ok(ContainerReport {
        header,
        uncompressed_size: record.uncompressed_size,
        compressed_size: record.compressed_size,
        transfer,
    })
}

fn read_exact_or_truncated<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(CnkError::TruncatedInput {
                    expected: buf.len() as u64,
                    actual: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
