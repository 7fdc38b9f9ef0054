//! RIFF chunk identifiers and headers.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// A four-character RIFF chunk identifier stored as a little-endian `u32`.
///
/// Identifiers compare as integers, so `ChunkId::FMT` matches the bytes
/// `b"fmt "` exactly, trailing space included.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(u32);

impl ChunkId {
    /// Container chunk that opens every file.
    pub const RIFF: ChunkId = ChunkId::from_tag(*b"RIFF");
    /// Form type following the RIFF header.
    pub const WAVE: ChunkId = ChunkId::from_tag(*b"WAVE");
    /// Format description chunk.
    pub const FMT: ChunkId = ChunkId::from_tag(*b"fmt ");
    /// Sample data chunk.
    pub const DATA: ChunkId = ChunkId::from_tag(*b"data");

    /// Builds an identifier from its ASCII tag.
    pub const fn from_tag(tag: [u8; 4]) -> Self {
        ChunkId(u32::from_le_bytes(tag))
    }

    /// Wraps a raw little-endian value as read from disk.
    pub const fn from_raw(raw: u32) -> Self {
        ChunkId(raw)
    }

    /// Raw `u32` value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The four tag bytes in file order.
    pub const fn tag(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Reads a bare identifier (no size field), as used for the WAVE form type.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(ChunkId(reader.read_u32::<LittleEndian>()?))
    }

    /// Writes a bare identifier.
    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.0)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.tag() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{}\")", self)
    }
}

/// Identifier plus payload size, preceding every RIFF sub-chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Payload size in bytes, excluding this header and any pad byte.
    pub size: u32,
}

impl ChunkHeader {
    /// Encoded header size in bytes.
    pub const SIZE: u64 = 8;

    /// Creates a header.
    pub fn new(id: ChunkId, size: u32) -> Self {
        Self { id, size }
    }

    /// Reads a header, returning `None` when the stream ends before a full
    /// header is available.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut raw = [0u8; 8];
        match reader.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        let mut fields = &raw[..];
        let id = ChunkId(fields.read_u32::<LittleEndian>()?);
        let size = fields.read_u32::<LittleEndian>()?;
        Ok(Some(Self { id, size }))
    }

    /// Writes the header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.id.write_to(writer)?;
        writer.write_u32::<LittleEndian>(self.size)
    }

    /// Payload size rounded up to the RIFF word boundary.
    pub fn padded_size(&self) -> u64 {
        let size = u64::from(self.size);
        size + (size & 1)
    }
}
