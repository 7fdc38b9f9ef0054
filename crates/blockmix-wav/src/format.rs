//! `fmt ` chunk payload.

use std::fmt;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::error::{WavError, WavResult};

/// Size of the base `fmt ` payload shared by every WAVE format.
pub const BASE_FMT_SIZE: u32 = 16;
/// Size of the extensible-format fields that follow `cbSize`.
const EXTENSIBLE_EXTRA_SIZE: u16 = 22;

/// WAVE format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    /// Integer PCM (0x0001).
    Pcm,
    /// IEEE float (0x0003).
    Float,
    /// A-law (0x0006).
    ALaw,
    /// Mu-law (0x0007).
    MuLaw,
    /// WAVE_FORMAT_EXTENSIBLE (0xFFFE).
    Extensible,
    /// Any other registered or vendor code.
    Other(u16),
}

impl FormatTag {
    /// Decodes a raw format code.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x0001 => FormatTag::Pcm,
            0x0003 => FormatTag::Float,
            0x0006 => FormatTag::ALaw,
            0x0007 => FormatTag::MuLaw,
            0xFFFE => FormatTag::Extensible,
            other => FormatTag::Other(other),
        }
    }

    /// Raw format code as stored on disk.
    pub fn raw(self) -> u16 {
        match self {
            FormatTag::Pcm => 0x0001,
            FormatTag::Float => 0x0003,
            FormatTag::ALaw => 0x0006,
            FormatTag::MuLaw => 0x0007,
            FormatTag::Extensible => 0xFFFE,
            FormatTag::Other(raw) => raw,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Pcm => write!(f, "PCM"),
            FormatTag::Float => write!(f, "IEEE float"),
            FormatTag::ALaw => write!(f, "A-law"),
            FormatTag::MuLaw => write!(f, "mu-law"),
            FormatTag::Extensible => write!(f, "extensible"),
            FormatTag::Other(raw) => write!(f, "0x{:04x}", raw),
        }
    }
}

/// Fields carried only by WAVE_FORMAT_EXTENSIBLE payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtensibleFields {
    /// Bits of real precision inside each container sample.
    pub valid_bits_per_sample: u16,
    /// Speaker position bitmask.
    pub channel_mask: u32,
    /// Sub-format GUID bytes in file order.
    pub sub_format: [u8; 16],
}

/// Parsed `fmt ` chunk.
///
/// `block_align` and `avg_bytes_per_sec` are stored as read; a descriptor
/// built with [`FormatDescriptor::pcm16`] always satisfies
/// [`FormatDescriptor::is_consistent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Format code.
    pub format_tag: FormatTag,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bytes per second (`sample_rate * block_align`).
    pub avg_bytes_per_sec: u32,
    /// Bytes per multi-channel frame (`bits_per_sample / 8 * channels`).
    pub block_align: u16,
    /// Container bits per sample.
    pub bits_per_sample: u16,
    /// `cbSize`, present when the payload is 18 bytes or longer.
    pub cb_size: Option<u16>,
    /// Extensible-format fields, present when `cbSize >= 22`.
    pub extensible: Option<ExtensibleFields>,
}

impl FormatDescriptor {
    /// 16-bit integer PCM with derived frame and rate fields.
    pub fn pcm16(channels: u16, sample_rate: u32) -> Self {
        let bits_per_sample = 16;
        let block_align = bits_per_sample / 8 * channels;
        Self {
            format_tag: FormatTag::Pcm,
            channels,
            sample_rate,
            avg_bytes_per_sec: sample_rate * u32::from(block_align),
            block_align,
            bits_per_sample,
            cb_size: Some(0),
            extensible: None,
        }
    }

    /// Stereo 16-bit PCM.
    pub fn stereo16(sample_rate: u32) -> Self {
        Self::pcm16(2, sample_rate)
    }

    /// Bytes per single-channel sample.
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Checks the frame-size and byte-rate invariants.
    pub fn is_consistent(&self) -> bool {
        let block_align = u32::from(self.bytes_per_sample()) * u32::from(self.channels);
        u32::from(self.block_align) == block_align
            && u64::from(self.avg_bytes_per_sec)
                == u64::from(self.sample_rate) * u64::from(self.block_align)
    }

    /// Size of the payload [`FormatDescriptor::write_payload`] produces.
    pub fn payload_size(&self) -> u32 {
        let mut size = BASE_FMT_SIZE;
        if self.cb_size.is_some() || self.extensible.is_some() {
            size += 2;
        }
        if self.extensible.is_some() {
            size += u32::from(EXTENSIBLE_EXTRA_SIZE);
        }
        size
    }

    /// Reads a payload of `chunk_size` bytes.
    ///
    /// Consumes at most the fields it understands; the caller is expected to
    /// seek to the end of the chunk afterwards.
    pub fn read_payload<R: Read>(reader: &mut R, chunk_size: u32) -> WavResult<Self> {
        if chunk_size < BASE_FMT_SIZE {
            return Err(WavError::malformed(format!(
                "fmt chunk too small: {} bytes (minimum {})",
                chunk_size, BASE_FMT_SIZE
            )));
        }

        let format_tag = FormatTag::from_raw(reader.read_u16::<LittleEndian>()?);
        let channels = reader.read_u16::<LittleEndian>()?;
        let sample_rate = reader.read_u32::<LittleEndian>()?;
        let avg_bytes_per_sec = reader.read_u32::<LittleEndian>()?;
        let block_align = reader.read_u16::<LittleEndian>()?;
        let bits_per_sample = reader.read_u16::<LittleEndian>()?;

        let mut cb_size = None;
        let mut extensible = None;
        if chunk_size >= BASE_FMT_SIZE + 2 {
            let size = reader.read_u16::<LittleEndian>()?;
            cb_size = Some(size);
            let full = BASE_FMT_SIZE + 2 + u32::from(EXTENSIBLE_EXTRA_SIZE);
            if size >= EXTENSIBLE_EXTRA_SIZE && chunk_size >= full {
                let valid_bits_per_sample = reader.read_u16::<LittleEndian>()?;
                let channel_mask = reader.read_u32::<LittleEndian>()?;
                let mut sub_format = [0u8; 16];
                reader.read_exact(&mut sub_format)?;
                extensible = Some(ExtensibleFields {
                    valid_bits_per_sample,
                    channel_mask,
                    sub_format,
                });
            }
        }

        Ok(Self {
            format_tag,
            channels,
            sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            cb_size,
            extensible,
        })
    }

    /// Writes the payload field by field, little-endian.
    pub fn write_payload<W: Write>(&self, writer: &mut W) -> WavResult<()> {
        writer.write_u16::<LittleEndian>(self.format_tag.raw())?;
        writer.write_u16::<LittleEndian>(self.channels)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u32::<LittleEndian>(self.avg_bytes_per_sec)?;
        writer.write_u16::<LittleEndian>(self.block_align)?;
        writer.write_u16::<LittleEndian>(self.bits_per_sample)?;

        match (&self.extensible, self.cb_size) {
            (Some(ext), cb_size) => {
                writer.write_u16::<LittleEndian>(
                    cb_size.unwrap_or(EXTENSIBLE_EXTRA_SIZE).max(EXTENSIBLE_EXTRA_SIZE),
                )?;
                writer.write_u16::<LittleEndian>(ext.valid_bits_per_sample)?;
                writer.write_u32::<LittleEndian>(ext.channel_mask)?;
                writer.write_all(&ext.sub_format)?;
            }
            (None, Some(_)) => writer.write_u16::<LittleEndian>(0)?,
            (None, None) => {}
        }
        Ok(())
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "format tag:        {} (0x{:04x})", self.format_tag, self.format_tag.raw())?;
        writeln!(f, "channels:          {}", self.channels)?;
        writeln!(f, "sample rate:       {} Hz", self.sample_rate)?;
        writeln!(f, "avg bytes/sec:     {}", self.avg_bytes_per_sec)?;
        writeln!(f, "block align:       {}", self.block_align)?;
        write!(f, "bits per sample:   {}", self.bits_per_sample)?;
        if let Some(cb_size) = self.cb_size {
            write!(f, "\ncb size:           {}", cb_size)?;
        }
        if let Some(ext) = &self.extensible {
            write!(f, "\nvalid bits/sample: {}", ext.valid_bits_per_sample)?;
            write!(f, "\nchannel mask:      0x{:08x}", ext.channel_mask)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_pcm16_invariants() {
        let stereo = FormatDescriptor::pcm16(2, 48000);
        assert_eq!(stereo.block_align, 4);
        assert_eq!(stereo.avg_bytes_per_sec, 192000);
        assert_eq!(stereo.bytes_per_sample(), 2);
        assert!(stereo.is_consistent());

        let mono = FormatDescriptor::pcm16(1, 44100);
        assert_eq!(mono.block_align, 2);
        assert_eq!(mono.avg_bytes_per_sec, 88200);
    }

    #[test]
    fn test_inconsistent_descriptor_detected() {
        let mut format = FormatDescriptor::stereo16(48000);
        format.block_align = 2;
        assert!(!format.is_consistent());
    }

    #[test]
    fn test_payload_is_18_bytes_for_pcm16() {
        let format = FormatDescriptor::stereo16(48000);
        let mut bytes = Vec::new();
        format.write_payload(&mut bytes).unwrap();
        assert_eq!(bytes.len() as u32, format.payload_size());
        assert_eq!(bytes.len(), 18);
        assert_eq!(&bytes[0..2], &[0x01, 0x00]);
        assert_eq!(&bytes[2..4], &[0x02, 0x00]);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 48000);
        assert_eq!(&bytes[16..18], &[0, 0]);
    }

    #[test]
    fn test_read_16_byte_payload() {
        let mut format = FormatDescriptor::stereo16(22050);
        format.cb_size = None;
        let mut bytes = Vec::new();
        format.write_payload(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 16);

        let parsed = FormatDescriptor::read_payload(&mut Cursor::new(bytes), 16).unwrap();
        assert_eq!(parsed, format);
    }

    #[test]
    fn test_read_extensible_payload() {
        let mut format = FormatDescriptor::stereo16(96000);
        format.format_tag = FormatTag::Extensible;
        format.cb_size = Some(22);
        format.extensible = Some(ExtensibleFields {
            valid_bits_per_sample: 16,
            channel_mask: 0x3,
            sub_format: [7u8; 16],
        });
        let mut bytes = Vec::new();
        format.write_payload(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 40);

        let parsed = FormatDescriptor::read_payload(&mut Cursor::new(bytes), 40).unwrap();
        assert_eq!(parsed, format);
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = FormatDescriptor::read_payload(&mut Cursor::new(vec![0u8; 14]), 14).unwrap_err();
        assert!(matches!(err, WavError::Malformed { .. }));
    }

    #[test]
    fn test_format_tag_round_trip() {
        for raw in [0x0001, 0x0003, 0x0006, 0x0007, 0xFFFE, 0x0055] {
            assert_eq!(FormatTag::from_raw(raw).raw(), raw);
        }
        assert_eq!(FormatTag::from_raw(0x0055), FormatTag::Other(0x0055));
    }

    #[test]
    fn test_display_summary() {
        let text = FormatDescriptor::stereo16(48000).to_string();
        assert!(text.contains("PCM"));
        assert!(text.contains("48000 Hz"));
        assert!(text.contains("bits per sample:   16"));
    }
}
