//! Streaming WAV reader.
//!
//! The chunk list is walked once when the reader is constructed. After that
//! the stream is positioned on the first byte of the `data` payload and every
//! block read pulls exactly the bytes it needs through a grow-only scratch
//! buffer.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::chunk::{ChunkHeader, ChunkId};
use crate::codec::{bytes_for, decode_pcm16_to_f32, decode_pcm16_to_i16, decode_pcm24_to_f32};
use crate::error::{WavError, WavResult};
use crate::format::{FormatDescriptor, FormatTag};

/// Block-oriented reader over the `data` chunk of a RIFF/WAVE stream.
#[derive(Debug)]
pub struct WavReader<R> {
    inner: R,
    format: FormatDescriptor,
    data_offset: u64,
    data_size: u32,
    total_samples: usize,
    position: usize,
    scratch: Vec<u8>,
}

impl WavReader<BufReader<File>> {
    /// Opens a file and parses its chunk list.
    pub fn open(path: impl AsRef<Path>) -> WavResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| WavError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened wav input");
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> WavReader<R> {
    /// Parses the chunk list of `inner` and positions it at the sample data.
    pub fn new(mut inner: R) -> WavResult<Self> {
        let riff = ChunkHeader::read_from(&mut inner)?
            .ok_or_else(|| WavError::malformed("stream too short for a RIFF header"))?;
        if riff.id != ChunkId::RIFF {
            return Err(WavError::Chunk {
                expected: ChunkId::RIFF,
                found: riff.id,
            });
        }

        let form = match ChunkId::read_from(&mut inner) {
            Ok(id) => id,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(WavError::malformed("stream ends before the WAVE form type"))
            }
            Err(e) => return Err(e.into()),
        };
        if form != ChunkId::WAVE {
            return Err(WavError::Chunk {
                expected: ChunkId::WAVE,
                found: form,
            });
        }
        trace!(riff_size = riff.size, "found RIFF/WAVE header");

        let mut format = None;
        let mut data = None;

        while let Some(header) = ChunkHeader::read_from(&mut inner)? {
            let start = inner.stream_position()?;
            match header.id {
                ChunkId::FMT if format.is_none() => {
                    format = Some(FormatDescriptor::read_payload(&mut inner, header.size)?);
                }
                ChunkId::DATA if data.is_none() => {
                    data = Some((start, header.size));
                }
                id => {
                    debug!(chunk = %id, size = header.size, "skipping chunk");
                }
            }
            inner.seek(SeekFrom::Start(start + header.padded_size()))?;
        }

        let format = format.ok_or(WavError::MissingChunk { id: ChunkId::FMT })?;
        let (data_offset, data_size) = data.ok_or(WavError::MissingChunk { id: ChunkId::DATA })?;
        validate_format(&format)?;

        inner.seek(SeekFrom::Start(data_offset))?;
        let total_samples = data_size as usize / usize::from(format.bytes_per_sample());
        debug!(
            channels = format.channels,
            sample_rate = format.sample_rate,
            bits = format.bits_per_sample,
            data_offset,
            total_samples,
            "parsed wav header"
        );

        Ok(Self {
            inner,
            format,
            data_offset,
            data_size,
            total_samples,
            position: 0,
            scratch: Vec::new(),
        })
    }

    /// Reads `out.len()` samples decoded to normalized floats.
    ///
    /// On error the cursor does not move and `out` is left untouched.
    pub fn read(&mut self, out: &mut [f32]) -> WavResult<()> {
        let bits = self.format.bits_per_sample;
        let raw = self.read_raw(out.len())?;
        match bits {
            24 => decode_pcm24_to_f32(raw, out),
            _ => decode_pcm16_to_f32(raw, out),
        }
        Ok(())
    }

    /// Reads `out.len()` samples as native 16-bit integers.
    ///
    /// Only valid for 16-bit streams.
    pub fn read_i16(&mut self, out: &mut [i16]) -> WavResult<()> {
        if self.format.bits_per_sample != 16 {
            return Err(WavError::unsupported(format!(
                "16-bit integer reads need a 16-bit stream, found {} bits",
                self.format.bits_per_sample
            )));
        }
        let raw = self.read_raw(out.len())?;
        decode_pcm16_to_i16(raw, out);
        Ok(())
    }

    /// Reads the raw bytes of the next `sample_count` samples.
    ///
    /// The returned slice borrows the scratch buffer and is valid until the
    /// next read.
    pub fn read_raw(&mut self, sample_count: usize) -> WavResult<&[u8]> {
        let remaining = self.samples_remaining();
        if sample_count > remaining {
            return Err(WavError::IncompleteRead {
                requested: sample_count,
                remaining,
            });
        }

        let bytes = bytes_for(sample_count, self.format.bits_per_sample);
        if self.scratch.len() < bytes {
            trace!(from = self.scratch.len(), to = bytes, "growing read scratch buffer");
            self.scratch.resize(bytes, 0);
        }

        if let Err(e) = self.inner.read_exact(&mut self.scratch[..bytes]) {
            // Rewind so a failed read leaves the stream where the cursor says.
            let cursor = self.cursor_offset();
            self.inner.seek(SeekFrom::Start(cursor))?;
            if e.kind() == io::ErrorKind::UnexpectedEof {
                warn!(
                    requested = sample_count,
                    remaining, "data chunk shorter than its declared size"
                );
                return Err(WavError::IncompleteRead {
                    requested: sample_count,
                    remaining,
                });
            }
            return Err(e.into());
        }

        self.position += sample_count;
        Ok(&self.scratch[..bytes])
    }

    /// Samples left between the cursor and the end of the data chunk.
    pub fn samples_remaining(&self) -> usize {
        self.total_samples - self.position
    }

    /// Format parsed from the `fmt ` chunk.
    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Interleaved sample count of the data chunk.
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Samples consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// File offset of the first data byte.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Declared size of the data chunk in bytes.
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Current size of the scratch buffer in bytes.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Consumes the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn cursor_offset(&self) -> u64 {
        self.data_offset + bytes_for(self.position, self.format.bits_per_sample) as u64
    }
}

fn validate_format(format: &FormatDescriptor) -> WavResult<()> {
    match format.format_tag {
        FormatTag::Pcm | FormatTag::Extensible => {}
        other => {
            return Err(WavError::unsupported(format!(
                "format tag {} is not integer PCM",
                other
            )))
        }
    }
    if format.channels == 0 {
        return Err(WavError::malformed("fmt chunk declares zero channels"));
    }
    if !matches!(format.bits_per_sample, 16 | 24) {
        return Err(WavError::unsupported(format!(
            "{} bits per sample",
            format.bits_per_sample
        )));
    }
    if !format.is_consistent() {
        warn!(
            block_align = format.block_align,
            avg_bytes_per_sec = format.avg_bytes_per_sec,
            "fmt chunk has inconsistent block align or byte rate"
        );
    }
    Ok(())
}
