//! Streaming WAV writer with a deferred header.
//!
//! The header is written once at construction with a zero data size so that
//! sample blocks can be appended straight away, and written again with the
//! real sizes by [`WavWriter::finalize`].

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::chunk::{ChunkHeader, ChunkId};
use crate::codec::{bytes_for, encode_f32_to_pcm16, encode_i16_to_pcm16};
use crate::error::{WavError, WavResult};
use crate::format::FormatDescriptor;

/// Block-oriented 16-bit PCM writer.
///
/// Dropping a writer that was never finalized rewrites the header on a
/// best-effort basis; errors at that point are only logged.
#[derive(Debug)]
pub struct WavWriter<W: Write + Seek> {
    inner: Option<W>,
    format: FormatDescriptor,
    data_bytes: u64,
    samples_written: u64,
    scratch: Vec<u8>,
}

impl WavWriter<BufWriter<File>> {
    /// Creates (or truncates) a file and writes the provisional header.
    pub fn create(path: impl AsRef<Path>, format: FormatDescriptor) -> WavResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| WavError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "created wav output");
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write + Seek> WavWriter<W> {
    /// Wraps `inner` and writes the provisional header at its current start.
    pub fn new(mut inner: W, format: FormatDescriptor) -> WavResult<Self> {
        if format.bits_per_sample != 16 {
            return Err(WavError::unsupported(format!(
                "writer only produces 16-bit PCM, requested {} bits",
                format.bits_per_sample
            )));
        }
        if format.channels == 0 {
            return Err(WavError::malformed("output format declares zero channels"));
        }

        write_header(&mut inner, &format, 0)?;
        Ok(Self {
            inner: Some(inner),
            format,
            data_bytes: 0,
            samples_written: 0,
            scratch: Vec::new(),
        })
    }

    /// Encodes normalized floats and appends them to the data chunk.
    ///
    /// Values outside `[-1.0, 1.0)` wrap; see
    /// [`encode_f32_to_pcm16`](crate::codec::encode_f32_to_pcm16).
    pub fn write(&mut self, samples: &[f32]) -> WavResult<()> {
        let bytes = self.prepare_scratch(samples.len())?;
        encode_f32_to_pcm16(samples, &mut self.scratch[..bytes]);
        self.append(samples.len(), bytes)
    }

    /// Appends 16-bit samples to the data chunk unchanged.
    pub fn write_i16(&mut self, samples: &[i16]) -> WavResult<()> {
        let bytes = self.prepare_scratch(samples.len())?;
        encode_i16_to_pcm16(samples, &mut self.scratch[..bytes]);
        self.append(samples.len(), bytes)
    }

    /// Rewrites the header with the final sizes and flushes.
    ///
    /// Returns the underlying stream positioned after the header.
    pub fn finalize(mut self) -> WavResult<W> {
        self.rewrite_header()?;
        let inner = self.inner.take().ok_or_else(finalized_error)?;
        debug!(
            samples = self.samples_written,
            data_bytes = self.data_bytes,
            "finalized wav output"
        );
        Ok(inner)
    }

    /// Output format.
    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Interleaved samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Bytes written to the data chunk so far.
    pub fn data_bytes_written(&self) -> u64 {
        self.data_bytes
    }

    fn prepare_scratch(&mut self, sample_count: usize) -> WavResult<usize> {
        let bytes = bytes_for(sample_count, self.format.bits_per_sample);
        let total = self.data_bytes + bytes as u64;
        if total > max_data_bytes(&self.format) {
            return Err(WavError::DataTooLarge { bytes: total });
        }
        if self.scratch.len() < bytes {
            trace!(from = self.scratch.len(), to = bytes, "growing write scratch buffer");
            self.scratch.resize(bytes, 0);
        }
        Ok(bytes)
    }

    fn append(&mut self, sample_count: usize, bytes: usize) -> WavResult<()> {
        let inner = self.inner.as_mut().ok_or_else(finalized_error)?;
        inner.write_all(&self.scratch[..bytes])?;
        self.data_bytes += bytes as u64;
        self.samples_written += sample_count as u64;
        Ok(())
    }

    fn rewrite_header(&mut self) -> WavResult<()> {
        let inner = self.inner.as_mut().ok_or_else(finalized_error)?;
        inner.seek(SeekFrom::Start(0))?;
        // Bounded by max_data_bytes on every append.
        write_header(inner, &self.format, self.data_bytes as u32)?;
        inner.flush()?;
        Ok(())
    }
}

impl<W: Write + Seek> Drop for WavWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            if let Err(e) = self.rewrite_header() {
                warn!(error = %e, "failed to finalize wav output on drop");
            }
        }
    }
}

/// Byte length of the header [`WavWriter`] writes for `format`.
pub fn header_len(format: &FormatDescriptor) -> u64 {
    12 + ChunkHeader::SIZE + u64::from(format.payload_size()) + ChunkHeader::SIZE
}

/// RIFF chunk size for a file holding `data_size` bytes of samples.
pub fn riff_size(format: &FormatDescriptor, data_size: u32) -> u32 {
    4 + 8 + format.payload_size() + 8 + data_size
}

fn max_data_bytes(format: &FormatDescriptor) -> u64 {
    u64::from(u32::MAX) - (header_len(format) - 8)
}

fn write_header<W: Write>(writer: &mut W, format: &FormatDescriptor, data_size: u32) -> WavResult<()> {
    ChunkHeader::new(ChunkId::RIFF, riff_size(format, data_size)).write_to(writer)?;
    ChunkId::WAVE.write_to(writer)?;
    ChunkHeader::new(ChunkId::FMT, format.payload_size()).write_to(writer)?;
    format.write_payload(writer)?;
    ChunkHeader::new(ChunkId::DATA, data_size).write_to(writer)?;
    Ok(())
}

fn finalized_error() -> WavError {
    WavError::Io(io::Error::new(
        io::ErrorKind::Other,
        "wav writer has already been finalized",
    ))
}
