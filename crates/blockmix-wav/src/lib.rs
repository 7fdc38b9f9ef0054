//! blockmix streaming WAV codec
//!
//! Reads and writes 16-bit PCM RIFF/WAVE files one block at a time, without
//! loading whole files into memory.
//!
//! # Overview
//!
//! - [`WavReader`] walks the chunk list once at open time, then streams
//!   fixed-size sample blocks out of the `data` chunk.
//! - [`WavWriter`] writes a provisional header immediately, appends encoded
//!   blocks, and rewrites the header with the real sizes when finalized.
//! - [`codec`] holds the stateless byte/sample conversions both sides use.
//!
//! All multi-byte fields are serialized field by field in little-endian
//! order; nothing depends on in-memory struct layout.
//!
//! # Example
//!
//! ```no_run
//! use blockmix_wav::{FormatDescriptor, WavReader, WavWriter};
//!
//! let mut reader = WavReader::open("in.wav")?;
//! let mut writer = WavWriter::create("out.wav", FormatDescriptor::stereo16(48000))?;
//! let mut block = vec![0.0f32; 4096];
//! while reader.samples_remaining() >= block.len() {
//!     reader.read(&mut block)?;
//!     writer.write(&block)?;
//! }
//! writer.finalize()?;
//! # Ok::<(), blockmix_wav::WavError>(())
//! ```

pub mod chunk;
pub mod codec;
pub mod error;
pub mod format;
pub mod pcm;
pub mod reader;
pub mod writer;


pub use chunk::{ChunkHeader, ChunkId};
pub use error::{WavError, WavResult};
pub use format::{ExtensibleFields, FormatDescriptor, FormatTag};
pub use pcm::{compute_pcm_hash, hash_pcm_bytes};
pub use reader::WavReader;
pub use writer::{header_len, riff_size, WavWriter};
