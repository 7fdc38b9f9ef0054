//! PCM hashing utilities.

use std::path::Path;

use crate::error::WavResult;
use crate::reader::WavReader;

/// Samples hashed per read when streaming a file through BLAKE3.
const HASH_BLOCK_SAMPLES: usize = 1 << 16;

/// BLAKE3 hash of the raw data-chunk bytes of a WAV file.
///
/// Headers and non-audio chunks are excluded, so two files with identical
/// samples hash the same regardless of metadata.
pub fn compute_pcm_hash(path: impl AsRef<Path>) -> WavResult<String> {
    let mut reader = WavReader::open(path)?;
    let mut hasher = blake3::Hasher::new();
    while reader.samples_remaining() > 0 {
        let count = reader.samples_remaining().min(HASH_BLOCK_SAMPLES);
        hasher.update(reader.read_raw(count)?);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// BLAKE3 hash of an in-memory PCM byte buffer.
pub fn hash_pcm_bytes(pcm: &[u8]) -> String {
    blake3::hash(pcm).to_hex().to_string()
}
