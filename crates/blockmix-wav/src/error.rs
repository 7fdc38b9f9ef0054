//! Error types for the WAV codec.

use std::path::PathBuf;

use thiserror::Error;

use crate::chunk::ChunkId;

/// Result type for WAV operations.
pub type WavResult<T> = Result<T, WavError>;

/// Errors that can occur while reading or writing WAV streams.
#[derive(Debug, Error)]
pub enum WavError {
    /// The file could not be opened for reading or writing.
    #[error("cannot open '{}': {source}", path.display())]
    Format {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required leading identifier (RIFF or WAVE) did not match.
    #[error("could not find {expected} chunk (found '{found}')")]
    Chunk {
        /// Identifier that was required.
        expected: ChunkId,
        /// Identifier actually present in the stream.
        found: ChunkId,
    },

    /// The chunk walk finished without seeing a required chunk.
    #[error("missing '{id}' chunk")]
    MissingChunk {
        /// Identifier of the absent chunk.
        id: ChunkId,
    },

    /// A chunk was present but its payload cannot be interpreted.
    #[error("malformed chunk: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },

    /// The stream uses a format this codec does not handle.
    #[error("unsupported format: {message}")]
    UnsupportedFormat {
        /// Description of the problem.
        message: String,
    },

    /// A block read asked for more samples than the stream can supply.
    #[error("incomplete read: requested {requested} samples, {remaining} remaining")]
    IncompleteRead {
        /// Samples requested by the caller.
        requested: usize,
        /// Samples left in the data chunk at the time of the call.
        remaining: usize,
    },

    /// Writing would overflow the 32-bit RIFF size fields.
    #[error("data chunk would grow to {bytes} bytes, beyond the RIFF size limit")]
    DataTooLarge {
        /// Data chunk size the write would have produced.
        bytes: u64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WavError {
    /// Creates a malformed chunk error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Stable error code for diagnostics output.
    pub fn code(&self) -> &'static str {
        match self {
            WavError::Format { .. } => "WAV_001",
            WavError::Chunk { .. } => "WAV_002",
            WavError::MissingChunk { .. } => "WAV_003",
            WavError::Malformed { .. } => "WAV_004",
            WavError::UnsupportedFormat { .. } => "WAV_005",
            WavError::IncompleteRead { .. } => "WAV_006",
            WavError::DataTooLarge { .. } => "WAV_007",
            WavError::Io(_) => "WAV_008",
        }
    }

    /// Returns true if the error was raised while opening a stream.
    ///
    /// Open-time errors are fatal for a run; an [`WavError::IncompleteRead`]
    /// leaves the reader usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WavError::IncompleteRead { .. })
    }
}
