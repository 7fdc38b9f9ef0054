//! Error types for the mixing engine.

use thiserror::Error;

/// Result type for mixing operations.
pub type MixResult<T> = Result<T, MixError>;

/// Contract violations detected before a block is mixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixError {
    /// Block length is not a whole number of stereo pairs.
    #[error("block length {len} is not stereo-aligned")]
    OddLength {
        /// Offending length.
        len: usize,
    },

    /// Input and output blocks differ in length.
    #[error("input block has {input} samples but output block has {output}")]
    LengthMismatch {
        /// Input length.
        input: usize,
        /// Output length.
        output: usize,
    },

    /// A buffer does not start on the strategy's vector boundary.
    #[error("{buffer} buffer at {address:#x} is not {required}-byte aligned for {strategy}")]
    Misaligned {
        /// Which buffer ("input" or "output").
        buffer: &'static str,
        /// Start address of the buffer.
        address: usize,
        /// Required alignment in bytes.
        required: usize,
        /// Strategy that rejected the buffer.
        strategy: &'static str,
    },
}
