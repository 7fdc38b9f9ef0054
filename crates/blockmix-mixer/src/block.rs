//! Sample buffers aligned for every vector width.

use std::fmt;
use std::ops::{Deref, DerefMut};

use bytemuck::{Pod, Zeroable};

/// Alignment of every [`AlignedBlock`], in bytes. Covers the widest strategy.
pub const BLOCK_ALIGN: usize = 64;

/// Samples held by one storage unit.
const UNIT_SAMPLES: usize = BLOCK_ALIGN / std::mem::size_of::<f32>();

/// One 64-byte, 64-byte-aligned run of samples.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct Unit([f32; UNIT_SAMPLES]);

/// A heap-allocated float block whose first sample sits on a
/// [`BLOCK_ALIGN`] boundary.
///
/// Dereferences to `[f32]` of exactly [`AlignedBlock::len`] samples.
#[derive(Clone)]
pub struct AlignedBlock {
    storage: Vec<Unit>,
    len: usize,
}

impl AlignedBlock {
    /// A block of `len` zeroed samples.
    pub fn zeroed(len: usize) -> Self {
        let units = (len + UNIT_SAMPLES - 1) / UNIT_SAMPLES;
        Self {
            storage: vec![Unit::zeroed(); units],
            len,
        }
    }

    /// A block holding a copy of `samples`.
    pub fn from_slice(samples: &[f32]) -> Self {
        let mut block = Self::zeroed(samples.len());
        block.copy_from_slice(samples);
        block
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &bytemuck::cast_slice::<Unit, f32>(&self.storage)[..self.len]
    }

    /// Samples as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut bytemuck::cast_slice_mut::<Unit, f32>(&mut self.storage)[..self.len]
    }

    /// Zeroes every sample. Must run before each accumulation pass.
    pub fn clear(&mut self) {
        self.as_mut_slice().fill(0.0);
    }
}

impl Deref for AlignedBlock {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl DerefMut for AlignedBlock {
    fn deref_mut(&mut self) -> &mut [f32] {
        self.as_mut_slice()
    }
}

impl fmt::Debug for AlignedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl PartialEq for AlignedBlock {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
