//! blockmix mixing engine
//!
//! Accumulates gain-scaled stereo blocks into a shared output block.
//!
//! # Overview
//!
//! - [`mix`] is the checked float entry point, generic over a [`MixKernel`]
//!   ([`Scalar`], [`Simd128`], [`Simd256`], [`Simd512`]).
//! - [`mix_i16`] is the integer-domain variant on native 16-bit samples.
//! - [`AlignedBlock`] provides float buffers aligned for the widest kernel.
//!
//! Every SIMD kernel multiplies against an alternating `[L, R, L, R, ...]`
//! gain vector with `wide`'s `mul_add` and matches [`Scalar`] within float
//! rounding. `mul_add` is a single fused instruction only when the `fma`
//! target feature is enabled; the workspace `.cargo/config.toml` turns on
//! `avx2` and `fma` for x86_64. Other targets get a separate multiply and
//! add.
//!
//! # Example
//!
//! ```
//! use blockmix_mixer::{mix, AlignedBlock, GainPair, Simd256};
//!
//! let input = AlignedBlock::from_slice(&[1.0, 1.0]);
//! let mut output = AlignedBlock::zeroed(2);
//! mix::<Simd256>(&input, &mut output, GainPair::new(0.5, 0.25)).unwrap();
//! assert_eq!(&output[..], &[0.5, 0.25]);
//! ```

pub mod block;
pub mod error;
pub mod gain;
pub mod kernel;
pub mod mix;


pub use block::{AlignedBlock, BLOCK_ALIGN};
pub use error::{MixError, MixResult};
pub use gain::GainPair;
pub use kernel::{MixKernel, Scalar, Simd128, Simd256, Simd512, Strategy};
pub use mix::{mix, mix_i16};
