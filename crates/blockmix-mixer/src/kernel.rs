//! Vector-width strategies for the accumulation loop.
//!
//! Each strategy is a unit type implementing [`MixKernel`]. Callers pick one
//! at setup time and stay generic over it, so the hot loop is monomorphized
//! and never branches on width.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wide::{f32x4, f32x8};

use crate::gain::GainPair;

/// One accumulation strategy.
pub trait MixKernel {
    /// Configuration name of this strategy.
    const STRATEGY: Strategy;
    /// Samples consumed per vector step.
    const LANES: usize;
    /// Required start alignment of both buffers, in bytes.
    const ALIGNMENT: usize;

    /// Computes `output += input * [L, R, L, R, ...]`.
    ///
    /// Callers guarantee equal, even lengths and the alignment contract;
    /// [`mix`](crate::mix) checks both.
    fn accumulate(input: &[f32], output: &mut [f32], gains: GainPair);
}

/// Plain per-sample loop; the reference every other width must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scalar;

impl MixKernel for Scalar {
    const STRATEGY: Strategy = Strategy::Scalar;
    const LANES: usize = 1;
    const ALIGNMENT: usize = std::mem::align_of::<f32>();

    #[inline]
    fn accumulate(input: &[f32], output: &mut [f32], gains: GainPair) {
        for (out, inp) in output.chunks_exact_mut(2).zip(input.chunks_exact(2)) {
            out[0] += inp[0] * gains.left;
            out[1] += inp[1] * gains.right;
        }
    }
}

/// 128-bit vectors: two stereo pairs per fused multiply-add.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simd128;

impl MixKernel for Simd128 {
    const STRATEGY: Strategy = Strategy::Simd128;
    const LANES: usize = 4;
    const ALIGNMENT: usize = 16;

    #[inline]
    fn accumulate(input: &[f32], output: &mut [f32], gains: GainPair) {
        let g = f32x4::new(gains.interleaved());
        let mut outs = output.chunks_exact_mut(Self::LANES);
        let mut ins = input.chunks_exact(Self::LANES);
        for (out, inp) in (&mut outs).zip(&mut ins) {
            let acc = f32x4::new(lanes(out));
            let x = f32x4::new(lanes(inp));
            out.copy_from_slice(&x.mul_add(g, acc).to_array());
        }
        Scalar::accumulate(ins.remainder(), outs.into_remainder(), gains);
    }
}

/// 256-bit vectors: four stereo pairs per fused multiply-add.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simd256;

impl MixKernel for Simd256 {
    const STRATEGY: Strategy = Strategy::Simd256;
    const LANES: usize = 8;
    const ALIGNMENT: usize = 32;

    #[inline]
    fn accumulate(input: &[f32], output: &mut [f32], gains: GainPair) {
        let g = f32x8::new(gains.interleaved());
        let mut outs = output.chunks_exact_mut(Self::LANES);
        let mut ins = input.chunks_exact(Self::LANES);
        for (out, inp) in (&mut outs).zip(&mut ins) {
            let acc = f32x8::new(lanes(out));
            let x = f32x8::new(lanes(inp));
            out.copy_from_slice(&x.mul_add(g, acc).to_array());
        }
        Scalar::accumulate(ins.remainder(), outs.into_remainder(), gains);
    }
}

/// 512-bit steps: eight stereo pairs per iteration, issued as two 256-bit
/// fused multiply-adds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simd512;

impl MixKernel for Simd512 {
    const STRATEGY: Strategy = Strategy::Simd512;
    const LANES: usize = 16;
    const ALIGNMENT: usize = 64;

    #[inline]
    fn accumulate(input: &[f32], output: &mut [f32], gains: GainPair) {
        // Eight lanes is an even count, so both halves share one pattern.
        let g = f32x8::new(gains.interleaved());
        let mut outs = output.chunks_exact_mut(Self::LANES);
        let mut ins = input.chunks_exact(Self::LANES);
        for (out, inp) in (&mut outs).zip(&mut ins) {
            let (out_lo, out_hi) = out.split_at_mut(8);
            let (in_lo, in_hi) = inp.split_at(8);
            let lo = f32x8::new(lanes(in_lo)).mul_add(g, f32x8::new(lanes(out_lo)));
            let hi = f32x8::new(lanes(in_hi)).mul_add(g, f32x8::new(lanes(out_hi)));
            out_lo.copy_from_slice(&lo.to_array());
            out_hi.copy_from_slice(&hi.to_array());
        }
        Scalar::accumulate(ins.remainder(), outs.into_remainder(), gains);
    }
}

#[inline(always)]
fn lanes<const N: usize>(samples: &[f32]) -> [f32; N] {
    let mut out = [0.0; N];
    out.copy_from_slice(samples);
    out
}

/// Configuration-level name of a [`MixKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// [`Scalar`].
    Scalar,
    /// [`Simd128`].
    Simd128,
    /// [`Simd256`].
    #[default]
    Simd256,
    /// [`Simd512`].
    Simd512,
}

impl Strategy {
    /// Every strategy, narrowest first.
    pub const ALL: [Strategy; 4] = [
        Strategy::Scalar,
        Strategy::Simd128,
        Strategy::Simd256,
        Strategy::Simd512,
    ];

    /// Name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Scalar => "scalar",
            Strategy::Simd128 => "simd128",
            Strategy::Simd256 => "simd256",
            Strategy::Simd512 => "simd512",
        }
    }

    /// Samples consumed per vector step.
    pub fn lanes(self) -> usize {
        match self {
            Strategy::Scalar => Scalar::LANES,
            Strategy::Simd128 => Simd128::LANES,
            Strategy::Simd256 => Simd256::LANES,
            Strategy::Simd512 => Simd512::LANES,
        }
    }

    /// Required buffer alignment in bytes.
    pub fn alignment(self) -> usize {
        match self {
            Strategy::Scalar => Scalar::ALIGNMENT,
            Strategy::Simd128 => Simd128::ALIGNMENT,
            Strategy::Simd256 => Simd256::ALIGNMENT,
            Strategy::Simd512 => Simd512::ALIGNMENT,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown strategy '{}' (expected scalar, simd128, simd256 or simd512)",
                    s
                )
            })
    }
}
