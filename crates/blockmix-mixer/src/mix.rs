//! Checked entry points for block accumulation.

use crate::error::{MixError, MixResult};
use crate::gain::GainPair;
use crate::kernel::{MixKernel, Scalar, Simd128, Simd256, Simd512, Strategy};

/// Accumulates `input * gains` into `output` with strategy `K`.
///
/// For every stereo pair `(l, r)`:
/// `output[l] += input[l] * gains.left; output[r] += input[r] * gains.right`.
///
/// Both blocks must have the same even length and, for wide strategies,
/// start on `K::ALIGNMENT`. `output` is accumulated into, never overwritten;
/// clear it before the first contribution of a block.
pub fn mix<K: MixKernel>(input: &[f32], output: &mut [f32], gains: GainPair) -> MixResult<()> {
    check_lengths(input.len(), output.len())?;
    if !input.is_empty() {
        check_alignment::<K>("input", input.as_ptr() as usize)?;
        check_alignment::<K>("output", output.as_ptr() as usize)?;
    }
    K::accumulate(input, output, gains);
    Ok(())
}

impl Strategy {
    /// Mixes one block with the kernel this strategy names.
    ///
    /// Dispatches on every call; loops that mix many blocks should resolve
    /// the kernel once and call [`mix`] generically instead.
    pub fn mix_block(self, input: &[f32], output: &mut [f32], gains: GainPair) -> MixResult<()> {
        match self {
            Strategy::Scalar => mix::<Scalar>(input, output, gains),
            Strategy::Simd128 => mix::<Simd128>(input, output, gains),
            Strategy::Simd256 => mix::<Simd256>(input, output, gains),
            Strategy::Simd512 => mix::<Simd512>(input, output, gains),
        }
    }
}

/// Integer-domain accumulation on native 16-bit samples, without SIMD.
///
/// Each sample becomes `(out + in * gain) as i16`; the float-to-int cast
/// truncates toward zero and saturates at the 16-bit range.
pub fn mix_i16(input: &[i16], output: &mut [i16], gains: GainPair) -> MixResult<()> {
    check_lengths(input.len(), output.len())?;
    for (out, inp) in output.chunks_exact_mut(2).zip(input.chunks_exact(2)) {
        out[0] = (f32::from(out[0]) + f32::from(inp[0]) * gains.left) as i16;
        out[1] = (f32::from(out[1]) + f32::from(inp[1]) * gains.right) as i16;
    }
    Ok(())
}

fn check_lengths(input: usize, output: usize) -> MixResult<()> {
    if input != output {
        return Err(MixError::LengthMismatch { input, output });
    }
    if input % 2 != 0 {
        return Err(MixError::OddLength { len: input });
    }
    Ok(())
}

fn check_alignment<K: MixKernel>(buffer: &'static str, address: usize) -> MixResult<()> {
    if address % K::ALIGNMENT != 0 {
        return Err(MixError::Misaligned {
            buffer,
            address,
            required: K::ALIGNMENT,
            strategy: K::STRATEGY.as_str(),
        });
    }
    Ok(())
}
