//! Sample codec: interleaved PCM bytes <-> in-memory sample buffers.
//!
//! Every function converts `out.len()` (or `samples.len()`) samples and
//! expects the byte side to hold exactly the matching number of bytes; a
//! shorter byte slice is a caller bug and panics on the slice bounds.

/// Full-scale magnitude of 16-bit PCM, `2^15`.
pub const PCM16_SCALE: f32 = (1u32 << 15) as f32;
/// Full-scale magnitude of 24-bit PCM, `2^23`.
pub const PCM24_SCALE: f32 = (1u32 << 23) as f32;

/// Bytes needed to store `sample_count` samples of `bits_per_sample` bits.
pub fn bytes_for(sample_count: usize, bits_per_sample: u16) -> usize {
    sample_count * usize::from(bits_per_sample / 8)
}

/// Decodes 16-bit little-endian PCM to floats in `[-1.0, 1.0)`.
pub fn decode_pcm16_to_f32(raw: &[u8], out: &mut [f32]) {
    const COEF: f32 = 1.0 / PCM16_SCALE;
    let raw = &raw[..out.len() * 2];
    for (sample, bytes) in out.iter_mut().zip(raw.chunks_exact(2)) {
        *sample = f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) * COEF;
    }
}

/// Decodes 16-bit little-endian PCM without changing the representation.
pub fn decode_pcm16_to_i16(raw: &[u8], out: &mut [i16]) {
    let raw = &raw[..out.len() * 2];
    for (sample, bytes) in out.iter_mut().zip(raw.chunks_exact(2)) {
        *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
    }
}

/// Decodes packed 24-bit little-endian PCM to floats in `[-1.0, 1.0)`.
///
/// Each sample is three bytes, least significant first, sign-extended from
/// bit 23.
pub fn decode_pcm24_to_f32(raw: &[u8], out: &mut [f32]) {
    const COEF: f32 = 1.0 / PCM24_SCALE;
    let raw = &raw[..out.len() * 3];
    for (sample, bytes) in out.iter_mut().zip(raw.chunks_exact(3)) {
        // Place the 24 bits at the top of an i32 and shift back down to sign-extend.
        let value = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
        *sample = value as f32 * COEF;
    }
}

/// Encodes floats to 16-bit little-endian PCM.
///
/// The scaled value is truncated toward zero and then wrapped to 16 bits.
/// There is no clipping guard: anything outside `[-1.0, 1.0)` wraps around,
/// so `1.0` encodes as `-32768`. Callers that need saturation must clamp
/// first.
pub fn encode_f32_to_pcm16(samples: &[f32], raw: &mut [u8]) {
    let raw = &mut raw[..samples.len() * 2];
    for (bytes, &sample) in raw.chunks_exact_mut(2).zip(samples) {
        let value = (sample * PCM16_SCALE) as i32 as i16;
        bytes.copy_from_slice(&value.to_le_bytes());
    }
}

/// Encodes 16-bit samples to little-endian PCM without conversion.
pub fn encode_i16_to_pcm16(samples: &[i16], raw: &mut [u8]) {
    let raw = &mut raw[..samples.len() * 2];
    for (bytes, &sample) in raw.chunks_exact_mut(2).zip(samples) {
        bytes.copy_from_slice(&sample.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bytes_for() {
        assert_eq!(bytes_for(4096, 16), 8192);
        assert_eq!(bytes_for(10, 24), 30);
        assert_eq!(bytes_for(0, 16), 0);
    }

    #[test]
    fn test_decode_pcm16_scaling() {
        let raw: Vec<u8> = [i16::MIN, -16384, 0, 16384, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let mut out = [0.0f32; 5];
        decode_pcm16_to_f32(&raw, &mut out);
        assert_eq!(out[0], -1.0);
        assert_eq!(out[1], -0.5);
        assert_eq!(out[2], 0.0);
        assert_eq!(out[3], 0.5);
        assert_eq!(out[4], 32767.0 / 32768.0);
    }

    #[test]
    fn test_pcm16_passthrough() {
        let samples = [1i16, -2, 300, i16::MIN, i16::MAX];
        let mut raw = [0u8; 10];
        encode_i16_to_pcm16(&samples, &mut raw);
        assert_eq!(&raw[0..2], &[0x01, 0x00]);
        assert_eq!(&raw[2..4], &[0xFE, 0xFF]);

        let mut decoded = [0i16; 5];
        decode_pcm16_to_i16(&raw, &mut decoded);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_float_round_trip_within_one_step() {
        let samples: Vec<f32> = (0..512).map(|i| ((i as f32) * 0.037).sin() * 0.9).collect();
        let mut raw = vec![0u8; samples.len() * 2];
        encode_f32_to_pcm16(&samples, &mut raw);

        let mut decoded = vec![0.0f32; samples.len()];
        decode_pcm16_to_f32(&raw, &mut decoded);

        let step = 1.0 / PCM16_SCALE;
        for (original, round_tripped) in samples.iter().zip(&decoded) {
            assert!(
                (original - round_tripped).abs() <= step,
                "{} vs {}",
                original,
                round_tripped
            );
        }
    }

    #[test]
    fn test_encode_truncates_toward_zero() {
        let mut raw = [0u8; 4];
        encode_f32_to_pcm16(&[0.75 / PCM16_SCALE, -0.75 / PCM16_SCALE], &mut raw);
        assert_eq!(i16::from_le_bytes([raw[0], raw[1]]), 0);
        assert_eq!(i16::from_le_bytes([raw[2], raw[3]]), 0);
    }

    #[test]
    fn test_encode_wraps_out_of_range() {
        let mut raw = [0u8; 6];
        encode_f32_to_pcm16(&[1.0, -1.0, 1.5], &mut raw);
        assert_eq!(i16::from_le_bytes([raw[0], raw[1]]), i16::MIN);
        assert_eq!(i16::from_le_bytes([raw[2], raw[3]]), i16::MIN);
        // 1.5 * 32768 = 49152, which wraps to 49152 - 65536.
        assert_eq!(i16::from_le_bytes([raw[4], raw[5]]), -16384);
    }

    #[test]
    fn test_decode_pcm24_sign_extension() {
        let raw = [
            0x00, 0x00, 0x40, // +2^22 -> 0.5
            0x00, 0x00, 0xC0, // -2^22 -> -0.5
            0xFF, 0xFF, 0xFF, // -1
            0x00, 0x00, 0x80, // -2^23 -> -1.0
        ];
        let mut out = [0.0f32; 4];
        decode_pcm24_to_f32(&raw, &mut out);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[1], -0.5);
        assert_eq!(out[2], -1.0 / PCM24_SCALE);
        assert_eq!(out[3], -1.0);
    }

    #[test]
    #[should_panic]
    fn test_short_byte_slice_panics() {
        let mut out = [0.0f32; 4];
        decode_pcm16_to_f32(&[0u8; 6], &mut out);
    }
}
