//! Per-stream channel gains.

use serde::{Deserialize, Serialize};

/// Left and right gain factors applied to one input stream.
///
/// Mono streams use only `left`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainPair {
    /// Gain applied to even (left) samples.
    pub left: f32,
    /// Gain applied to odd (right) samples.
    pub right: f32,
}

impl GainPair {
    /// Creates a gain pair.
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same gain on both channels.
    pub const fn uniform(gain: f32) -> Self {
        Self::new(gain, gain)
    }

    /// Contributes nothing.
    pub const fn silent() -> Self {
        Self::uniform(0.0)
    }

    /// Returns true if both gains are finite.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.right.is_finite()
    }

    /// The gains repeated across `N` lanes as `[L, R, L, R, ...]`.
    pub fn interleaved<const N: usize>(&self) -> [f32; N] {
        let mut lanes = [self.left; N];
        for lane in lanes.iter_mut().skip(1).step_by(2) {
            *lane = self.right;
        }
        lanes
    }
}

impl Default for GainPair {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}
