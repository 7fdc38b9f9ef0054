//! Fixtures shared by the blockmix end-to-end tests.
//!
//! Every fixture writes real WAV files into a temporary directory so runs go
//! through the same file I/O paths the CLI uses.

use std::path::{Path, PathBuf};

use blockmix_cli::{InputSpec, MixPlan, OutputSpec};
use blockmix_mixer::{GainPair, Strategy};
use blockmix_wav::{FormatDescriptor, WavReader, WavWriter};
use tempfile::TempDir;

/// Writes `samples` as a 16-bit PCM file with the given layout.
pub fn write_pcm16(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let mut writer = WavWriter::create(path, FormatDescriptor::pcm16(channels, sample_rate))
        .expect("create fixture wav");
    writer.write_i16(samples).expect("write fixture samples");
    writer.finalize().expect("finalize fixture wav");
}

/// Writes a 24-bit stereo file through hound.
pub fn write_pcm24(path: &Path, sample_rate: u32, samples: &[i32]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create 24-bit fixture");
    for &sample in samples {
        writer.write_sample(sample).expect("write 24-bit sample");
    }
    writer.finalize().expect("finalize 24-bit fixture");
}

/// Reads every sample of a 16-bit file.
pub fn read_pcm16(path: &Path) -> Vec<i16> {
    let mut reader = WavReader::open(path).expect("open wav");
    let mut samples = vec![0i16; reader.total_samples()];
    reader.read_i16(&mut samples).expect("read wav samples");
    samples
}

/// Deterministic interleaved test signal with a distinct shape per seed.
pub fn test_signal(samples: usize, seed: u32, amplitude: f32) -> Vec<i16> {
    (0..samples)
        .map(|i| {
            let phase = i as f32 * (0.011 + seed as f32 * 0.007) + seed as f32;
            (phase.sin() * amplitude * 32767.0) as i16
        })
        .collect()
}

/// Scalar model of the float pipeline for one output sample.
pub fn expected_float_sample(inputs: &[(i16, f32)]) -> i16 {
    let mut acc = 0.0f32;
    for &(sample, gain) in inputs {
        acc += f32::from(sample) / 32768.0 * gain;
    }
    (acc * 32768.0) as i32 as i16
}

/// Scalar model of the int16 pipeline for one output sample.
pub fn expected_int16_sample(inputs: &[(i16, f32)]) -> i16 {
    let mut acc = 0i16;
    for &(sample, gain) in inputs {
        acc = (f32::from(acc) + f32::from(sample) * gain) as i16;
    }
    acc
}

/// A temporary directory holding stereo inputs and a plan over them.
pub struct MixFixture {
    dir: TempDir,
    /// Samples written to each input, in plan order.
    pub signals: Vec<Vec<i16>>,
    /// Gains assigned to each input, in plan order.
    pub gains: Vec<GainPair>,
}

impl MixFixture {
    /// Creates one 48 kHz stereo input per gain, each `samples` long.
    pub fn stereo(gains: &[GainPair], samples: usize) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let signals: Vec<Vec<i16>> = (0..gains.len())
            .map(|i| test_signal(samples, i as u32 + 1, 0.3))
            .collect();
        for (i, signal) in signals.iter().enumerate() {
            write_pcm16(&dir.path().join(input_name(i)), 2, 48000, signal);
        }
        Self {
            dir,
            signals,
            gains: gains.to_vec(),
        }
    }

    /// Fixture directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of input `index`.
    pub fn input_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(input_name(index))
    }

    /// Path of the output file.
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join("mix.wav")
    }

    /// A plan over every input with an explicit block layout.
    pub fn plan(&self, block_size: usize, blocks: Option<usize>, strategy: Strategy) -> MixPlan {
        MixPlan {
            inputs: self
                .gains
                .iter()
                .enumerate()
                .map(|(i, &gain)| InputSpec::new(self.input_path(i), gain))
                .collect(),
            output: OutputSpec {
                path: self.output_path(),
                ..OutputSpec::default()
            },
            block_size,
            blocks,
            strategy,
            pipeline: Default::default(),
        }
    }

    /// The contributions of every input at sample `index`.
    pub fn contributions(&self, index: usize) -> Vec<(i16, f32)> {
        self.signals
            .iter()
            .zip(&self.gains)
            .map(|(signal, gains)| {
                let gain = if index % 2 == 0 { gains.left } else { gains.right };
                (signal[index], gain)
            })
            .collect()
    }
}

fn input_name(index: usize) -> String {
    format!("audio_input_{}.wav", index + 1)
}
