//! Mix plan: the configuration object handed to the engine.
//!
//! A plan is a JSON document listing input files with their gains, the
//! output file and format, and the block layout of the run. Relative paths
//! resolve against the directory holding the plan file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use blockmix_mixer::{GainPair, Strategy};
use blockmix_wav::FormatDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default samples per block (2048 stereo frames).
pub const DEFAULT_BLOCK_SIZE: usize = 4096;
/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Errors raised while loading or validating a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file could not be read.
    #[error("failed to read plan '{}': {source}", path.display())]
    Read {
        /// Plan path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The plan is not valid JSON or has unknown fields.
    #[error("failed to parse plan: {0}")]
    Parse(#[from] serde_json::Error),

    /// The plan lists no inputs.
    #[error("plan has no inputs")]
    NoInputs,

    /// Block size is zero or not stereo-aligned.
    #[error("block size must be a positive even number, got {0}")]
    InvalidBlockSize(usize),

    /// An input gain is NaN or infinite.
    #[error("input {index} ('{}') has a non-finite gain", path.display())]
    InvalidGain {
        /// Position in the input list.
        index: usize,
        /// Input path.
        path: PathBuf,
    },

    /// Output channel count outside mono/stereo.
    #[error("output must be mono or stereo, got {0} channels")]
    InvalidChannels(u16),

    /// Output sample rate of zero, or too high for the header's byte-rate field.
    #[error("output sample rate {0} Hz is out of range")]
    InvalidSampleRate(u32),
}

/// Sample representation used for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Normalized `f32` samples mixed with the selected SIMD strategy.
    #[default]
    Float,
    /// Native `i16` samples mixed with the scalar integer loop.
    Int16,
}

impl Pipeline {
    /// Name used in plans and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Pipeline::Float => "float",
            Pipeline::Int16 => "int16",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pipeline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float" => Ok(Pipeline::Float),
            "int16" => Ok(Pipeline::Int16),
            other => Err(format!(
                "unknown pipeline '{}' (expected float or int16)",
                other
            )),
        }
    }
}

/// One input stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// WAV file to read.
    pub path: PathBuf,
    /// Channel gains, unity when omitted.
    #[serde(default)]
    pub gain: GainPair,
}

impl InputSpec {
    /// Creates an input entry.
    pub fn new(path: impl Into<PathBuf>, gain: GainPair) -> Self {
        Self {
            path: path.into(),
            gain,
        }
    }
}

/// Output file and format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    /// WAV file to write.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Output sample rate; inputs must match it.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Output channel count; inputs must match it.
    #[serde(default = "default_channels")]
    pub channels: u16,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("audio_mix_out.wav")
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_channels() -> u16 {
    2
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

/// Full description of one mixing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixPlan {
    /// Input streams, mixed in order.
    pub inputs: Vec<InputSpec>,
    /// Output file and format.
    #[serde(default)]
    pub output: OutputSpec,
    /// Interleaved samples per block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Blocks to mix; when absent, as many as every input can supply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<usize>,
    /// Vector width of the float pipeline.
    #[serde(default)]
    pub strategy: Strategy,
    /// Sample representation.
    #[serde(default)]
    pub pipeline: Pipeline,
}

impl MixPlan {
    /// Parses a plan from JSON without resolving paths or validating.
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads, resolves and validates a plan file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let plan = Self::read(path)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reads a plan file and resolves its paths without validating it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut plan = Self::from_json_str(&json)?;
        if let Some(base) = path.parent() {
            plan.resolve_paths(base);
        }
        Ok(plan)
    }

    /// The built-in four-stream plan, with paths relative to the current
    /// directory.
    pub fn reference() -> Self {
        let gains = [
            GainPair::new(0.5, 0.5),
            GainPair::new(0.3, 0.5),
            GainPair::new(0.5, 0.3),
            GainPair::new(0.3, 0.7),
        ];
        Self {
            inputs: gains
                .iter()
                .enumerate()
                .map(|(i, &gain)| InputSpec::new(format!("audio_input_{}.wav", i + 1), gain))
                .collect(),
            output: OutputSpec::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            blocks: Some(3698),
            strategy: Strategy::Simd256,
            pipeline: Pipeline::Float,
        }
    }

    /// Makes every relative input and output path relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for input in &mut self.inputs {
            if input.path.is_relative() {
                input.path = base.join(&input.path);
            }
        }
        if self.output.path.is_relative() {
            self.output.path = base.join(&self.output.path);
        }
    }

    /// Checks the plan's own invariants. Input files are not touched.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.inputs.is_empty() {
            return Err(PlanError::NoInputs);
        }
        if self.block_size == 0 || self.block_size % 2 != 0 {
            return Err(PlanError::InvalidBlockSize(self.block_size));
        }
        for (index, input) in self.inputs.iter().enumerate() {
            if !input.gain.is_finite() {
                return Err(PlanError::InvalidGain {
                    index,
                    path: input.path.clone(),
                });
            }
        }
        if !matches!(self.output.channels, 1 | 2) {
            return Err(PlanError::InvalidChannels(self.output.channels));
        }
        let byte_rate = self
            .output
            .sample_rate
            .checked_mul(u32::from(self.output.channels) * 2);
        if self.output.sample_rate == 0 || byte_rate.is_none() {
            return Err(PlanError::InvalidSampleRate(self.output.sample_rate));
        }
        Ok(())
    }

    /// 16-bit PCM descriptor for the output file.
    pub fn output_format(&self) -> FormatDescriptor {
        FormatDescriptor::pcm16(self.output.channels, self.output.sample_rate)
    }
}
