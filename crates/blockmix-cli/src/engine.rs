//! Block orchestrator.
//!
//! Opens every input and the output once, then for each block: clears the
//! output buffer, reads one block from every input and accumulates it with
//! that input's gains, and appends the mixed block to the output file.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use blockmix_mixer::{
    mix, mix_i16, AlignedBlock, GainPair, MixError, MixKernel, Scalar, Simd128, Simd256, Simd512,
    Strategy,
};
use blockmix_wav::{compute_pcm_hash, FormatDescriptor, WavError, WavReader, WavWriter};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::plan::{MixPlan, PlanError, Pipeline};
use crate::profile::Profiler;

/// Errors raised while preparing or running a mix.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The plan failed validation.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Reading or writing a WAV file failed.
    #[error("'{}': {source}", path.display())]
    Wav {
        /// File involved.
        path: PathBuf,
        /// Codec error.
        #[source]
        source: WavError,
    },

    /// An input cannot feed the configured output.
    #[error("'{}' does not match the output format: {message}", path.display())]
    FormatMismatch {
        /// Offending input.
        path: PathBuf,
        /// What differs.
        message: String,
    },

    /// An input holds fewer samples than the requested block count needs.
    #[error(
        "'{}' has {available} samples but {required} are needed for the requested blocks",
        path.display()
    )]
    InputTooShort {
        /// Offending input.
        path: PathBuf,
        /// Samples left in the input.
        available: usize,
        /// Samples the run would read.
        required: usize,
    },

    /// The output path names one of the inputs.
    #[error("output '{}' would overwrite an input", path.display())]
    OutputIsInput {
        /// Shared path.
        path: PathBuf,
    },

    /// The mixer rejected a block.
    #[error("mix failed: {0}")]
    Mix(#[from] MixError),
}

impl EngineError {
    fn wav(path: &Path, source: WavError) -> Self {
        Self::Wav {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct MixSummary {
    /// Output file.
    pub output: PathBuf,
    /// Number of input streams mixed.
    pub inputs: usize,
    /// Blocks mixed.
    pub blocks: usize,
    /// Interleaved samples per block.
    pub block_size: usize,
    /// Interleaved samples written to the output.
    pub samples_written: u64,
    /// Vector width used by the float pipeline.
    pub strategy: Strategy,
    /// Sample representation.
    pub pipeline: Pipeline,
    /// Wall-clock time of the block loop, in milliseconds.
    pub elapsed_ms: f64,
    /// BLAKE3 hash of the output's PCM data.
    pub pcm_hash: String,
}

struct OpenInput {
    path: PathBuf,
    reader: WavReader<BufReader<File>>,
    gains: GainPair,
}

/// An opened mixing run, ready to execute.
pub struct MixEngine {
    plan: MixPlan,
    inputs: Vec<OpenInput>,
    writer: WavWriter<BufWriter<File>>,
    blocks: usize,
}

impl MixEngine {
    /// Validates the plan, opens every input and creates the output file.
    ///
    /// The output file is only created once every input has been checked,
    /// so a rejected plan leaves the file system untouched.
    pub fn open(plan: MixPlan) -> Result<Self, EngineError> {
        plan.validate()?;
        let format = plan.output_format();

        let mut inputs = Vec::with_capacity(plan.inputs.len());
        for spec in &plan.inputs {
            let reader = WavReader::open(&spec.path).map_err(|e| EngineError::wav(&spec.path, e))?;
            check_compatible(&spec.path, reader.format(), &format, plan.pipeline)?;
            info!(
                path = %spec.path.display(),
                samples = reader.total_samples(),
                left = spec.gain.left,
                right = spec.gain.right,
                "opened input"
            );
            // A mono block is one channel; the right gain has nothing to scale.
            let gains = if format.channels == 1 {
                GainPair::uniform(spec.gain.left)
            } else {
                spec.gain
            };
            inputs.push(OpenInput {
                path: spec.path.clone(),
                reader,
                gains,
            });
        }

        check_output_path(&plan.output.path, &inputs)?;
        let blocks = count_blocks(&plan, &inputs)?;

        let writer = WavWriter::create(&plan.output.path, format)
            .map_err(|e| EngineError::wav(&plan.output.path, e))?;
        info!(path = %plan.output.path.display(), "opened output");

        Ok(Self {
            plan,
            inputs,
            writer,
            blocks,
        })
    }

    /// The plan this engine was opened with.
    pub fn plan(&self) -> &MixPlan {
        &self.plan
    }

    /// Each input path with the format parsed from its header.
    pub fn input_formats(&self) -> impl Iterator<Item = (&Path, &FormatDescriptor)> {
        self.inputs
            .iter()
            .map(|input| (input.path.as_path(), input.reader.format()))
    }

    /// Format of the output file.
    pub fn output_format(&self) -> &FormatDescriptor {
        self.writer.format()
    }

    /// Blocks the run will mix.
    pub fn block_count(&self) -> usize {
        self.blocks
    }

    /// Mixes every block, finalizes the output and hashes it.
    pub fn run(mut self, profiler: &Profiler) -> Result<MixSummary, EngineError> {
        let blocks = self.blocks;
        debug!(
            blocks,
            block_size = self.plan.block_size,
            strategy = %self.plan.strategy,
            pipeline = %self.plan.pipeline,
            "starting mix"
        );

        let started = Instant::now();
        {
            let _run = profiler.scope("run");
            match (self.plan.pipeline, self.plan.strategy) {
                (Pipeline::Int16, _) => self.mix_int16(blocks, profiler)?,
                (Pipeline::Float, Strategy::Scalar) => self.mix_float::<Scalar>(blocks, profiler)?,
                (Pipeline::Float, Strategy::Simd128) => self.mix_float::<Simd128>(blocks, profiler)?,
                (Pipeline::Float, Strategy::Simd256) => self.mix_float::<Simd256>(blocks, profiler)?,
                (Pipeline::Float, Strategy::Simd512) => self.mix_float::<Simd512>(blocks, profiler)?,
            }
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let MixEngine {
            plan,
            inputs,
            writer,
            ..
        } = self;
        let samples_written = writer.samples_written();
        writer
            .finalize()
            .map_err(|e| EngineError::wav(&plan.output.path, e))?;
        let pcm_hash =
            compute_pcm_hash(&plan.output.path).map_err(|e| EngineError::wav(&plan.output.path, e))?;
        info!(blocks, samples_written, elapsed_ms, "mix finished");

        Ok(MixSummary {
            output: plan.output.path,
            inputs: inputs.len(),
            blocks,
            block_size: plan.block_size,
            samples_written,
            strategy: plan.strategy,
            pipeline: plan.pipeline,
            elapsed_ms,
            pcm_hash,
        })
    }

    fn mix_float<K: MixKernel>(
        &mut self,
        blocks: usize,
        profiler: &Profiler,
    ) -> Result<(), EngineError> {
        let block_size = self.plan.block_size;
        let mut input = AlignedBlock::zeroed(block_size);
        let mut output = AlignedBlock::zeroed(block_size);

        for index in 0..blocks {
            let _block = profiler.scope("block");
            output.clear();
            for stream in &mut self.inputs {
                {
                    let _read = profiler.scope("read");
                    stream
                        .reader
                        .read(&mut input)
                        .map_err(|e| EngineError::wav(&stream.path, e))?;
                }
                let _mix = profiler.scope("mix");
                mix::<K>(&input, &mut output, stream.gains)?;
            }
            let _write = profiler.scope("write");
            self.writer
                .write(&output)
                .map_err(|e| EngineError::wav(&self.plan.output.path, e))?;
            trace!(block = index, "mixed block");
        }
        Ok(())
    }

    fn mix_int16(&mut self, blocks: usize, profiler: &Profiler) -> Result<(), EngineError> {
        let block_size = self.plan.block_size;
        let mut input = vec![0i16; block_size];
        let mut output = vec![0i16; block_size];

        for index in 0..blocks {
            let _block = profiler.scope("block");
            output.fill(0);
            for stream in &mut self.inputs {
                {
                    let _read = profiler.scope("read");
                    stream
                        .reader
                        .read_i16(&mut input)
                        .map_err(|e| EngineError::wav(&stream.path, e))?;
                }
                let _mix = profiler.scope("mix");
                mix_i16(&input, &mut output, stream.gains)?;
            }
            let _write = profiler.scope("write");
            self.writer
                .write_i16(&output)
                .map_err(|e| EngineError::wav(&self.plan.output.path, e))?;
            trace!(block = index, "mixed block");
        }
        Ok(())
    }
}

/// Blocks every input can supply.
///
/// With an explicit count every input must hold enough samples; without
/// one, the shortest input decides.
fn count_blocks(plan: &MixPlan, inputs: &[OpenInput]) -> Result<usize, EngineError> {
    let block_size = plan.block_size;
    let Some(blocks) = plan.blocks else {
        return Ok(inputs
            .iter()
            .map(|input| input.reader.samples_remaining() / block_size)
            .min()
            .unwrap_or(0));
    };

    let required = blocks.checked_mul(block_size).unwrap_or(usize::MAX);
    for input in inputs {
        let available = input.reader.samples_remaining();
        if available < required {
            return Err(EngineError::InputTooShort {
                path: input.path.clone(),
                available,
                required,
            });
        }
    }
    Ok(blocks)
}

fn check_output_path(output: &Path, inputs: &[OpenInput]) -> Result<(), EngineError> {
    // A missing output cannot alias an input that was just opened.
    let Ok(output) = output.canonicalize() else {
        return Ok(());
    };
    for input in inputs {
        if input.path.canonicalize().is_ok_and(|path| path == output) {
            return Err(EngineError::OutputIsInput {
                path: input.path.clone(),
            });
        }
    }
    Ok(())
}

fn check_compatible(
    path: &Path,
    input: &FormatDescriptor,
    output: &FormatDescriptor,
    pipeline: Pipeline,
) -> Result<(), EngineError> {
    let mismatch = |message: String| EngineError::FormatMismatch {
        path: path.to_path_buf(),
        message,
    };
    if input.channels != output.channels {
        return Err(mismatch(format!(
            "{} channels, output has {}",
            input.channels, output.channels
        )));
    }
    if input.sample_rate != output.sample_rate {
        return Err(mismatch(format!(
            "{} Hz, output is {} Hz",
            input.sample_rate, output.sample_rate
        )));
    }
    if pipeline == Pipeline::Int16 && input.bits_per_sample != 16 {
        return Err(mismatch(format!(
            "{}-bit samples cannot feed the int16 pipeline",
            input.bits_per_sample
        )));
    }
    Ok(())
}
