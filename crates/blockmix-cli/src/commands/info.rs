//! Info command implementation
//!
//! Prints the parsed header of a WAV file along with its PCM hash.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use blockmix_wav::{compute_pcm_hash, FormatDescriptor, WavReader};
use colored::Colorize;
use serde::Serialize;

/// Header summary of one WAV file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    /// File inspected.
    pub path: PathBuf,
    /// Parsed `fmt ` chunk.
    pub format: FormatDescriptor,
    /// Interleaved samples in the data chunk.
    pub total_samples: usize,
    /// Multi-channel frames in the data chunk.
    pub frames: usize,
    /// Playback length in seconds.
    pub duration_seconds: f64,
    /// File offset of the first data byte.
    pub data_offset: u64,
    /// Data chunk size in bytes.
    pub data_size: u32,
    /// BLAKE3 hash of the data chunk.
    pub pcm_hash: String,
}

/// Reads the header and hashes the sample data of `path`.
pub fn inspect(path: &Path) -> Result<FileInfo> {
    let reader = WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let format = *reader.format();
    let frames = reader.total_samples() / usize::from(format.channels);
    let duration_seconds = frames as f64 / f64::from(format.sample_rate);
    let info = FileInfo {
        path: path.to_path_buf(),
        format,
        total_samples: reader.total_samples(),
        frames,
        duration_seconds,
        data_offset: reader.data_offset(),
        data_size: reader.data_size(),
        pcm_hash: String::new(),
    };
    drop(reader);

    let pcm_hash = compute_pcm_hash(path).with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(FileInfo { pcm_hash, ..info })
}

/// Run the info command
///
/// # Returns
/// Exit code: 0 on success; errors propagate to the caller
pub fn run(path: &Path, json: bool) -> Result<ExitCode> {
    let info = inspect(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "File:".cyan().bold(), info.path.display());
    for line in info.format.to_string().lines() {
        println!("  {}", line);
    }
    println!("  {} {}", "samples:".dimmed(), info.total_samples);
    println!("  {} {}", "frames:".dimmed(), info.frames);
    println!("  {} {:.3} s", "duration:".dimmed(), info.duration_seconds);
    println!(
        "  {} {} ({} bytes)",
        "data offset:".dimmed(),
        info.data_offset,
        info.data_size
    );
    println!("  {} {}", "PCM hash:".dimmed(), info.pcm_hash);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmix_wav::WavWriter;

    #[test]
    fn test_inspect_reports_header_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let mut writer = WavWriter::create(&path, FormatDescriptor::stereo16(48000)).unwrap();
        writer.write_i16(&vec![100i16; 960]).unwrap();
        writer.finalize().unwrap();

        let info = inspect(&path).unwrap();
        assert_eq!(info.total_samples, 960);
        assert_eq!(info.frames, 480);
        assert!((info.duration_seconds - 0.01).abs() < 1e-9);
        assert_eq!(info.data_offset, 46);
        assert_eq!(info.data_size, 1920);
        assert_eq!(info.pcm_hash.len(), 64);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["format"]["sample_rate"], 48000);
        assert_eq!(json["format"]["format_tag"], "pcm");
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(inspect(Path::new("/no/such/file.wav")).is_err());
    }
}
