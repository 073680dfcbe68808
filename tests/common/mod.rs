//! Shared fixtures for integration tests: synthetic WAV generation.
#![allow(dead_code)]

use std::path::PathBuf;

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;

/// Deterministic "speech" signal at a target dBFS: alternating-sign
/// samples whose RMS equals the requested level.
pub fn level_block(duration_s: f64, sample_rate: u32, db: f64) -> Vec<f32> {
    let amplitude = 10f64.powf(db / 20.0) as f32;
    let n = (duration_s * sample_rate as f64) as usize;
    (0..n)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

/// Overwrite `[start_s, end_s)` with a block at the given level.
pub fn set_region(samples: &mut [f32], sample_rate: u32, start_s: f64, end_s: f64, db: f64) {
    let amplitude = 10f64.powf(db / 20.0) as f32;
    let start = (start_s * sample_rate as f64) as usize;
    let end = ((end_s * sample_rate as f64) as usize).min(samples.len());
    for (i, sample) in samples[start..end].iter_mut().enumerate() {
        *sample = if i % 2 == 0 { amplitude } else { -amplitude };
    }
}

/// Write mono 16-bit WAV to a temp dir and return its path.
pub fn write_wav(dir: &TempDir, name: &str, samples: &[f32], sample_rate: u32) -> PathBuf {
    let path = dir.path().join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32_767.0) as i16;
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// Synthesize a WAV with speech everywhere except the given silent regions.
pub fn wav_with_silences(
    dir: &TempDir,
    name: &str,
    duration_s: f64,
    sample_rate: u32,
    speech_db: f64,
    silence_db: f64,
    silent_regions: &[(f64, f64)],
) -> PathBuf {
    let mut samples = level_block(duration_s, sample_rate, speech_db);
    for &(start, end) in silent_regions {
        set_region(&mut samples, sample_rate, start, end, silence_db);
    }
    write_wav(dir, name, &samples, sample_rate)
}
