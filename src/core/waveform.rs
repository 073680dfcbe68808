//! Waveform peak data generation and caching.
//!
//! Produces a bucketed min/max peak representation of a PCM stream for
//! downstream visualizers, persisted as a gzip-compressed archive keyed by
//! a content fingerprint of the source file. Cache hits reload in a single
//! read; corrupt archives are treated as misses and recomputed.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::detector::load_wav_mono;
use crate::core::jobs::JobContext;
use crate::error::AutoCutError;
use crate::Result;

/// Bucket sizes produced by the multi-resolution variant.
pub const MULTI_RESOLUTIONS: [u32; 4] = [64, 256, 1024, 4096];

/// Bucketed min/max peak data for one PCM stream.
///
/// Both peak arrays have the same length `N`, with
/// `N * samples_per_bucket >= total_samples > (N-1) * samples_per_bucket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformData {
    /// Per-bucket minimum sample value, in `[-1, 1]`.
    pub peaks_min: Vec<f32>,
    /// Per-bucket maximum sample value, in `[-1, 1]`.
    pub peaks_max: Vec<f32>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
    /// Samples folded into each bucket.
    pub samples_per_bucket: u32,
    /// Source sample count.
    pub total_samples: u64,
    /// Source duration in seconds.
    pub duration: f64,
}

impl WaveformData {
    /// Number of buckets.
    pub fn num_buckets(&self) -> usize {
        self.peaks_min.len()
    }

    /// Resampled peak data for a time range, `num_points` points long.
    ///
    /// Used by visualizers to draw an arbitrary zoom window without
    /// touching the source PCM.
    pub fn peaks_for_range(
        &self,
        start_time: f64,
        end_time: f64,
        num_points: usize,
    ) -> (Vec<f32>, Vec<f32>) {
        let bucket_seconds = self.samples_per_bucket as f64 / self.sample_rate as f64;
        let start_bucket = ((start_time / bucket_seconds) as usize).min(self.num_buckets());
        let end_bucket = ((end_time / bucket_seconds) as usize).min(self.num_buckets());

        if start_bucket >= end_bucket || num_points == 0 {
            return (vec![0.0; num_points], vec![0.0; num_points]);
        }

        let window_min = &self.peaks_min[start_bucket..end_bucket];
        let window_max = &self.peaks_max[start_bucket..end_bucket];
        if window_min.len() == num_points {
            return (window_min.to_vec(), window_max.to_vec());
        }

        let mut min_out = Vec::with_capacity(num_points);
        let mut max_out = Vec::with_capacity(num_points);
        for i in 0..num_points {
            let idx = if num_points == 1 {
                0
            } else {
                i * (window_min.len() - 1) / (num_points - 1)
            };
            min_out.push(window_min[idx]);
            max_out.push(window_max[idx]);
        }
        (min_out, max_out)
    }

    /// Write the archive, gzip-compressed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)?;
        let file = std::fs::File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?;
        debug!("Waveform saved to {}", path.display());
        Ok(())
    }

    /// Read an archive written by [`WaveformData::save`].
    ///
    /// # Errors
    ///
    /// Returns [`AutoCutError::CacheCorrupt`] when the archive cannot be
    /// decompressed or decoded; callers treat that as a cache miss.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|_| AutoCutError::CacheCorrupt(path.to_path_buf()))?;
        serde_json::from_slice(&json).map_err(|_| AutoCutError::CacheCorrupt(path.to_path_buf()))
    }
}

/// Generates bucketed peak data from WAV files, with an on-disk cache.
pub struct WaveformBuilder {
    samples_per_bucket: u32,
    cache_dir: Option<PathBuf>,
}

impl WaveformBuilder {
    /// Create a builder; `cache_dir = None` disables caching.
    pub fn new(samples_per_bucket: u32, cache_dir: Option<PathBuf>) -> Result<Self> {
        if samples_per_bucket == 0 {
            return Err(AutoCutError::config_out_of_range(
                "samples_per_bucket must be at least 1",
            ));
        }
        if let Some(dir) = &cache_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            samples_per_bucket,
            cache_dir,
        })
    }

    /// Cache file path for a source file, or `None` when caching is off.
    ///
    /// The key fingerprints path, mtime, size, and bucket width, so any
    /// change to the source invalidates the entry and identical inputs
    /// collide onto identical bytes (last-write-wins is safe).
    pub fn cache_path(&self, wav_path: &Path) -> Option<PathBuf> {
        let cache_dir = self.cache_dir.as_ref()?;
        let meta = std::fs::metadata(wav_path).ok()?;
        let mtime = meta
            .modified()
            .ok()?
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();
        let key = format!(
            "{}:{}:{}:{}",
            wav_path.display(),
            mtime,
            meta.len(),
            self.samples_per_bucket
        );
        let digest = format!("{:x}", md5::compute(key.as_bytes()));
        Some(cache_dir.join(format!("waveform_{}.wfz", &digest[..16])))
    }

    /// Produce waveform data for a WAV file, consulting the cache first.
    pub fn generate(&self, wav_path: &Path, ctx: &JobContext) -> Result<WaveformData> {
        if let Some(cache_path) = self.cache_path(wav_path) {
            if cache_path.exists() {
                match WaveformData::load(&cache_path) {
                    Ok(data) => {
                        debug!("Loaded cached waveform from {}", cache_path.display());
                        ctx.report(100.0, "waveform cache hit");
                        return Ok(data);
                    }
                    Err(e) => warn!("Cache load failed: {}", e),
                }
            }
        }

        debug!("Generating waveform for {}", wav_path.display());
        let (samples, sample_rate) = load_wav_mono(wav_path)?;
        if samples.is_empty() {
            return Err(AutoCutError::invalid_audio("PCM stream has zero samples"));
        }
        ctx.report(20.0, "audio loaded");

        let data = self.bucketize(&samples, sample_rate, ctx)?;

        if let Some(cache_path) = self.cache_path(wav_path) {
            if let Err(e) = data.save(&cache_path) {
                warn!("Cache save failed: {}", e);
            }
        }
        ctx.report(100.0, "waveform ready");
        Ok(data)
    }

    /// Single linear pass over the samples.
    fn bucketize(&self, samples: &[f32], sample_rate: u32, ctx: &JobContext) -> Result<WaveformData> {
        let spb = self.samples_per_bucket as usize;
        let total_samples = samples.len() as u64;
        let num_buckets = samples.len().div_ceil(spb);

        let mut peaks_min = Vec::with_capacity(num_buckets);
        let mut peaks_max = Vec::with_capacity(num_buckets);

        for (i, chunk) in samples.chunks(spb).enumerate() {
            let mut lo = f32::MAX;
            let mut hi = f32::MIN;
            for &s in chunk {
                lo = lo.min(s);
                hi = hi.max(s);
            }
            peaks_min.push(lo);
            peaks_max.push(hi);

            if i % 4096 == 0 {
                ctx.check_cancelled()?;
                ctx.report(
                    20.0 + 75.0 * i as f32 / num_buckets as f32,
                    "bucketing peaks",
                );
            }
        }

        Ok(WaveformData {
            peaks_min,
            peaks_max,
            sample_rate,
            samples_per_bucket: self.samples_per_bucket,
            total_samples,
            duration: total_samples as f64 / sample_rate as f64,
        })
    }

    /// Produce waveforms at every standard bucket size for fast zoom.
    pub fn generate_multi_resolution(
        &self,
        wav_path: &Path,
        ctx: &JobContext,
    ) -> Result<BTreeMap<u32, WaveformData>> {
        let mut result = BTreeMap::new();
        for (i, resolution) in MULTI_RESOLUTIONS.iter().enumerate() {
            ctx.check_cancelled()?;
            let builder = WaveformBuilder::new(*resolution, self.cache_dir.clone())?;
            let data = builder.generate(wav_path, &JobContext::standalone())?;
            result.insert(*resolution, data);
            ctx.report(
                100.0 * (i + 1) as f32 / MULTI_RESOLUTIONS.len() as f32,
                &format!("resolution {} done", resolution),
            );
        }
        Ok(result)
    }
}
