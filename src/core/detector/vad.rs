//! VAD-assisted silence detection.
//!
//! Replaces the energy front-end (stages 1-3) with a voice-activity model:
//! frames the stream into model-sized chunks, labels each chunk
//! speech/non-speech, and inverts the labels into the silence bitmap. The
//! back half of the pipeline (run extraction, filtering, merging, padding)
//! is shared with the dBFS detector. dBFS per chunk is still computed so
//! cuts carry level metadata.

use std::path::Path;

use log::{debug, warn};
use voice_activity_detector::{IteratorExt, LabeledAudio, VoiceActivityDetector};

use crate::core::detector::{load_wav_mono, SilenceDetector};
use crate::core::jobs::JobContext;
use crate::core::model::{AnalysisConfig, Cut};
use crate::error::AutoCutError;
use crate::Result;

/// Sample rates the VAD model accepts.
const VAD_SAMPLE_RATES: [u32; 4] = [8_000, 16_000, 32_000, 48_000];

/// Speech-probability thresholds indexed by `vad_aggressiveness`.
///
/// Higher aggressiveness demands more evidence before calling a chunk
/// speech, so more frames end up labelled silent.
const VAD_THRESHOLDS: [f32; 4] = [0.2, 0.4, 0.6, 0.8];

/// Detect silences with the VAD front-end.
///
/// Falls back to the dBFS pipeline with a warning when the sample rate is
/// unsupported by the model.
pub fn detect_silence_vad(
    wav_path: &Path,
    config: &AnalysisConfig,
    ctx: &JobContext,
) -> Result<Vec<Cut>> {
    config.validate()?;
    let detector = SilenceDetector::new(config.clone())?;

    let (samples, sample_rate) = load_wav_mono(wav_path)?;
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    if !VAD_SAMPLE_RATES.contains(&sample_rate) {
        warn!(
            "VAD requires a sample rate in {:?}, got {}; falling back to dBFS detection",
            VAD_SAMPLE_RATES, sample_rate
        );
        return detector.detect_samples(&samples, sample_rate, ctx);
    }
    ctx.report(10.0, "audio loaded");

    let chunk_size = chunk_size_for(sample_rate);
    let vad = VoiceActivityDetector::builder()
        .sample_rate(sample_rate)
        .chunk_size(chunk_size)
        .build()
        .map_err(|e| {
            warn!("Failed to create VAD instance: {}", e);
            AutoCutError::invalid_audio(format!("Failed to create VAD: {}", e))
        })?;

    let threshold = VAD_THRESHOLDS[config.vad_aggressiveness as usize];
    debug!(
        "VAD chunk_size={} threshold={} (aggressiveness={})",
        chunk_size, threshold, config.vad_aggressiveness
    );

    // Model input is i16 PCM.
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32_767.0) as i16)
        .collect();

    let labels: Vec<LabeledAudio<i16>> = pcm
        .iter()
        .copied()
        .label(vad, threshold, 1)
        .collect();
    ctx.check_cancelled()?;
    ctx.report(40.0, "chunks labelled");

    // Silence bitmap is the inverse of the speech labels.
    let mask: Vec<bool> = labels
        .iter()
        .map(|label| matches!(label, LabeledAudio::NonSpeech(_)))
        .collect();

    // dBFS per chunk, for cut metadata only.
    let db_values: Vec<f32> = samples
        .chunks(chunk_size)
        .take(mask.len())
        .map(|chunk| {
            let mean_square: f32 =
                chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len().max(1) as f32;
            20.0 * mean_square.sqrt().max(1e-10).log10()
        })
        .collect();
    ctx.report(50.0, "levels computed");

    let duration = samples.len() as f64 / sample_rate as f64;
    detector.finish_pipeline(&mask, &db_values, chunk_size, sample_rate, duration, ctx)
}

/// Model-compatible chunk size for a sample rate.
///
/// 512 samples for the low rates, a 30 ms window (1024 minimum) otherwise;
/// always satisfies the model constraint `sample_rate <= 31.25 * chunk`.
fn chunk_size_for(sample_rate: u32) -> usize {
    let mut chunk_size = match sample_rate {
        8_000 | 16_000 => 512,
        _ => {
            let size = (sample_rate as f32 * 30.0 / 1000.0).round() as usize;
            size.max(1024)
        }
    };
    let min_chunk_size = (sample_rate as f64 / 31.25).ceil() as usize;
    if chunk_size < min_chunk_size {
        warn!(
            "Chunk size {} too small for sample_rate {}, adjusting to {}",
            chunk_size, sample_rate, min_chunk_size
        );
        chunk_size = min_chunk_size;
    }
    chunk_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sizes_satisfy_model_constraint() {
        for rate in VAD_SAMPLE_RATES {
            let chunk = chunk_size_for(rate);
            assert!(rate as f64 <= 31.25 * chunk as f64, "rate {}", rate);
        }
    }

    #[test]
    fn test_chunk_size_values() {
        assert_eq!(chunk_size_for(8_000), 512);
        assert_eq!(chunk_size_for(16_000), 512);
        assert_eq!(chunk_size_for(32_000), 1024);
        assert_eq!(chunk_size_for(48_000), 1440);
    }

    #[test]
    fn test_thresholds_cover_aggressiveness_range() {
        assert_eq!(VAD_THRESHOLDS.len(), 4);
        for pair in VAD_THRESHOLDS.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
