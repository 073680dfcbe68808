//! FFmpeg-assisted silence detection.
//!
//! Delegates the energy front-end (stages 1-4) to the external tool's
//! `silencedetect` filter, which uses the demuxer's own timing and is the
//! most frame-accurate option when the tool is available. Filtering,
//! merging, and padding still run locally so every knob behaves the same
//! across front-ends. A failed invocation falls back to the pure-DSP
//! pipeline with a warning; it is never surfaced to the caller.

use std::path::Path;

use log::{info, warn};

use crate::core::detector::{segment_to_cut, SilenceDetector};
use crate::core::jobs::JobContext;
use crate::core::model::{AnalysisConfig, AudioSegment, CutType, MediaInfo};
use crate::core::model::Cut;
use crate::services::mediatool::MediaTool;
use crate::Result;

/// Detect silences by parsing the external tool's `silencedetect` output.
///
/// `wav_path` is the extracted PCM used by the fallback pipeline when the
/// tool invocation fails.
pub async fn detect_silence_ffmpeg(
    tool: &dyn MediaTool,
    media: &MediaInfo,
    wav_path: &Path,
    config: &AnalysisConfig,
    ctx: &JobContext,
) -> Result<Vec<Cut>> {
    config.validate()?;
    info!(
        "Starting FFmpeg silence detection: {}",
        media.file_path.display()
    );
    ctx.report(10.0, "invoking silencedetect");

    let min_duration = config.silence_min_duration_ms as f64 / 1000.0;
    let raw_pairs = match tool
        .detect_silence_raw(&media.file_path, config.silence_threshold_db, min_duration)
        .await
    {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(
                "silencedetect unavailable ({}), falling back to dBFS detection",
                e
            );
            let detector = SilenceDetector::new(config.clone())?;
            return detector.detect_with_context(wav_path, ctx);
        }
    };
    ctx.check_cancelled()?;
    ctx.report(60.0, "tool output parsed");

    if raw_pairs.is_empty() {
        info!("No silence detected by FFmpeg");
        return Ok(Vec::new());
    }

    // The tool reports at the user threshold; carry it as the level
    // metadata for every region.
    let segments: Vec<AudioSegment> = raw_pairs
        .iter()
        .map(|&(start, end)| AudioSegment {
            start,
            end,
            avg_db: config.silence_threshold_db,
            peak_db: config.silence_threshold_db,
            is_silence: true,
        })
        .collect();

    // Stages 5-7 run locally on the reported regions.
    let detector = SilenceDetector::new(config.clone())?;
    let (filtered, _short) = detector.filter_by_duration(segments);
    ctx.report(70.0, "short segments filtered");
    let merged = detector.merge_close_segments(filtered);
    ctx.report(80.0, "segments merged");
    let padded = detector.apply_padding(&merged, media.duration);
    ctx.report(90.0, "padding applied");

    let cuts: Vec<Cut> = padded
        .iter()
        .map(|seg| segment_to_cut(seg, CutType::Silence))
        .collect();

    ctx.report(100.0, "detection complete");
    info!("FFmpeg detected {} silence regions", cuts.len());
    Ok(cuts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mediatool::MockMediaTool;
    use std::path::PathBuf;

    fn media() -> MediaInfo {
        MediaInfo {
            file_path: PathBuf::from("/media/cast.mp4"),
            duration: 30.0,
            fps: 30.0,
            sample_rate: 48_000,
            width: 1920,
            height: 1080,
            ..MediaInfo::default()
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            silence_threshold_db: -35.0,
            silence_min_duration_ms: 250,
            merge_gap_ms: 100,
            keep_short_pauses_ms: 0,
            pre_pad_ms: 0,
            post_pad_ms: 0,
            ..AnalysisConfig::default()
        }
    }

    #[tokio::test]
    async fn test_tool_regions_become_cuts() {
        let mut tool = MockMediaTool::new();
        tool.expect_detect_silence_raw()
            .returning(|_, _, _| Ok(vec![(2.0, 5.0), (10.0, 12.0)]));

        let cuts = detect_silence_ffmpeg(
            &tool,
            &media(),
            &PathBuf::from("/tmp/none.wav"),
            &config(),
            &JobContext::standalone(),
        )
        .await
        .unwrap();

        assert_eq!(cuts.len(), 2);
        assert_eq!(cuts[0].start, 2.0);
        assert_eq!(cuts[0].end, 5.0);
        assert_eq!(cuts[0].source_avg_db, -35.0);
    }

    #[tokio::test]
    async fn test_close_regions_merge() {
        let mut tool = MockMediaTool::new();
        tool.expect_detect_silence_raw()
            .returning(|_, _, _| Ok(vec![(2.0, 3.0), (3.05, 4.0)]));

        let cuts = detect_silence_ffmpeg(
            &tool,
            &media(),
            &PathBuf::from("/tmp/none.wav"),
            &config(),
            &JobContext::standalone(),
        )
        .await
        .unwrap();

        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].start, 2.0);
        assert_eq!(cuts[0].end, 4.0);
    }

    #[tokio::test]
    async fn test_empty_tool_output() {
        let mut tool = MockMediaTool::new();
        tool.expect_detect_silence_raw().returning(|_, _, _| Ok(vec![]));

        let cuts = detect_silence_ffmpeg(
            &tool,
            &media(),
            &PathBuf::from("/tmp/none.wav"),
            &config(),
            &JobContext::standalone(),
        )
        .await
        .unwrap();
        assert!(cuts.is_empty());
    }

    #[tokio::test]
    async fn test_padding_clamps_to_media_duration() {
        let mut tool = MockMediaTool::new();
        tool.expect_detect_silence_raw()
            .returning(|_, _, _| Ok(vec![(28.0, 31.0)]));

        let mut cfg = config();
        cfg.pre_pad_ms = 100;
        cfg.post_pad_ms = 0;
        let cuts = detect_silence_ffmpeg(
            &tool,
            &media(),
            &PathBuf::from("/tmp/none.wav"),
            &cfg,
            &JobContext::standalone(),
        )
        .await
        .unwrap();

        assert_eq!(cuts.len(), 1);
        assert!((cuts[0].start - 28.1).abs() < 1e-9);
        assert_eq!(cuts[0].end, 30.0);
    }
}
