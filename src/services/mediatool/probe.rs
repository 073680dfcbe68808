//! ffprobe JSON output parsing.
//!
//! The probe runs `ffprobe -print_format json -show_format -show_streams`
//! and folds the first video and first audio stream into a [`MediaInfo`].

use std::path::Path;

use serde::Deserialize;

use crate::core::model::MediaInfo;
use crate::error::AutoCutError;
use crate::Result;

#[derive(Debug, Deserialize)]
pub(crate) struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    bits_per_sample: Option<u16>,
    sample_fmt: Option<String>,
}

/// Parse an `a/b` fraction string into a float; 0 on a zero denominator.
fn parse_fraction(value: &str) -> f64 {
    let mut parts = value.splitn(2, '/');
    let num: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0.0);
    let den: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1.0);
    if den > 0.0 { num / den } else { 0.0 }
}

/// Fold a raw probe document into a [`MediaInfo`].
///
/// # Errors
///
/// Returns [`AutoCutError::InvalidMedia`] when the file has neither a
/// video nor an audio stream, or its declared duration is zero.
pub(crate) fn parse_probe_output(path: &Path, json: &str) -> Result<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| AutoCutError::invalid_media(format!("unparseable probe output: {}", e)))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    if video.is_none() && audio.is_none() {
        return Err(AutoCutError::invalid_media(format!(
            "{} has neither video nor audio stream",
            path.display()
        )));
    }

    let duration: f64 = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);
    if duration <= 0.0 {
        return Err(AutoCutError::invalid_media(format!(
            "{} declares zero duration",
            path.display()
        )));
    }

    let mut info = MediaInfo {
        file_path: path.to_path_buf(),
        duration,
        file_size: parsed
            .format
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        ..MediaInfo::default()
    };

    if let Some(v) = video {
        info.width = v.width.unwrap_or(0);
        info.height = v.height.unwrap_or(0);
        info.video_codec = v.codec_name.clone().unwrap_or_default();
        let fps = v
            .r_frame_rate
            .as_deref()
            .map(parse_fraction)
            .filter(|f| *f > 0.0)
            .or_else(|| v.avg_frame_rate.as_deref().map(parse_fraction))
            .unwrap_or(0.0);
        info.fps = fps;
    }

    if let Some(a) = audio {
        info.sample_rate = a
            .sample_rate
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(48_000);
        info.channels = a.channels.unwrap_or(2);
        info.audio_codec = a.codec_name.clone().unwrap_or_default();
        info.bit_depth = match a.bits_per_sample {
            Some(bits) if bits > 0 => bits,
            _ => match a.sample_fmt.as_deref() {
                Some("s16") | Some("s16p") => 16,
                Some("s32") | Some("s32p") | Some("flt") | Some("fltp") => 32,
                _ => 16,
            },
        };
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const FULL_PROBE: &str = r#"{
        "streams": [
            {
                "codec_type": "video",
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001"
            },
            {
                "codec_type": "audio",
                "codec_name": "aac",
                "sample_rate": "48000",
                "channels": 2,
                "bits_per_sample": 0,
                "sample_fmt": "fltp"
            }
        ],
        "format": {"duration": "120.5", "size": "1048576"}
    }"#;

    #[test]
    fn test_parse_full_probe() {
        let info = parse_probe_output(&PathBuf::from("/m/a.mp4"), FULL_PROBE).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.video_codec, "h264");
        assert_eq!(info.audio_codec, "aac");
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bit_depth, 32);
        assert_eq!(info.duration, 120.5);
        assert_eq!(info.file_size, 1_048_576);
        assert!(info.has_video());
        assert!(info.has_audio());
    }

    #[test]
    fn test_parse_audio_only() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "pcm_s16le",
                 "sample_rate": "44100", "channels": 1, "bits_per_sample": 16}
            ],
            "format": {"duration": "10.0"}
        }"#;
        let info = parse_probe_output(&PathBuf::from("/m/a.wav"), json).unwrap();
        assert!(!info.has_video());
        assert_eq!(info.fps, 0.0);
        assert_eq!(info.bit_depth, 16);
        assert_eq!(info.channels, 1);
    }

    #[test]
    fn test_streamless_file_is_invalid_media() {
        let json = r#"{"streams": [], "format": {"duration": "10.0"}}"#;
        assert!(matches!(
            parse_probe_output(&PathBuf::from("/m/x.bin"), json),
            Err(AutoCutError::InvalidMedia { .. })
        ));
    }

    #[test]
    fn test_zero_duration_is_invalid_media() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "48000"}],
            "format": {"duration": "0"}
        }"#;
        assert!(matches!(
            parse_probe_output(&PathBuf::from("/m/x.wav"), json),
            Err(AutoCutError::InvalidMedia { .. })
        ));
    }

    #[test]
    fn test_fraction_parsing() {
        assert_eq!(parse_fraction("30/1"), 30.0);
        assert!((parse_fraction("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_fraction("0/0"), 0.0);
        assert_eq!(parse_fraction("garbage"), 0.0);
    }
}
