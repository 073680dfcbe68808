//! FCPXML 1.10 writer for Final Cut Pro 10.6+.
//!
//! Document shape:
//! - `fcpxml` root with the literal `<!DOCTYPE fcpxml>` declaration
//!   - `resources`: one `format` (r1) and one `asset` (r2) whose
//!     `media-rep` child points at the source file
//!   - `library/event/project/sequence/spine`: one `asset-clip` per keep
//!     segment, offsets accumulating along the output timeline
//!
//! All times are rational `numerator/denominator s` strings aligned to the
//! snapped frame grid; see [`super::timecode`].

use chrono::Local;
use log::info;

use crate::core::export::timecode::rational_time;
use crate::core::export::{encode_file_url, sanitize_name, xml_escape};
use crate::core::model::MediaInfo;
use crate::error::AutoCutError;
use crate::Result;

const FORMAT_ID: &str = "r1";
const ASSET_ID: &str = "r2";

/// Serializer for FCPXML 1.10 documents.
pub struct FcpXmlWriter {
    version: String,
}

impl Default for FcpXmlWriter {
    fn default() -> Self {
        Self {
            version: "1.10".to_string(),
        }
    }
}

impl FcpXmlWriter {
    /// Create a writer for the default format version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a keep-segment list into a complete FCPXML document.
    ///
    /// # Errors
    ///
    /// Fails with [`AutoCutError::InvalidMedia`] when the media carries
    /// neither stream.
    pub fn write(
        &self,
        media: &MediaInfo,
        keep_segments: &[(f64, f64)],
        project_name: &str,
    ) -> Result<String> {
        if !media.has_video() && !media.has_audio() {
            return Err(AutoCutError::invalid_media(
                "media has neither video nor audio stream",
            ));
        }
        info!("Building FCPXML with {} segments", keep_segments.len());

        let fps = if media.fps > 0.0 { media.fps } else { 30.0 };
        let width = if media.width > 0 { media.width } else { 1920 };
        let height = if media.height > 0 { media.height } else { 1080 };

        let stem = media
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let asset_name = sanitize_name(&stem);
        let total_duration: f64 = keep_segments.iter().map(|(s, e)| e - s).sum();

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<!DOCTYPE fcpxml>\n");
        xml.push_str(&format!("<fcpxml version=\"{}\">\n", self.version));

        // Resources: one format, one asset.
        xml.push_str("  <resources>\n");
        xml.push_str(&format!(
            "    <format id=\"{}\" name=\"FFVideoFormat{}p{}\" frameDuration=\"{}\" width=\"{}\" height=\"{}\"/>\n",
            FORMAT_ID,
            height,
            fps.round() as u32,
            rational_time(1.0 / fps, fps),
            width,
            height,
        ));
        xml.push_str(&format!(
            "    <asset id=\"{}\" name=\"{}\" start=\"0s\" duration=\"{}\" hasVideo=\"{}\" hasAudio=\"{}\" format=\"{}\">\n",
            ASSET_ID,
            xml_escape(&asset_name),
            rational_time(media.duration, fps),
            if media.has_video() { "1" } else { "0" },
            if media.has_audio() { "1" } else { "0" },
            FORMAT_ID,
        ));
        xml.push_str(&format!(
            "      <media-rep kind=\"original-media\" src=\"{}\"/>\n",
            encode_file_url(&media.file_path),
        ));
        xml.push_str("    </asset>\n");
        xml.push_str("  </resources>\n");

        // Library -> event -> project -> sequence -> spine.
        xml.push_str("  <library>\n");
        xml.push_str(&format!(
            "    <event name=\"AutoCut Export {}\">\n",
            Local::now().format("%Y-%m-%d"),
        ));
        let name = if project_name.is_empty() {
            asset_name.clone()
        } else {
            sanitize_name(project_name)
        };
        xml.push_str(&format!(
            "      <project name=\"{}\">\n",
            xml_escape(&name)
        ));
        xml.push_str(&format!(
            "        <sequence duration=\"{}\" format=\"{}\" tcStart=\"0s\" tcFormat=\"NDF\">\n",
            rational_time(total_duration, fps),
            FORMAT_ID,
        ));
        xml.push_str("          <spine>\n");

        let mut timeline_offset = 0.0;
        for (i, (seg_start, seg_end)) in keep_segments.iter().enumerate() {
            let seg_duration = seg_end - seg_start;
            let mut clip = format!(
                "            <asset-clip name=\"Clip {}\" ref=\"{}\" offset=\"{}\" duration=\"{}\" start=\"{}\" tcFormat=\"NDF\"",
                i + 1,
                ASSET_ID,
                rational_time(timeline_offset, fps),
                rational_time(seg_duration, fps),
                rational_time(*seg_start, fps),
            );
            if media.has_video() {
                clip.push_str(" videoRole=\"video\"");
            }
            if media.has_audio() {
                clip.push_str(" audioRole=\"dialogue\"");
            }
            clip.push_str("/>\n");
            xml.push_str(&clip);

            timeline_offset += seg_duration;
        }

        xml.push_str("          </spine>\n");
        xml.push_str("        </sequence>\n");
        xml.push_str("      </project>\n");
        xml.push_str("    </event>\n");
        xml.push_str("  </library>\n");
        xml.push_str("</fcpxml>\n");

        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn media() -> MediaInfo {
        MediaInfo {
            file_path: PathBuf::from("/media/interview take 1.mp4"),
            duration: 120.0,
            fps: 30.0,
            width: 1920,
            height: 1080,
            sample_rate: 48_000,
            channels: 2,
            ..MediaInfo::default()
        }
    }

    #[test]
    fn test_document_skeleton() {
        let xml = FcpXmlWriter::new()
            .write(&media(), &[(0.0, 120.0)], "Interview")
            .unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE fcpxml>"));
        assert!(xml.contains("<fcpxml version=\"1.10\">"));
        assert!(xml.contains("<format id=\"r1\""));
        assert!(xml.contains("<asset id=\"r2\""));
        assert!(xml.contains("tcFormat=\"NDF\""));
    }

    #[test]
    fn test_clip_per_keep_segment_with_cumulative_offsets() {
        // Cuts [10, 20) and [60, 80) leave three keep segments.
        let keep = vec![(0.0, 10.0), (20.0, 60.0), (80.0, 120.0)];
        let xml = FcpXmlWriter::new().write(&media(), &keep, "x").unwrap();

        assert_eq!(xml.matches("<asset-clip").count(), 3);
        assert!(xml.contains("offset=\"0s\""));
        assert!(xml.contains("offset=\"300/30s\""));
        assert!(xml.contains("offset=\"1500/30s\""));
        assert!(xml.contains("start=\"600/30s\""));
        assert!(xml.contains("start=\"2400/30s\""));
    }

    #[test]
    fn test_media_rep_src_is_percent_encoded() {
        let xml = FcpXmlWriter::new()
            .write(&media(), &[(0.0, 120.0)], "x")
            .unwrap();
        assert!(xml.contains("src=\"file:///media/interview%20take%201.mp4\""));
    }

    #[test]
    fn test_roles_follow_tracks() {
        let audio_only = MediaInfo {
            file_path: PathBuf::from("/media/podcast.wav"),
            duration: 60.0,
            sample_rate: 44_100,
            ..MediaInfo::default()
        };
        let xml = FcpXmlWriter::new()
            .write(&audio_only, &[(0.0, 60.0)], "x")
            .unwrap();
        assert!(xml.contains("audioRole=\"dialogue\""));
        assert!(!xml.contains("videoRole"));
        assert!(xml.contains("hasVideo=\"0\""));
    }

    #[test]
    fn test_rejects_streamless_media() {
        let empty = MediaInfo {
            file_path: PathBuf::from("/media/null.bin"),
            duration: 10.0,
            ..MediaInfo::default()
        };
        assert!(
            FcpXmlWriter::new()
                .write(&empty, &[(0.0, 10.0)], "x")
                .is_err()
        );
    }

    #[test]
    fn test_ntsc_grid() {
        let ntsc = MediaInfo {
            fps: 29.97,
            ..media()
        };
        let xml = FcpXmlWriter::new()
            .write(&ntsc, &[(0.0, 10.0), (20.0, 60.0)], "x")
            .unwrap();
        assert!(xml.contains("frameDuration=\"1001/30000s\""));
        assert!(xml.contains("offset=\"300300/30000s\""));
    }
}
