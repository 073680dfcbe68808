//! XMEML v5 writer (FCP7 XML) for Premiere Pro and After Effects.
//!
//! Premiere imports this as "Final Cut Pro XML". Times are integer ticks
//! with `timebase = round(fps)` ticks per second and `ntsc` always FALSE.
//! Every keep segment becomes one `clipitem` under the video track and one
//! under the audio track, both referencing the shared `file-1` element.

use log::info;

use crate::core::export::{percent_encode_path, sanitize_name, xml_escape};
use crate::core::model::MediaInfo;
use crate::error::AutoCutError;
use crate::Result;

/// Serializer for FCP7-compatible XMEML documents.
pub struct XmemlWriter;

impl XmemlWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a keep-segment list into a complete XMEML document.
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
        info!("Building XMEML with {} segments", keep_segments.len());

        let fps = if media.fps > 0.0 { media.fps } else { 30.0 };
        let timebase = fps.round() as i64;
        let ticks = |seconds: f64| (seconds * timebase as f64) as i64;

        let stem = media
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = if project_name.is_empty() {
            sanitize_name(&stem)
        } else {
            sanitize_name(project_name)
        };
        let file_name = media
            .file_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pathurl = format!("file://localhost{}", percent_encode_path(&media.file_path));
        let media_duration = ticks(media.duration);
        let total_duration: f64 = keep_segments.iter().map(|(s, e)| e - s).sum();

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<!DOCTYPE xmeml>\n");
        xml.push_str("<xmeml version=\"5\">\n");
        xml.push_str("  <project>\n");
        xml.push_str(&format!("    <name>{}</name>\n", xml_escape(&name)));
        xml.push_str("    <children>\n");

        // Media bin with the master clip.
        xml.push_str("      <bin>\n");
        xml.push_str("        <name>Media</name>\n");
        xml.push_str("        <children>\n");
        xml.push_str("          <clip id=\"masterclip-1\">\n");
        xml.push_str(&format!(
            "            <name>{}</name>\n",
            xml_escape(&sanitize_name(&stem))
        ));
        xml.push_str(&format!(
            "            <duration>{}</duration>\n",
            media_duration
        ));
        xml.push_str(&rate_block(12, timebase));
        xml.push_str("            <media>\n");
        if media.has_video() {
            xml.push_str("              <video>\n");
            xml.push_str("                <track>\n");
            xml.push_str("                  <clipitem id=\"clipitem-1\">\n");
            xml.push_str(&format!(
                "                    <name>{}</name>\n",
                xml_escape(&sanitize_name(&stem))
            ));
            xml.push_str(&format!(
                "                    <duration>{}</duration>\n",
                media_duration
            ));
            xml.push_str(&rate_block(20, timebase));
            xml.push_str("                    <file id=\"file-1\">\n");
            xml.push_str(&format!(
                "                      <name>{}</name>\n",
                xml_escape(&file_name)
            ));
            xml.push_str(&format!(
                "                      <pathurl>{}</pathurl>\n",
                pathurl
            ));
            xml.push_str(&format!(
                "                      <duration>{}</duration>\n",
                media_duration
            ));
            xml.push_str(&rate_block(22, timebase));
            xml.push_str("                    </file>\n");
            xml.push_str("                  </clipitem>\n");
            xml.push_str("                </track>\n");
            xml.push_str("              </video>\n");
        }
        if media.has_audio() {
            xml.push_str("              <audio>\n");
            xml.push_str("                <track>\n");
            xml.push_str("                  <clipitem id=\"clipitem-2\">\n");
            xml.push_str(&format!(
                "                    <name>{}</name>\n",
                xml_escape(&sanitize_name(&stem))
            ));
            xml.push_str(&format!(
                "                    <duration>{}</duration>\n",
                media_duration
            ));
            xml.push_str("                  </clipitem>\n");
            xml.push_str("                </track>\n");
            xml.push_str("              </audio>\n");
        }
        xml.push_str("            </media>\n");
        xml.push_str("          </clip>\n");
        xml.push_str("        </children>\n");
        xml.push_str("      </bin>\n");

        // Sequence with one video and one audio track.
        xml.push_str("      <sequence id=\"sequence-1\">\n");
        xml.push_str(&format!(
            "        <name>{} - Edited</name>\n",
            xml_escape(&name)
        ));
        xml.push_str(&format!(
            "        <uuid>{}</uuid>\n",
            uuid::Uuid::new_v4()
        ));
        xml.push_str(&format!(
            "        <duration>{}</duration>\n",
            ticks(total_duration)
        ));
        xml.push_str(&rate_block(8, timebase));
        xml.push_str("        <timecode>\n");
        xml.push_str("          <string>00:00:00:00</string>\n");
        xml.push_str("          <frame>0</frame>\n");
        xml.push_str(&rate_block(10, timebase));
        xml.push_str("        </timecode>\n");
        xml.push_str("        <media>\n");

        if media.has_video() {
            xml.push_str("          <video>\n");
            xml.push_str("            <format>\n");
            xml.push_str("              <samplecharacteristics>\n");
            xml.push_str(&format!(
                "                <width>{}</width>\n",
                media.width
            ));
            xml.push_str(&format!(
                "                <height>{}</height>\n",
                media.height
            ));
            xml.push_str("              </samplecharacteristics>\n");
            xml.push_str("            </format>\n");
            xml.push_str(&track_block(media, keep_segments, timebase, "v"));
            xml.push_str("          </video>\n");
        }
        if media.has_audio() {
            xml.push_str("          <audio>\n");
            xml.push_str("            <format>\n");
            xml.push_str("              <samplecharacteristics>\n");
            xml.push_str(&format!(
                "                <samplerate>{}</samplerate>\n",
                media.sample_rate
            ));
            xml.push_str(&format!(
                "                <depth>{}</depth>\n",
                media.bit_depth
            ));
            xml.push_str("              </samplecharacteristics>\n");
            xml.push_str("            </format>\n");
            xml.push_str(&track_block(media, keep_segments, timebase, "a"));
            xml.push_str("          </audio>\n");
        }

        xml.push_str("        </media>\n");
        xml.push_str("      </sequence>\n");
        xml.push_str("    </children>\n");
        xml.push_str("  </project>\n");
        xml.push_str("</xmeml>\n");

        Ok(xml)
    }
}

impl Default for XmemlWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn rate_block(indent: usize, timebase: i64) -> String {
    let pad = " ".repeat(indent);
    format!(
        "{pad}<rate>\n{pad}  <timebase>{timebase}</timebase>\n{pad}  <ntsc>FALSE</ntsc>\n{pad}</rate>\n"
    )
}

/// One `track` of `clipitem`s: `start`/`end` on the timeline, `in`/`out`
/// on the source, all in ticks.
fn track_block(
    _media: &MediaInfo,
    keep_segments: &[(f64, f64)],
    timebase: i64,
    prefix: &str,
) -> String {
    let ticks = |seconds: f64| (seconds * timebase as f64) as i64;
    let mut xml = String::from("            <track>\n");
    let mut timeline_offset = 0.0;

    for (i, (seg_start, seg_end)) in keep_segments.iter().enumerate() {
        let seg_duration = seg_end - seg_start;
        xml.push_str(&format!(
            "              <clipitem id=\"{}-clipitem-{}\">\n",
            prefix,
            i + 1
        ));
        xml.push_str(&format!(
            "                <name>Clip {}</name>\n",
            i + 1
        ));
        xml.push_str(&format!(
            "                <duration>{}</duration>\n",
            ticks(seg_duration)
        ));
        xml.push_str(&format!(
            "                <start>{}</start>\n",
            ticks(timeline_offset)
        ));
        xml.push_str(&format!(
            "                <end>{}</end>\n",
            ticks(timeline_offset + seg_duration)
        ));
        xml.push_str(&format!(
            "                <in>{}</in>\n",
            ticks(*seg_start)
        ));
        xml.push_str(&format!(
            "                <out>{}</out>\n",
            ticks(*seg_end)
        ));
        xml.push_str("                <file id=\"file-1\"/>\n");
        xml.push_str("              </clipitem>\n");

        timeline_offset += seg_duration;
    }

    xml.push_str("            </track>\n");
    xml
}
