//! CMX 3600 EDL writer.
//!
//! Plaintext edit decision list accepted by DaVinci Resolve, Avid, and most
//! professional NLEs:
//!
//! ```text
//! TITLE: Project Name
//! FCM: NON-DROP FRAME
//!
//! 001  AX       V     C        00:00:00:00 00:00:10:00 00:00:00:00 00:00:10:00
//! * FROM CLIP NAME: video.mp4
//! ```

use log::info;

use crate::core::export::timecode::{seconds_to_timecode, supports_drop_frame};
use crate::core::model::MediaInfo;
use crate::Result;

/// Serializer for CMX 3600 edit decision lists.
pub struct EdlWriter {
    drop_frame: bool,
}

impl EdlWriter {
    /// Create a writer.
    ///
    /// Drop-frame counting only takes effect for rates within 0.1 fps of
    /// 29.97; it defaults to off even for NTSC sources.
    pub fn new(drop_frame: bool) -> Self {
        Self { drop_frame }
    }

    /// Serialize a keep-segment list into an EDL document.
    pub fn write(
        &self,
        media: &MediaInfo,
        keep_segments: &[(f64, f64)],
        title: &str,
    ) -> Result<String> {
        info!("Building EDL with {} events", keep_segments.len());

        let fps = if media.fps > 0.0 { media.fps } else { 30.0 };
        let drop = self.drop_frame && supports_drop_frame(fps);

        let title = if title.is_empty() {
            media
                .file_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            title.to_string()
        };
        let clip_name = media
            .file_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut lines = Vec::new();
        lines.push(format!("TITLE: {}", title));
        lines.push(if drop {
            "FCM: DROP FRAME".to_string()
        } else {
            "FCM: NON-DROP FRAME".to_string()
        });
        lines.push(String::new());

        let mut timeline_offset = 0.0;
        for (i, (seg_start, seg_end)) in keep_segments.iter().enumerate() {
            let seg_duration = seg_end - seg_start;

            let src_in = seconds_to_timecode(*seg_start, fps, drop);
            let src_out = seconds_to_timecode(*seg_end, fps, drop);
            let rec_in = seconds_to_timecode(timeline_offset, fps, drop);
            let rec_out = seconds_to_timecode(timeline_offset + seg_duration, fps, drop);

            lines.push(format!(
                "{:03}  AX       V     C        {} {} {} {}",
                i + 1,
                src_in,
                src_out,
                rec_in,
                rec_out
            ));
            lines.push(format!("* FROM CLIP NAME: {}", clip_name));
            lines.push(String::new());

            timeline_offset += seg_duration;
        }

        Ok(lines.join("\n"))
    }
}

impl Default for EdlWriter {
    fn default() -> Self {
        Self::new(false)
    }
}
