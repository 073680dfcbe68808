//! Render orchestrator: lossless-cut re-render via a single tool pass.
//!
//! Builds one trim/concat filter graph over the keep-segment list and
//! drives the external tool once, rather than rendering per-segment temp
//! files and concatenating afterwards. Re-encoding (H.264 CRF 18 + AAC)
//! sidesteps the GOP/keyframe alignment problems of stream-copy concat.
//!
//! Cleanup is owned by a scoped guard: on any early exit (error, cancel)
//! the partial output is deleted exactly once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::core::jobs::JobContext;
use crate::core::model::MediaInfo;
use crate::error::AutoCutError;
use crate::services::mediatool::{MediaTool, ProgressFn};
use crate::Result;

/// A filter-complex expression plus the output pads to map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    /// The `-filter_complex` argument.
    pub filter_complex: String,
    /// Output pad labels, in `-map` order.
    pub maps: Vec<String>,
}

/// Build the trim+concat graph for a keep-segment list.
///
/// Per segment `i`: `[0:v]trim=start=sᵢ:end=eᵢ,setpts=PTS-STARTPTS[vi]`
/// and the `atrim` twin, then a single `concat` joining every pad.
/// Streams the source lacks are left out of the graph entirely.
pub fn build_filter_graph(media: &MediaInfo, keep_segments: &[(f64, f64)]) -> FilterGraph {
    let has_video = media.has_video();
    let has_audio = media.has_audio();
    let n = keep_segments.len();

    let mut parts = Vec::new();
    for (i, (start, end)) in keep_segments.iter().enumerate() {
        if has_video {
            parts.push(format!(
                "[0:v]trim=start={}:end={},setpts=PTS-STARTPTS[v{}]",
                start, end, i
            ));
        }
        if has_audio {
            parts.push(format!(
                "[0:a]atrim=start={}:end={},asetpts=PTS-STARTPTS[a{}]",
                start, end, i
            ));
        }
    }

    let mut concat_inputs = String::new();
    for i in 0..n {
        if has_video {
            concat_inputs.push_str(&format!("[v{}]", i));
        }
        if has_audio {
            concat_inputs.push_str(&format!("[a{}]", i));
        }
    }

    let mut maps = Vec::new();
    let mut outputs = String::new();
    if has_video {
        outputs.push_str("[outv]");
        maps.push("[outv]".to_string());
    }
    if has_audio {
        outputs.push_str("[outa]");
        maps.push("[outa]".to_string());
    }
    parts.push(format!(
        "{}concat=n={}:v={}:a={}{}",
        concat_inputs, n, has_video as u8, has_audio as u8, outputs
    ));

    FilterGraph {
        filter_complex: parts.join(";"),
        maps,
    }
}

/// Map elapsed render seconds onto the reported percentage band.
pub(crate) fn render_progress(elapsed: f64, total_keep_duration: f64) -> f32 {
    if total_keep_duration <= 0.0 {
        return 10.0;
    }
    (10.0 + 85.0 * elapsed / total_keep_duration).clamp(10.0, 95.0) as f32
}

/// Drives the external tool to concatenate keep segments into a new
/// container.
pub struct RenderOrchestrator {
    tool: Arc<dyn MediaTool>,
}

impl RenderOrchestrator {
    /// Create an orchestrator over the given tool.
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self { tool }
    }

    /// Render the keep segments of `media` to `output`.
    ///
    /// Guarantees:
    /// - refuses `output == input` with [`AutoCutError::SameFileRefused`]
    /// - removes any pre-existing file at `output` before rendering
    /// - on success the output exists and is non-empty
    /// - on failure or cancellation no partial file remains
    pub async fn render(
        &self,
        media: &MediaInfo,
        keep_segments: &[(f64, f64)],
        output: &Path,
        ctx: &JobContext,
    ) -> Result<()> {
        if same_file(&media.file_path, output) {
            return Err(AutoCutError::SameFileRefused(output.to_path_buf()));
        }
        if keep_segments.is_empty() {
            return Err(AutoCutError::render_failed("no keep segments to render"));
        }
        ctx.check_cancelled()?;

        if output.exists() {
            debug!("Removing pre-existing output {}", output.display());
            std::fs::remove_file(output)?;
        }

        let total_keep: f64 = keep_segments.iter().map(|(s, e)| e - s).sum();
        let graph = build_filter_graph(media, keep_segments);
        info!(
            "Rendering {} segments ({:.1}s) to {}",
            keep_segments.len(),
            total_keep,
            output.display()
        );
        ctx.report(10.0, "starting render");

        let guard = CleanupGuard::new(output);
        let progress_ctx = ctx.clone();
        let progress: ProgressFn = Arc::new(move |elapsed| {
            progress_ctx.report(render_progress(elapsed, total_keep), "rendering");
        });

        self.tool
            .render_concat(
                &media.file_path,
                output,
                &graph,
                progress,
                ctx.cancellation_token(),
            )
            .await?;

        let produced = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if produced == 0 {
            return Err(AutoCutError::render_failed("output not produced"));
        }

        guard.disarm();
        ctx.report(100.0, "render complete");
        Ok(())
    }
}

/// Deletes the output on drop unless disarmed.
struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            debug!("Cleaning up partial output {}", self.path.display());
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Whether two paths refer to the same file.
///
/// Canonicalizes when both paths exist; falls back to lexical equality.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}
