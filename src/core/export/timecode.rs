//! Frame-grid time math shared by the edit-decision writers.
//!
//! FCPXML wants exact rational `numerator/denominator s` values aligned to
//! the frame grid; EDL wants SMPTE `HH:MM:SS:FF` timecodes with optional
//! drop-frame counting. Both start from the same standard-rate table.

/// Standard frame rates and their rational grid: `(fps, num_per_frame, den)`.
///
/// One frame lasts `num_per_frame / den` seconds.
const RATE_TABLE: &[(f64, i64, i64)] = &[
    (23.976, 1001, 24000),
    (24.0, 1, 24),
    (25.0, 1, 25),
    (29.97, 1001, 30000),
    (30.0, 1, 30),
    (50.0, 1, 50),
    (59.94, 1001, 60000),
    (60.0, 1, 60),
];

/// Snap an arbitrary frame rate to the nearest table entry.
///
/// Returns `(num_per_frame, denominator)`.
pub fn snap_rate(fps: f64) -> (i64, i64) {
    let mut best = RATE_TABLE[0];
    let mut best_delta = (fps - best.0).abs();
    for entry in &RATE_TABLE[1..] {
        let delta = (fps - entry.0).abs();
        if delta < best_delta {
            best = *entry;
            best_delta = delta;
        }
    }
    (best.1, best.2)
}

/// Quantize a seconds value to whole frames on the snapped grid.
pub fn seconds_to_frames(seconds: f64, fps: f64) -> i64 {
    let (num, den) = snap_rate(fps);
    (seconds * den as f64 / num as f64).round() as i64
}

/// Format a seconds value as an FCPXML rational time string.
///
/// Zero is written as the canonical `0s`; every other value stays on the
/// un-reduced frame grid so readers can recover the frame count exactly.
///
/// # Examples
///
/// ```rust
/// use autocut_cli::core::export::timecode::rational_time;
///
/// assert_eq!(rational_time(0.0, 30.0), "0s");
/// assert_eq!(rational_time(10.0, 29.97), "300300/30000s");
/// assert_eq!(rational_time(1.0 / 24.0, 24.0), "1/24s");
/// ```
pub fn rational_time(seconds: f64, fps: f64) -> String {
    let (num, den) = snap_rate(fps);
    let frames = (seconds * den as f64 / num as f64).round() as i64;
    if frames == 0 {
        return "0s".to_string();
    }
    format!("{}/{}s", frames * num, den)
}

/// Convert a frame count to an SMPTE timecode string.
///
/// Drop-frame counting applies the CMX convention: skip frame numbers 0 and
/// 1 at the start of every minute that is not a multiple of ten. 17982
/// frames make exactly ten drop-frame minutes at 29.97 fps.
pub fn frames_to_timecode(frames: i64, fps: f64, drop_frame: bool) -> String {
    let mut frames = frames;
    if drop_frame && (fps - 29.97).abs() < 0.1 {
        let d = frames / 17982;
        let m = frames % 17982;
        frames = frames + 18 * d + 2 * ((m - 2) / 1798);
    }

    let fps_int = fps.round() as i64;
    let total_seconds = frames / fps_int;
    let remaining_frames = frames % fps_int;

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let sep = if drop_frame { ';' } else { ':' };
    format!(
        "{:02}:{:02}:{:02}{}{:02}",
        hours, minutes, seconds, sep, remaining_frames
    )
}

/// Convert a seconds value to an SMPTE timecode string.
///
/// Rounds to the nearest frame so values sitting on a frame boundary do
/// not truncate down through float noise (600 s at 29.97 fps is exactly
/// 17982 frames).
pub fn seconds_to_timecode(seconds: f64, fps: f64, drop_frame: bool) -> String {
    frames_to_timecode((seconds * fps).round() as i64, fps, drop_frame)
}

/// Whether a frame rate qualifies for drop-frame counting.
pub fn supports_drop_frame(fps: f64) -> bool {
    (fps - 29.97).abs() < 0.1
}
