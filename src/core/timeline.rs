//! Timeline algebra: cut ownership and keep-segment derivation.
//!
//! A [`Timeline`] owns its [`Cut`]s exclusively. Cuts are stored in
//! insertion order; every derivation works over a sorted traversal that
//! merges overlaps among enabled removable cuts, so storage order never
//! leaks into exported results.

use log::debug;

use crate::core::model::{Cut, MediaInfo};
use crate::error::AutoCutError;
use crate::Result;

/// Ordered-by-derivation sequence of cuts over a probed media file.
#[derive(Debug, Clone)]
pub struct Timeline {
    media: MediaInfo,
    cuts: Vec<Cut>,
}

/// Summary statistics for display layers.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineStats {
    /// Source duration in seconds.
    pub original_duration: f64,
    /// Union length of all enabled removable cuts.
    pub cut_duration: f64,
    /// Duration remaining after cuts are applied.
    pub final_duration: f64,
    /// Total number of cuts, enabled or not.
    pub cut_count: usize,
    /// Number of enabled cuts.
    pub enabled_count: usize,
}

impl Timeline {
    /// Create an empty timeline over the given media.
    pub fn new(media: MediaInfo) -> Self {
        Self {
            media,
            cuts: Vec::new(),
        }
    }

    /// Create a timeline pre-populated with detector output.
    pub fn with_cuts(media: MediaInfo, cuts: Vec<Cut>) -> Self {
        Self { media, cuts }
    }

    /// The media descriptor this timeline is bound to.
    pub fn media(&self) -> &MediaInfo {
        &self.media
    }

    /// All cuts in storage order.
    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    /// Append a cut to the timeline.
    pub fn add_cut(&mut self, cut: Cut) {
        debug!(
            "Adding cut {} [{:.3}s, {:.3}s] type {:?}",
            cut.id, cut.start, cut.end, cut.cut_type
        );
        self.cuts.push(cut);
    }

    /// Remove the cut with the given id.
    ///
    /// # Errors
    ///
    /// Fails when no cut carries the id.
    pub fn remove_cut(&mut self, id: &str) -> Result<()> {
        let before = self.cuts.len();
        self.cuts.retain(|c| c.id != id);
        if self.cuts.len() == before {
            return Err(AutoCutError::config(format!("No cut with id {}", id)));
        }
        Ok(())
    }

    /// Enable or disable the cut with the given id.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        let cut = self.cut_mut(id)?;
        cut.enabled = enabled;
        Ok(())
    }

    /// Move the bounds of the cut with the given id.
    ///
    /// # Errors
    ///
    /// Fails when the id is unknown or `end <= start`.
    pub fn set_bounds(&mut self, id: &str, start: f64, end: f64) -> Result<()> {
        if !(end > start) {
            return Err(AutoCutError::config_out_of_range(format!(
                "cut bounds must satisfy end > start, got [{}, {}]",
                start, end
            )));
        }
        let cut = self.cut_mut(id)?;
        cut.start = start;
        cut.end = end;
        Ok(())
    }

    fn cut_mut(&mut self, id: &str) -> Result<&mut Cut> {
        self.cuts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AutoCutError::config(format!("No cut with id {}", id)))
    }

    /// Merged spans of all enabled removable cuts, sorted and
    /// non-overlapping, clamped to `[0, duration]`.
    fn removable_spans(&self) -> Vec<(f64, f64)> {
        let duration = self.media.duration;
        let mut spans: Vec<(f64, f64)> = self
            .cuts
            .iter()
            .filter(|c| c.is_removable())
            .map(|c| (c.start.max(0.0), c.end.min(duration)))
            .filter(|(s, e)| e > s)
            .collect();
        spans.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("cut bounds are finite"));

        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end => {
                    *last_end = last_end.max(end);
                }
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    /// The intervals of the source timeline that survive every enabled
    /// removable cut.
    ///
    /// Result is sorted, non-overlapping, and together with the cut union
    /// partitions `[0, duration]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use autocut_cli::core::model::{Cut, CutType, MediaInfo};
    /// use autocut_cli::core::timeline::Timeline;
    ///
    /// let media = MediaInfo { duration: 10.0, ..MediaInfo::default() };
    /// let mut timeline = Timeline::new(media);
    /// timeline.add_cut(Cut::new(3.0, 6.0, CutType::Silence));
    /// assert_eq!(timeline.keep_segments(), vec![(0.0, 3.0), (6.0, 10.0)]);
    /// ```
    pub fn keep_segments(&self) -> Vec<(f64, f64)> {
        let duration = self.media.duration;
        let mut keep = Vec::new();
        let mut cursor = 0.0;

        for (start, end) in self.removable_spans() {
            if start > cursor {
                keep.push((cursor, start));
            }
            cursor = cursor.max(end);
        }
        if cursor < duration {
            keep.push((cursor, duration));
        }
        keep
    }

    /// Union length of all enabled removable cuts, in seconds.
    pub fn total_cut_duration(&self) -> f64 {
        self.removable_spans().iter().map(|(s, e)| e - s).sum()
    }

    /// Duration remaining after all enabled removable cuts are applied.
    pub fn final_duration(&self) -> f64 {
        self.media.duration - self.total_cut_duration()
    }

    /// Collect summary statistics for display.
    pub fn stats(&self) -> TimelineStats {
        TimelineStats {
            original_duration: self.media.duration,
            cut_duration: self.total_cut_duration(),
            final_duration: self.final_duration(),
            cut_count: self.cuts.len(),
            enabled_count: self.cuts.iter().filter(|c| c.enabled).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::CutType;

    fn media(duration: f64) -> MediaInfo {
        MediaInfo {
            duration,
            fps: 30.0,
            sample_rate: 48_000,
            ..MediaInfo::default()
        }
    }

    #[test]
    fn test_no_cuts_keeps_whole_timeline() {
        let timeline = Timeline::new(media(10.0));
        assert_eq!(timeline.keep_segments(), vec![(0.0, 10.0)]);
        assert_eq!(timeline.total_cut_duration(), 0.0);
        assert_eq!(timeline.final_duration(), 10.0);
    }

    #[test]
    fn test_single_interior_cut() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(3.0, 6.0, CutType::Silence));
        assert_eq!(timeline.keep_segments(), vec![(0.0, 3.0), (6.0, 10.0)]);
        assert_eq!(timeline.total_cut_duration(), 3.0);
        assert_eq!(timeline.final_duration(), 7.0);
    }

    #[test]
    fn test_cut_touching_edges() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(0.0, 2.0, CutType::Silence));
        timeline.add_cut(Cut::new(8.0, 10.0, CutType::Silence));
        assert_eq!(timeline.keep_segments(), vec![(2.0, 8.0)]);
    }

    #[test]
    fn test_overlapping_cuts_merge_in_derivation() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(2.0, 5.0, CutType::Silence));
        timeline.add_cut(Cut::new(4.0, 7.0, CutType::Breath));
        assert_eq!(timeline.keep_segments(), vec![(0.0, 2.0), (7.0, 10.0)]);
        // Union length, not the naive per-cut sum.
        assert_eq!(timeline.total_cut_duration(), 5.0);
    }

    #[test]
    fn test_unsorted_storage_sorted_derivation() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(7.0, 8.0, CutType::Silence));
        timeline.add_cut(Cut::new(1.0, 2.0, CutType::Silence));
        assert_eq!(
            timeline.keep_segments(),
            vec![(0.0, 1.0), (2.0, 7.0), (8.0, 10.0)]
        );
    }

    #[test]
    fn test_disabled_cuts_are_ignored() {
        let mut timeline = Timeline::new(media(10.0));
        let cut = Cut::new(3.0, 6.0, CutType::Silence);
        let id = cut.id.clone();
        timeline.add_cut(cut);
        timeline.set_enabled(&id, false).unwrap();
        assert_eq!(timeline.keep_segments(), vec![(0.0, 10.0)]);
    }

    #[test]
    fn test_keep_and_manual_cuts_not_removable() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(3.0, 6.0, CutType::Keep));
        timeline.add_cut(Cut::new(7.0, 8.0, CutType::Manual));
        assert_eq!(timeline.keep_segments(), vec![(0.0, 10.0)]);
    }

    #[test]
    fn test_coverage_identity() {
        let mut timeline = Timeline::new(media(60.0));
        timeline.add_cut(Cut::new(5.0, 10.0, CutType::Silence));
        timeline.add_cut(Cut::new(9.0, 12.0, CutType::Silence));
        timeline.add_cut(Cut::new(30.0, 31.5, CutType::Breath));

        let keep_total: f64 = timeline.keep_segments().iter().map(|(s, e)| e - s).sum();
        assert!((keep_total + timeline.total_cut_duration() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_bounds_validation() {
        let mut timeline = Timeline::new(media(10.0));
        let cut = Cut::new(3.0, 6.0, CutType::Silence);
        let id = cut.id.clone();
        timeline.add_cut(cut);

        assert!(timeline.set_bounds(&id, 4.0, 4.0).is_err());
        assert!(timeline.set_bounds(&id, 2.0, 5.0).is_ok());
        assert_eq!(timeline.keep_segments(), vec![(0.0, 2.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_remove_cut_unknown_id() {
        let mut timeline = Timeline::new(media(10.0));
        assert!(timeline.remove_cut("deadbeef").is_err());
    }

    #[test]
    fn test_cut_clamped_to_media_duration() {
        let mut timeline = Timeline::new(media(10.0));
        timeline.add_cut(Cut::new(8.0, 14.0, CutType::Silence));
        assert_eq!(timeline.keep_segments(), vec![(0.0, 8.0)]);
        assert_eq!(timeline.total_cut_duration(), 2.0);
    }

    #[test]
    fn test_stats() {
        let mut timeline = Timeline::new(media(20.0));
        timeline.add_cut(Cut::new(1.0, 3.0, CutType::Silence));
        let cut = Cut::new(5.0, 6.0, CutType::Silence);
        let id = cut.id.clone();
        timeline.add_cut(cut);
        timeline.set_enabled(&id, false).unwrap();

        let stats = timeline.stats();
        assert_eq!(stats.cut_count, 2);
        assert_eq!(stats.enabled_count, 1);
        assert_eq!(stats.cut_duration, 2.0);
        assert_eq!(stats.final_duration, 18.0);
    }
}
