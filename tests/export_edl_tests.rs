//! EDL writer and timecode conversion checks.

use std::path::PathBuf;

use autocut_cli::core::export::timecode::{frames_to_timecode, seconds_to_timecode};
use autocut_cli::core::export::EdlWriter;
use autocut_cli::core::model::{Cut, CutType, MediaInfo};
use autocut_cli::core::timeline::Timeline;

fn ntsc_media() -> MediaInfo {
    MediaInfo {
        file_path: PathBuf::from("/media/show.mp4"),
        duration: 600.0,
        fps: 29.97,
        width: 1920,
        height: 1080,
        sample_rate: 48_000,
        ..MediaInfo::default()
    }
}

#[test]
fn drop_frame_converter_reference_points() {
    assert_eq!(frames_to_timecode(0, 29.97, true), "00:00:00;00");
    assert_eq!(frames_to_timecode(17982, 29.97, true), "00:10:00;00");
}

#[test]
fn scenario_single_ten_minute_keep_segment() {
    // One keep segment (0, 600) s at 29.97 fps, drop-frame.
    let edl = EdlWriter::new(true)
        .write(&ntsc_media(), &[(0.0, 600.0)], "Show")
        .unwrap();

    let event_line = edl
        .lines()
        .find(|line| line.starts_with("001"))
        .expect("event line present");
    assert_eq!(
        event_line,
        "001  AX       V     C        00:00:00;00 00:10:00;00 00:00:00;00 00:10:00;00"
    );
}

#[test]
fn event_count_matches_keep_segments() {
    let media = ntsc_media();
    let timeline = Timeline::with_cuts(
        media.clone(),
        vec![
            Cut::new(10.0, 30.0, CutType::Silence),
            Cut::new(100.0, 130.0, CutType::Silence),
            Cut::new(400.0, 450.0, CutType::Breath),
        ],
    );
    let keep = timeline.keep_segments();

    let edl = EdlWriter::new(false).write(&media, &keep, "Show").unwrap();

    let events: Vec<&str> = edl
        .lines()
        .filter(|line| line.contains("  AX       V     C        "))
        .collect();
    assert_eq!(events.len(), keep.len());
}

#[test]
fn final_rec_out_matches_final_duration_within_one_frame() {
    let media = ntsc_media();
    let timeline = Timeline::with_cuts(
        media.clone(),
        vec![
            Cut::new(50.0, 80.0, CutType::Silence),
            Cut::new(200.0, 290.5, CutType::Silence),
        ],
    );
    let keep = timeline.keep_segments();
    let final_duration = timeline.final_duration();

    let edl = EdlWriter::new(false).write(&media, &keep, "Show").unwrap();
    let last_event = edl
        .lines()
        .filter(|line| line.contains("  AX       V     C        "))
        .last()
        .unwrap();
    let rec_out = last_event.split_whitespace().last().unwrap();

    let expected = seconds_to_timecode(final_duration, media.fps, false);
    assert_eq!(rec_out, expected);
}

#[test]
fn header_carries_title_and_fcm() {
    let edl = EdlWriter::new(false)
        .write(&ntsc_media(), &[(0.0, 10.0)], "My Show")
        .unwrap();
    let mut lines = edl.lines();
    assert_eq!(lines.next(), Some("TITLE: My Show"));
    assert_eq!(lines.next(), Some("FCM: NON-DROP FRAME"));
}

#[test]
fn clip_name_comment_per_event() {
    let edl = EdlWriter::new(false)
        .write(&ntsc_media(), &[(0.0, 10.0), (20.0, 30.0)], "x")
        .unwrap();
    assert_eq!(edl.matches("* FROM CLIP NAME: show.mp4").count(), 2);
}
