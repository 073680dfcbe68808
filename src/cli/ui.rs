//! Terminal output helpers: status lines, progress bars, and tables.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::core::model::{Cut, CutType, MediaInfo};
use crate::core::timeline::TimelineStats;

/// Print a green success line.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print a yellow warning line.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print a red error line to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Create a percent-based progress bar for a background job.
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
            .expect("valid progress template")
            .progress_chars("=>-"),
    );
    bar.set_message(message.to_string());
    bar
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}

#[derive(Tabled)]
struct CutRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Type")]
    cut_type: String,
    #[tabled(rename = "Avg dB")]
    avg_db: String,
    #[tabled(rename = "On")]
    enabled: String,
}

/// Render the cut list as a table.
pub fn display_cuts(cuts: &[Cut]) {
    if cuts.is_empty() {
        print_success("No removable regions detected");
        return;
    }
    let rows: Vec<CutRow> = cuts
        .iter()
        .map(|cut| CutRow {
            id: cut.id.clone(),
            start: format_time(cut.start),
            end: format_time(cut.end),
            duration: format!("{:.2}s", cut.duration()),
            cut_type: match cut.cut_type {
                CutType::Silence => "silence".to_string(),
                CutType::Breath => "breath".to_string(),
                CutType::Keep => "keep".to_string(),
                CutType::Manual => "manual".to_string(),
            },
            avg_db: format!("{:.1}", cut.source_avg_db),
            enabled: if cut.enabled { "✓" } else { " " }.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::sharp()));
}

/// Print the before/after duration summary.
pub fn display_stats(stats: &TimelineStats) {
    println!();
    println!("  Original: {}", format_time(stats.original_duration));
    println!(
        "  Cut:      {} ({} regions)",
        format!("-{}", format_time(stats.cut_duration)).red(),
        stats.enabled_count
    );
    println!("  Final:    {}", format_time(stats.final_duration).green());
}

#[derive(Tabled)]
struct InfoRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render probed media metadata as a table.
pub fn display_media_info(info: &MediaInfo) {
    let rows = vec![
        InfoRow {
            field: "Path",
            value: info.file_path.display().to_string(),
        },
        InfoRow {
            field: "Duration",
            value: format_time(info.duration),
        },
        InfoRow {
            field: "Video",
            value: if info.has_video() {
                format!(
                    "{} {}x{} @ {:.3} fps",
                    info.video_codec, info.width, info.height, info.fps
                )
            } else {
                "none".to_string()
            },
        },
        InfoRow {
            field: "Audio",
            value: if info.has_audio() {
                format!(
                    "{} {} Hz, {} ch, {} bit",
                    info.audio_codec, info.sample_rate, info.channels, info.bit_depth
                )
            } else {
                "none".to_string()
            },
        },
        InfoRow {
            field: "Size",
            value: format!("{} bytes", info.file_size),
        },
    ];
    println!("{}", Table::new(rows).with(Style::sharp()));
}
