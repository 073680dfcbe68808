//! Cache directory management command.
//!
//! The cache holds `waveform_<16hex>.wfz` archives and extracted
//! `<stem>_audio.wav` files; all of them are safe to delete at any time.

use std::path::Path;

use walkdir::WalkDir;

use crate::cli::ui;
use crate::cli::{CacheAction, CacheArgs};
use crate::config::ConfigService;
use crate::Result;

/// Execute a cache operation.
pub async fn execute(args: CacheArgs, config_service: &dyn ConfigService) -> Result<()> {
    let config = config_service.config()?;
    let cache_dir = config.cache_dir();

    match args.action {
        CacheAction::List => list(&cache_dir),
        CacheAction::Clear => clear(&cache_dir),
    }
}

fn cache_entries(cache_dir: &Path) -> Vec<(std::path::PathBuf, u64)> {
    WalkDir::new(cache_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            (name.starts_with("waveform_") && name.ends_with(".wfz"))
                || name.ends_with("_audio.wav")
        })
        .map(|entry| {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (entry.into_path(), size)
        })
        .collect()
}

fn list(cache_dir: &Path) -> Result<()> {
    let entries = cache_entries(cache_dir);
    if entries.is_empty() {
        ui::print_success(&format!("Cache is empty ({})", cache_dir.display()));
        return Ok(());
    }

    let mut total = 0u64;
    for (path, size) in &entries {
        total += size;
        println!(
            "{:>10}  {}",
            format_size(*size),
            path.file_name().unwrap_or_default().to_string_lossy()
        );
    }
    ui::print_success(&format!(
        "{} entries, {} in {}",
        entries.len(),
        format_size(total),
        cache_dir.display()
    ));
    Ok(())
}

fn clear(cache_dir: &Path) -> Result<()> {
    let entries = cache_entries(cache_dir);
    let count = entries.len();
    for (path, _) in entries {
        std::fs::remove_file(&path)?;
    }
    ui::print_success(&format!("Removed {} cache entries", count));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MiB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
