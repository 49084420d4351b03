// SPDX-License-Identifier: GPL-3.0-only

//! Image index
//!
//! The save directory listing IS the index: every rescan rebuilds the full
//! record list from disk, sorted by file creation time, with dense 0-based
//! positions. Nothing is persisted besides the image files themselves.

use crate::constants::FILENAME_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

/// One captured image known to the index
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Dense position in creation-time order
    pub index: usize,
    pub path: PathBuf,
    pub created: SystemTime,
    /// Capture timestamp embedded in the filename; None for foreign files
    pub taken: Option<NaiveDateTime>,
}

impl ImageRecord {
    /// Overlay date string, `YYYY/MM/DD`
    pub fn date_text(&self) -> Option<String> {
        self.taken.map(|t| t.format("%Y/%m/%d").to_string())
    }

    /// Overlay time string, `HH:MM:SS`
    pub fn time_text(&self) -> Option<String> {
        self.taken.map(|t| t.format("%H:%M:%S").to_string())
    }
}

/// Rebuild the index from the directory listing
///
/// A listing failure yields an empty index (the gallery then shows its
/// "no images" state), never an error.
pub fn scan_records(save_dir: &Path) -> Vec<ImageRecord> {
    let entries = match std::fs::read_dir(save_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %save_dir.display(), error = %e, "Failed to list save directory");
            return Vec::new();
        }
    };

    let mut files: Vec<(PathBuf, SystemTime)> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if !is_image_file(&path) {
                return None;
            }
            let meta = entry.metadata().ok()?;
            // Not every filesystem reports a birth time
            let created = meta.created().or_else(|_| meta.modified()).ok()?;
            Some((path, created))
        })
        .collect();

    // Filenames are timestamps, so the name is a stable tie-break when two
    // files share a creation time
    files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    files
        .into_iter()
        .enumerate()
        .map(|(index, (path, created))| {
            let taken = parse_taken(&path);
            ImageRecord {
                index,
                path,
                created,
                taken,
            }
        })
        .collect()
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("jpg")
                || ext.eq_ignore_ascii_case("jpeg")
                || ext.eq_ignore_ascii_case("png")
        })
        .unwrap_or(false)
}

/// Parse the `YYYYMMDD_HHMMSS` filename stem
fn parse_taken(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDateTime::parse_from_str(stem, FILENAME_TIMESTAMP_FORMAT).ok()
}
