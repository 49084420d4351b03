// SPDX-License-Identifier: GPL-3.0-only

//! Bounded thumbnail cache
//!
//! Maps image index -> downscaled frame, with a durable on-disk thumbnail
//! per source image under `<save_dir>/thumbnails/`. Memory entries are
//! created lazily (first view, or seeded on capture) and evicted by
//! distance from the current gallery position; durable files are never
//! deleted by eviction.
//!
//! The cache also owns the image index. Both are mutated by the control
//! loop (lookups, eviction) and by the persist worker (rescan after a
//! write), so the whole structure sits behind [`SharedCache`].

use crate::constants::{THUMBNAIL_DIR_NAME, THUMBNAIL_MAX_HEIGHT, THUMBNAIL_MAX_WIDTH};
use crate::errors::{AppResult, DecodeError};
use crate::frame::Frame;
use crate::index::{ImageRecord, scan_records};
use image::{RgbImage, imageops};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Handle to the cache shared between the control loop and the persist
/// worker; all access is serialized through the one mutex
#[derive(Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<ThumbnailCache>>,
}

impl SharedCache {
    pub fn new(cache: ThumbnailCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ThumbnailCache> {
        // The index is rebuilt from disk on every rescan, so state behind a
        // poisoned lock self-heals; keep going instead of propagating the
        // panic into the control loop
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct ThumbnailCache {
    save_dir: PathBuf,
    thumb_dir: PathBuf,
    records: Vec<ImageRecord>,
    entries: HashMap<usize, Frame>,
}

impl ThumbnailCache {
    /// Open the cache over a save directory, creating the thumbnail
    /// subdirectory and running the initial scan
    pub fn open(save_dir: PathBuf) -> AppResult<Self> {
        let thumb_dir = save_dir.join(THUMBNAIL_DIR_NAME);
        std::fs::create_dir_all(&thumb_dir)?;
        let records = scan_records(&save_dir);
        debug!(dir = %save_dir.display(), images = records.len(), "Image index built");
        Ok(Self {
            save_dir,
            thumb_dir,
            records,
            entries: HashMap::new(),
        })
    }

    /// Number of images in the index
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    /// Durable thumbnail path for a source image (same filename)
    pub fn thumbnail_path(&self, source: &Path) -> PathBuf {
        match source.file_name() {
            Some(name) => self.thumb_dir.join(name),
            None => self.thumb_dir.clone(),
        }
    }

    /// Fetch the thumbnail for `index`: memory entry, durable file, or
    /// generated from the source image (writing the durable file as a side
    /// effect). Returns None, logging why, when the source is missing or
    /// undecodable.
    pub fn get_or_generate(&mut self, index: usize) -> Option<Frame> {
        if let Some(frame) = self.entries.get(&index) {
            return Some(frame.clone());
        }
        let record = match self.records.get(index) {
            Some(record) => record.clone(),
            None => {
                warn!(index, total = self.records.len(), "Thumbnail lookup out of range");
                return None;
            }
        };

        let thumb_path = self.thumbnail_path(&record.path);
        if thumb_path.exists() {
            match image::open(&thumb_path) {
                Ok(image) => {
                    let frame = Frame::from_rgb_image(image.to_rgb8());
                    self.entries.insert(index, frame.clone());
                    return Some(frame);
                }
                Err(e) => {
                    // Corrupt durable file: fall through and regenerate it
                    warn!(path = %thumb_path.display(), error = %e, "Unreadable thumbnail, regenerating");
                }
            }
        }

        let image = match image::open(&record.path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                let err = if record.path.exists() {
                    DecodeError::Undecodable(record.path.clone(), e.to_string())
                } else {
                    DecodeError::Missing(record.path.clone())
                };
                warn!(index, error = %err, "Thumbnail lookup failed");
                return None;
            }
        };

        let thumbnail = generate_thumbnail(&image);
        if let Err(e) = thumbnail.save(&thumb_path) {
            // The lookup still succeeds; only durability is lost
            warn!(path = %thumb_path.display(), error = %e, "Failed to write thumbnail");
        }
        let frame = Frame::from_rgb_image(thumbnail);
        self.entries.insert(index, frame.clone());
        Some(frame)
    }

    /// Ensure memory entries exist for the window around `center`
    ///
    /// Generation of misses runs on the caller; in gallery use the window
    /// is small and the work is bounded by the thumbnail size.
    pub fn preload_around(&mut self, center: usize, radius: usize) {
        if self.records.is_empty() {
            return;
        }
        let first = center.saturating_sub(radius);
        let last = (center + radius).min(self.records.len() - 1);
        for index in first..=last {
            if !self.entries.contains_key(&index) {
                let _ = self.get_or_generate(index);
            }
        }
    }

    /// Drop memory entries farther than `keep_distance` from `center`
    ///
    /// Durable thumbnail files are never removed.
    pub fn evict_far(&mut self, center: usize, keep_distance: usize) {
        self.entries
            .retain(|&index, _| index.abs_diff(center) <= keep_distance);
    }

    /// Rebuild the index from the directory listing and drop every memory
    /// entry (positions may have shifted)
    ///
    /// Returns the source paths that still lack a durable thumbnail so the
    /// caller can backfill them off the render path.
    pub fn invalidate_and_rescan(&mut self) -> Vec<PathBuf> {
        self.records = scan_records(&self.save_dir);
        self.entries.clear();
        debug!(images = self.records.len(), "Index rebuilt");
        self.missing_durable()
    }

    /// Source paths with no durable thumbnail on disk
    pub fn missing_durable(&self) -> Vec<PathBuf> {
        self.records
            .iter()
            .filter(|record| !self.thumbnail_path(&record.path).exists())
            .map(|record| record.path.clone())
            .collect()
    }

    /// Seed the memory entry for a freshly captured image
    ///
    /// Called by the persist worker after its rescan, so the newest image
    /// is warm when the gallery opens on it.
    pub fn seed_entry(&mut self, source: &Path, thumbnail: Frame) {
        if let Some(record) = self.records.iter().find(|r| r.path == source) {
            self.entries.insert(record.index, thumbnail);
        }
    }

    #[cfg(test)]
    fn cached_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.entries.keys().copied().collect();
        indices.sort_unstable();
        indices
    }
}

/// Downscale aspect-preserving to fit within the thumbnail bounding box
///
/// The stored thumbnail keeps the scaled size; centering on the screen
/// canvas happens at render time.
pub fn generate_thumbnail(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let scale = f64::min(
        THUMBNAIL_MAX_WIDTH as f64 / width as f64,
        THUMBNAIL_MAX_HEIGHT as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    imageops::resize(image, new_width, new_height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        image.save(&path).unwrap();
        path
    }

    fn open_cache(dir: &Path) -> ThumbnailCache {
        ThumbnailCache::open(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn generate_fits_bounding_box_and_keeps_aspect() {
        let image = RgbImage::new(1920, 1080);
        let thumb = generate_thumbnail(&image);
        assert_eq!(thumb.dimensions(), (240, 135));

        let portrait = RgbImage::new(1080, 1920);
        let thumb = generate_thumbnail(&portrait);
        assert_eq!(thumb.dimensions(), (75, 135));
    }

    #[test]
    fn get_or_generate_writes_durable_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "20240101_120000.jpg", 640, 480);
        let mut cache = open_cache(dir.path());

        let frame = cache.get_or_generate(0).unwrap();
        assert_eq!((frame.width, frame.height), (180, 135));
        assert!(cache.thumbnail_path(&source).exists());
    }

    #[test]
    fn eviction_removes_memory_entries_but_never_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "20240101_120000.jpg", 640, 480);
        write_test_image(dir.path(), "20240101_120001.jpg", 640, 480);
        let mut cache = open_cache(dir.path());
        cache.preload_around(0, 1);
        assert_eq!(cache.cached_indices(), vec![0, 1]);

        cache.evict_far(1, 0);
        assert_eq!(cache.cached_indices(), vec![1]);
        assert!(cache.thumbnail_path(&source).exists());

        // The evicted index still resolves, now via the durable file
        assert!(cache.get_or_generate(0).is_some());
    }

    #[test]
    fn preload_clamps_to_index_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg", 320, 240);
        write_test_image(dir.path(), "20240101_120001.jpg", 320, 240);
        let mut cache = open_cache(dir.path());

        cache.preload_around(0, 5);
        assert_eq!(cache.cached_indices(), vec![0, 1]);
    }

    #[test]
    fn rescan_picks_up_new_files_and_clears_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg", 320, 240);
        let mut cache = open_cache(dir.path());
        cache.preload_around(0, 0);
        assert_eq!(cache.len(), 1);

        write_test_image(dir.path(), "20240101_120001.jpg", 320, 240);
        let missing = cache.invalidate_and_rescan();
        assert_eq!(cache.len(), 2);
        assert!(cache.cached_indices().is_empty());
        // The first image got its durable thumbnail from preload; only the
        // new one needs backfill
        assert_eq!(missing.len(), 1);
        assert!(missing[0].ends_with("20240101_120001.jpg"));
    }

    #[test]
    fn missing_source_fails_the_lookup_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "20240101_120000.jpg", 320, 240);
        let mut cache = open_cache(dir.path());
        std::fs::remove_file(&source).unwrap();

        assert!(cache.get_or_generate(0).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn out_of_range_lookup_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = open_cache(dir.path());
        assert!(cache.get_or_generate(3).is_none());
    }
}
