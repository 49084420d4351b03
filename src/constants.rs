// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Bounding box for generated thumbnails (width, px)
///
/// Thumbnails are scaled aspect-preserving to fit within
/// [`THUMBNAIL_MAX_WIDTH`] x [`THUMBNAIL_MAX_HEIGHT`]; the stored file keeps
/// the scaled size, centering happens at render time.
pub const THUMBNAIL_MAX_WIDTH: u32 = 240;

/// Bounding box for generated thumbnails (height, px)
pub const THUMBNAIL_MAX_HEIGHT: u32 = 135;

/// Subdirectory of the save directory holding durable thumbnails
pub const THUMBNAIL_DIR_NAME: &str = "thumbnails";

/// Minimum re-trigger interval for a debounced button edge
///
/// A rising edge within this window of the previous accepted edge on the
/// same button is ignored.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(150);

/// How long a battery gauge reading is reused before the sensor is polled
/// again
pub const GAUGE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Battery voltage mapped to 0% charge
pub const VOLTAGE_EMPTY: f32 = 3.0;

/// Battery voltage mapped to 100% charge
pub const VOLTAGE_FULL: f32 = 4.0;

/// Battery bar turns yellow at or below this percentage
pub const BATTERY_WARN_PERCENT: f32 = 60.0;

/// Battery bar turns red at or below this percentage
pub const BATTERY_LOW_PERCENT: f32 = 20.0;

/// Number of neighbors on each side of the current gallery image kept warm
/// in the in-memory thumbnail cache
pub const PRELOAD_RADIUS: usize = 2;

/// Memory cache entries farther than this from the current gallery image are
/// evicted (durable files are never touched)
///
/// Must be at least [`PRELOAD_RADIUS`], otherwise eviction would fight the
/// preload window.
pub const EVICT_KEEP_DISTANCE: usize = 4;

/// Pacing of the control loop (one tick per iteration)
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

/// JPEG quality for persisted full-resolution images and thumbnails (0-100)
pub const JPEG_QUALITY: u8 = 92;

/// Filename timestamp format for persisted images, sortable by creation time
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Preview sensor resolution (width, height)
pub const PREVIEW_SIZE: (u32, u32) = (640, 480);

/// High-resolution capture sensor resolution (width, height)
pub const CAPTURE_SIZE: (u32, u32) = (1920, 1080);
