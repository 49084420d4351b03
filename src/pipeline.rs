// SPDX-License-Identifier: GPL-3.0-only

//! Asynchronous capture persistence
//!
//! One persistent worker task owns every disk write: full-resolution JPEG,
//! durable thumbnail, then the index rescan. The control loop only pays
//! for the channel send, so rapid shutter presses queue up instead of
//! spawning threads, and writes from different submissions never
//! interleave.
//!
//! Ordering: a submission's rescan always runs after its own file is on
//! disk, so the rebuilt index observes it. Failures are logged and leave
//! the index unchanged; nothing is retried.

use crate::constants::{FILENAME_TIMESTAMP_FORMAT, JPEG_QUALITY};
use crate::errors::PersistError;
use crate::frame::Frame;
use crate::thumbnails::{SharedCache, generate_thumbnail};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

enum Job {
    Persist {
        frame: Frame,
        done: oneshot::Sender<Result<PathBuf, PersistError>>,
    },
    /// Generate durable thumbnails for any indexed image lacking one
    Backfill,
}

/// Resolves to the persisted path once the background work finishes
///
/// The control loop drops the handle (fire and forget); tests wait on it.
pub struct PersistHandle {
    rx: oneshot::Receiver<Result<PathBuf, PersistError>>,
}

impl PersistHandle {
    /// Block until the submission completes
    pub fn wait(self) -> Result<PathBuf, PersistError> {
        self.rx.blocking_recv().unwrap_or(Err(PersistError::WorkerGone))
    }
}

pub struct CapturePipeline {
    tx: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<tokio::task::JoinHandle<()>>,
    runtime: tokio::runtime::Handle,
}

impl CapturePipeline {
    /// Start the persist worker on the given runtime
    pub fn spawn(runtime: &tokio::runtime::Handle, cache: SharedCache, save_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run_worker(rx, cache, save_dir));
        Self {
            tx: Some(tx),
            worker: Some(worker),
            runtime: runtime.clone(),
        }
    }

    /// Hand one captured frame to the worker; returns immediately
    pub fn submit(&self, frame: Frame) -> PersistHandle {
        let (done, rx) = oneshot::channel();
        match &self.tx {
            Some(tx) => {
                if tx.send(Job::Persist { frame, done }).is_err() {
                    error!("Persist worker is gone, dropping capture");
                }
            }
            None => error!("Pipeline already shut down, dropping capture"),
        }
        PersistHandle { rx }
    }

    /// Queue a scan for images missing their durable thumbnail
    ///
    /// Run once at startup; the worker also backfills after each persist.
    pub fn request_backfill(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Job::Backfill);
        }
    }

    /// Close the queue and wait for queued work to finish
    pub fn shutdown(mut self) {
        info!("Stopping persist worker");
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = self.runtime.block_on(worker) {
                warn!("Persist worker panicked: {:?}", e);
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    cache: SharedCache,
    save_dir: PathBuf,
) {
    debug!("Persist worker started");
    while let Some(job) = rx.recv().await {
        match job {
            Job::Persist { frame, done } => {
                let timestamp = chrono::Local::now()
                    .format(FILENAME_TIMESTAMP_FORMAT)
                    .to_string();
                let result = persist_frame(frame, &cache, &save_dir, &timestamp).await;
                match &result {
                    Ok(path) => info!(path = %path.display(), "Photo saved"),
                    Err(e) => error!(error = %e, "Failed to persist capture"),
                }
                // Receiver may have been dropped (fire and forget)
                let _ = done.send(result);
            }
            Job::Backfill => {
                let missing = cache.lock().missing_durable();
                backfill_thumbnails(&cache, missing).await;
            }
        }
    }
    debug!("Persist worker exiting");
}

/// Persist one frame: full-resolution write, durable thumbnail, rescan
///
/// Filenames are second-granular; a collision within the same second
/// silently overwrites, and the rescan still yields one record per file.
async fn persist_frame(
    frame: Frame,
    cache: &SharedCache,
    save_dir: &Path,
    timestamp: &str,
) -> Result<PathBuf, PersistError> {
    let path = save_dir.join(format!("{}.jpg", timestamp));

    // Encode and write the full-resolution image (CPU + disk bound)
    let write_path = path.clone();
    let thumbnail = tokio::task::spawn_blocking(move || -> Result<RgbImage, PersistError> {
        let image = frame.to_rgb_image();
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PersistError::EncodingFailed(e.to_string()))?;
        std::fs::write(&write_path, &buffer)?;
        Ok(generate_thumbnail(&image))
    })
    .await
    .map_err(|e| PersistError::EncodingFailed(format!("task error: {}", e)))??;

    // Durable thumbnail next, so the rescan below can already see it
    let thumb_path = cache.lock().thumbnail_path(&path);
    let thumb_image = thumbnail.clone();
    let thumb_write_path = thumb_path.clone();
    tokio::task::spawn_blocking(move || {
        thumb_image
            .save(&thumb_write_path)
            .map_err(|e| PersistError::WriteFailed(e.to_string()))
    })
    .await
    .map_err(|e| PersistError::WriteFailed(format!("task error: {}", e)))??;

    // Rebuild the index; it now includes this submission's file. Seed the
    // memory entry so the gallery opens warm on the newest image.
    let missing = {
        let mut cache = cache.lock();
        let missing = cache.invalidate_and_rescan();
        cache.seed_entry(&path, Frame::from_rgb_image(thumbnail));
        missing
    };
    let stragglers: Vec<PathBuf> = missing.into_iter().filter(|p| *p != path).collect();
    backfill_thumbnails(cache, stragglers).await;

    Ok(path)
}

/// Generate durable thumbnails for the given sources, off the cache lock
async fn backfill_thumbnails(cache: &SharedCache, sources: Vec<PathBuf>) {
    for source in sources {
        let thumb_path = cache.lock().thumbnail_path(&source);
        let result = tokio::task::spawn_blocking(move || -> Result<(), String> {
            let image = image::open(&source).map_err(|e| e.to_string())?.to_rgb8();
            generate_thumbnail(&image)
                .save(&thumb_path)
                .map_err(|e| e.to_string())
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Thumbnail backfill failed"),
            Err(e) => warn!(error = %e, "Thumbnail backfill task failed"),
        }
    }
}
