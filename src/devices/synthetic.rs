// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera sensor
//!
//! Generates a moving test pattern instead of talking to real sensor
//! hardware, so the appliance can be developed and exercised anywhere.
//! Mirrors the real sensor's shape: a fast preview resolution and a
//! slower full-resolution still mode, with a warm-up capture on init.

use crate::constants::{CAPTURE_SIZE, PREVIEW_SIZE};
use crate::devices::CaptureDevice;
use crate::errors::{CaptureError, DeviceError};
use crate::frame::{Frame, PixelFormat};
use tracing::{debug, info};

pub struct SyntheticCamera {
    preview_size: (u32, u32),
    capture_size: (u32, u32),
    /// Advances every frame so the preview visibly moves
    phase: u32,
}

impl SyntheticCamera {
    /// Initialize the sensor and run the warm-up capture
    ///
    /// The first still frame after power-on is captured and discarded, the
    /// same stabilization step the real sensor needs.
    pub fn new() -> Result<Self, DeviceError> {
        info!("Initializing camera");
        let mut camera = Self {
            preview_size: PREVIEW_SIZE,
            capture_size: CAPTURE_SIZE,
            phase: 0,
        };
        debug!("Capturing and discarding first frame for stabilization");
        let _ = camera
            .capture_high_res()
            .map_err(|e| DeviceError::CameraUnavailable(e.to_string()))?;
        info!("Camera initialized");
        Ok(camera)
    }

    fn render_pattern(&self, width: u32, height: u32, format: PixelFormat) -> Option<Frame> {
        let bpp = format.bytes_per_pixel();
        let mut data = vec![0u8; width as usize * height as usize * bpp];
        let bar = (self.phase * 4) % width.max(1);
        for y in 0..height {
            for x in 0..width {
                let idx = (y as usize * width as usize + x as usize) * bpp;
                let in_bar = x.abs_diff(bar) < width / 40 + 1;
                let (r, g, b) = if in_bar {
                    (235, 235, 235)
                } else {
                    (
                        ((x + self.phase) * 255 / width.max(1)) as u8,
                        (y * 255 / height.max(1)) as u8,
                        (((x + y) / 2) * 255 / width.max(1)) as u8,
                    )
                };
                data[idx] = r;
                data[idx + 1] = g;
                data[idx + 2] = b;
                if bpp == 4 {
                    data[idx + 3] = 255;
                }
            }
        }
        Frame::new(width, height, format, data)
    }
}

impl CaptureDevice for SyntheticCamera {
    fn capture_preview_frame(&mut self) -> Result<Frame, CaptureError> {
        self.phase = self.phase.wrapping_add(1);
        let (width, height) = self.preview_size;
        self.render_pattern(width, height, PixelFormat::Rgb8)
            .ok_or(CaptureError::NoFrameAvailable)
    }

    fn capture_high_res(&mut self) -> Result<Frame, CaptureError> {
        // The real sensor switches still mode here and back after the
        // exposure; for the pattern source both switches are free.
        debug!("Switching to still capture mode");
        let (width, height) = self.capture_size;
        let frame = self
            .render_pattern(width, height, PixelFormat::Rgba8)
            .ok_or(CaptureError::NoFrameAvailable);
        debug!("Switching back to preview mode");
        frame
    }

    fn shutdown(&mut self) {
        info!("Camera released");
    }
}
