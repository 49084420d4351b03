// SPDX-License-Identifier: GPL-3.0-only

//! Shared frame type passed between sensor, cache, pipeline and display

use image::RgbImage;
use std::sync::Arc;

/// Pixel layout of a [`Frame`], tightly packed rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 24-bit RGB
    Rgb8,
    /// 32-bit RGBA
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// A decoded image buffer
///
/// Pixel data is reference counted, so cloning a frame is cheap and passing
/// one into the persist pipeline does not copy the image. Exactly one
/// logical owner holds a frame at a time; nothing mutates the data in place.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
}

impl Frame {
    /// Create a frame from raw pixel bytes
    ///
    /// Returns None when the buffer length does not match
    /// `width * height * bytes_per_pixel`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data: Arc::from(data),
        })
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: Arc::from(image.into_raw()),
        }
    }

    /// Convert to an RGB image buffer, dropping alpha if present
    pub fn to_rgb_image(&self) -> RgbImage {
        let rgb = match self.format {
            PixelFormat::Rgb8 => self.data.to_vec(),
            PixelFormat::Rgba8 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        };
        // Length is validated at construction, from_raw cannot fail here
        RgbImage::from_raw(self.width, self.height, rgb)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Sample one pixel as RGB, clamping out-of-range coordinates to the edge
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let bpp = self.format.bytes_per_pixel();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame({}x{} {:?}, {} bytes)",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}
