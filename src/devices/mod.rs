// SPDX-License-Identifier: GPL-3.0-only

//! Device abstraction
//!
//! The control loop talks to hardware through four narrow traits: the
//! camera sensor, the display, the button pad and the battery gauge. The
//! in-tree implementations are development-grade (synthetic sensor,
//! terminal frontend, sysfs gauge); the handheld build swaps in SPI/GPIO
//! implementations of the same traits.

pub mod gauge;
pub mod synthetic;
pub mod terminal;

pub use gauge::SysfsGauge;
pub use synthetic::SyntheticCamera;
pub use terminal::{TerminalDisplay, TerminalInput};

use crate::errors::{CaptureError, SensorError};
use crate::frame::Frame;

/// Logical button identifiers
///
/// Decoupled from hardware pin numbers; the input source owns the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Take a photo (Preview mode)
    Shutter,
    /// Enter the gallery (Preview mode)
    Gallery,
    /// Leave the gallery (Gallery mode)
    Back,
    /// Previous image (Gallery mode)
    Left,
    /// Next image (Gallery mode)
    Right,
    /// Quit the appliance
    Power,
}

impl Button {
    /// All buttons, in sampling order
    pub const ALL: [Button; 6] = [
        Button::Shutter,
        Button::Gallery,
        Button::Back,
        Button::Left,
        Button::Right,
        Button::Power,
    ];
}

/// One sample of every button's level (pressed or not)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLevels {
    pressed: [bool; Button::ALL.len()],
}

impl ButtonLevels {
    pub fn set(&mut self, button: Button, pressed: bool) {
        self.pressed[button as usize] = pressed;
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed[button as usize]
    }
}

/// Camera sensor with two operating resolutions
///
/// The device is owned exclusively by the control loop; mode switches never
/// overlap because nothing else can reach it.
pub trait CaptureDevice {
    /// Pull one live frame at preview resolution
    fn capture_preview_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Capture one frame at full resolution
    ///
    /// May switch the sensor into its still-capture mode and back; blocks
    /// until the sensor is back in preview mode.
    fn capture_high_res(&mut self) -> Result<Frame, CaptureError>;

    /// Release the sensor on the way out
    fn shutdown(&mut self) {}
}

/// Overlay values drawn on top of a rendered frame
///
/// Absent values are simply not drawn; a failed gauge read or an unparsable
/// filename degrades to a missing overlay element, never an error screen.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub mode_label: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub battery_percent: Option<f32>,
    pub index_info: Option<String>,
}

/// Display for frames plus overlay text and battery icon
pub trait DisplaySink {
    /// Render a frame with the overlay; `None` blanks the screen
    /// (shutter feedback, "no images" gallery state)
    fn render(&mut self, frame: Option<&Frame>, overlay: &Overlay) -> std::io::Result<()>;

    /// Restore the display on the way out
    fn shutdown(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Raw button levels, sampled once per tick
///
/// Debouncing and edge detection live in [`crate::input::ButtonPad`], on
/// top of this trait.
pub trait InputSource {
    fn sample(&mut self) -> ButtonLevels;
}

/// Battery voltage source
pub trait PowerGauge {
    fn read_voltage(&mut self) -> Result<f32, SensorError>;
}
